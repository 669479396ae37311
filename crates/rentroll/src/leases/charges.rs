use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::error::checks;
use crate::money::Money;
use crate::store::{ChargeId, LeaseId, Record};
use crate::ServiceError;

/// Upper bound on projected occurrences for a single query.
const MAX_OCCURRENCES: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeFrequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl ChargeFrequency {
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChargeSchedule {
    OneOff {
        date: NaiveDate,
    },
    Recurring {
        frequency: ChargeFrequency,
        start_date: NaiveDate,
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
}

impl ChargeSchedule {
    /// Dates in `[from, to]` on which the charge falls.
    ///
    /// Recurring dates are computed from the anchor (`start + k * step`), so a
    /// charge anchored on the 31st lands on the last day of shorter months and
    /// returns to the 31st afterwards.
    pub fn occurrences(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        match *self {
            ChargeSchedule::OneOff { date } => {
                if from <= date && date <= to {
                    vec![date]
                } else {
                    Vec::new()
                }
            }
            ChargeSchedule::Recurring {
                frequency,
                start_date,
                end_date,
            } => {
                let last = end_date.map_or(to, |end| end.min(to));
                let step = frequency.months();
                let mut dates = Vec::new();
                for k in 0..MAX_OCCURRENCES {
                    let Some(date) = dates::add_months(start_date, k * step) else {
                        break;
                    };
                    if date > last {
                        break;
                    }
                    if date >= from {
                        dates.push(date);
                    }
                }
                dates
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeDraft {
    pub label: String,
    pub amount: Money,
    pub schedule: ChargeSchedule,
}

impl ChargeDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("label", &self.label)?;
        checks::positive("amount", self.amount)?;
        if let ChargeSchedule::Recurring {
            start_date,
            end_date: Some(end_date),
            ..
        } = self.schedule
        {
            if end_date < start_date {
                return Err(ServiceError::validation(
                    "schedule.end_date must not precede schedule.start_date",
                ));
            }
        }
        Ok(())
    }
}

/// Extra amount billed to a lease, once or on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charge {
    pub id: ChargeId,
    pub lease_id: LeaseId,
    #[serde(flatten)]
    pub details: ChargeDraft,
}

impl Charge {
    pub fn occurrences(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        self.details.schedule.occurrences(from, to)
    }
}

impl Record for Charge {
    type Id = ChargeId;
    const ENTITY: &'static str = "charge";

    fn id(&self) -> ChargeId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn month_end_anchor_does_not_drift() {
        let schedule = ChargeSchedule::Recurring {
            frequency: ChargeFrequency::Monthly,
            start_date: date(2025, 1, 31),
            end_date: None,
        };
        assert_eq!(
            schedule.occurrences(date(2025, 1, 1), date(2025, 4, 30)),
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30)
            ]
        );
    }

    #[test]
    fn recurring_stops_at_schedule_end() {
        let schedule = ChargeSchedule::Recurring {
            frequency: ChargeFrequency::Quarterly,
            start_date: date(2025, 1, 15),
            end_date: Some(date(2025, 9, 1)),
        };
        assert_eq!(
            schedule.occurrences(date(2025, 1, 1), date(2026, 12, 31)),
            vec![date(2025, 1, 15), date(2025, 4, 15), date(2025, 7, 15)]
        );
    }

    #[test]
    fn window_excludes_earlier_occurrences() {
        let schedule = ChargeSchedule::Recurring {
            frequency: ChargeFrequency::Yearly,
            start_date: date(2020, 6, 1),
            end_date: None,
        };
        assert_eq!(
            schedule.occurrences(date(2024, 1, 1), date(2025, 12, 31)),
            vec![date(2024, 6, 1), date(2025, 6, 1)]
        );
    }

    #[test]
    fn one_off_inside_window_only() {
        let schedule = ChargeSchedule::OneOff {
            date: date(2025, 3, 10),
        };
        assert_eq!(
            schedule.occurrences(date(2025, 3, 1), date(2025, 3, 31)),
            vec![date(2025, 3, 10)]
        );
        assert!(schedule
            .occurrences(date(2025, 4, 1), date(2025, 4, 30))
            .is_empty());
    }

    #[test]
    fn schedule_uses_tagged_json() {
        let json = serde_json::json!({
            "label": "Garage",
            "amount": 4500,
            "schedule": { "type": "recurring", "frequency": "monthly", "start_date": "2025-02-01" }
        });
        let draft: ChargeDraft = serde_json::from_value(json).expect("deserializes");
        assert!(matches!(
            draft.schedule,
            ChargeSchedule::Recurring {
                frequency: ChargeFrequency::Monthly,
                end_date: None,
                ..
            }
        ));
    }
}
