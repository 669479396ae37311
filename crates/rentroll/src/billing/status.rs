use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl RentStatus {
    /// Status of a rent on `today`.
    ///
    /// A settled rent is paid whatever the date; an unsettled one is overdue
    /// once `today` is past its due date, partial if something was paid,
    /// pending otherwise.
    pub fn derive(due: Money, paid: Money, due_date: NaiveDate, today: NaiveDate) -> Self {
        if paid >= due {
            Self::Paid
        } else if today > due_date {
            Self::Overdue
        } else if paid.is_positive() {
            Self::Partial
        } else {
            Self::Pending
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Partial => "Partially paid",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        }
    }

    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Paid)
    }
}
