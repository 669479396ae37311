use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::status::RentStatus;
use crate::error::checks;
use crate::money::Money;
use crate::store::{ChargeId, LeaseId, PaymentId, Record, RentId};
use crate::ServiceError;

/// Additional amount billed on a rent, usually projected from a lease charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentLine {
    #[serde(default)]
    pub charge_id: Option<ChargeId>,
    pub label: String,
    pub amount: Money,
}

/// Rent billed for one period of a lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rent {
    pub id: RentId,
    pub lease_id: LeaseId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub rent_amount: Money,
    pub charges_amount: Money,
    #[serde(default)]
    pub extra_charges: Vec<RentLine>,
    /// Sum of the rent's payments. Never exceeds [`Rent::amount_due`].
    pub amount_paid: Money,
    pub status: RentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Rent {
    /// Saturates instead of overflowing; drafts keep the total within [`Money::MAX`].
    pub fn amount_due(&self) -> Money {
        self.extra_charges
            .iter()
            .fold(self.rent_amount.saturating_add(self.charges_amount), |total, line| {
                total.saturating_add(line.amount)
            })
    }

    pub fn outstanding(&self) -> Money {
        self.amount_due() - self.amount_paid
    }

    pub fn status_on(&self, today: NaiveDate) -> RentStatus {
        RentStatus::derive(self.amount_due(), self.amount_paid, self.due_date, today)
    }

    pub fn refresh_status(&mut self, today: NaiveDate) {
        self.status = self.status_on(today);
    }

    pub fn view(&self, today: NaiveDate) -> RentView {
        let mut rent = self.clone();
        rent.refresh_status(today);
        RentView {
            amount_due: rent.amount_due(),
            outstanding: rent.outstanding(),
            status_label: rent.status.label(),
            rent,
        }
    }
}

impl Record for Rent {
    type Id = RentId;
    const ENTITY: &'static str = "rent";

    fn id(&self) -> RentId {
        self.id
    }
}

/// Rent with derived totals, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct RentView {
    #[serde(flatten)]
    pub rent: Rent,
    pub amount_due: Money,
    pub outstanding: Money,
    pub status_label: &'static str,
}

/// Manually billed rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentDraft {
    pub lease_id: LeaseId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub rent_amount: Money,
    #[serde(default)]
    pub charges_amount: Money,
    #[serde(default)]
    pub extra_charges: Vec<RentLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RentDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        if self.period_end < self.period_start {
            return Err(ServiceError::validation(
                "period_end must not precede period_start",
            ));
        }
        validate_amounts(self.rent_amount, self.charges_amount, &self.extra_charges)
    }
}

/// Adjustable fields of an existing rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentUpdate {
    pub due_date: NaiveDate,
    pub rent_amount: Money,
    pub charges_amount: Money,
    #[serde(default)]
    pub extra_charges: Vec<RentLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RentUpdate {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        validate_amounts(self.rent_amount, self.charges_amount, &self.extra_charges)
    }
}

fn validate_amounts(rent: Money, charges: Money, lines: &[RentLine]) -> Result<(), ServiceError> {
    checks::non_negative("rent_amount", rent)?;
    checks::non_negative("charges_amount", charges)?;
    let mut total = rent + charges;
    for line in lines {
        checks::required_text("extra_charges.label", &line.label)?;
        checks::non_negative("extra_charges.amount", line.amount)?;
        total = total
            .checked_add(line.amount)
            .ok_or_else(|| ServiceError::validation("amount due overflows"))?;
    }
    checks::bounded("amount due", total)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Transfer,
    Cash,
    Check,
    DirectDebit,
    Card,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub amount: Money,
    pub paid_on: NaiveDate,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

impl PaymentDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::positive("amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub rent_id: RentId,
    #[serde(flatten)]
    pub details: PaymentDraft,
}

impl Record for Payment {
    type Id = PaymentId;
    const ENTITY: &'static str = "payment";

    fn id(&self) -> PaymentId {
        self.id
    }
}
