use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::checks;
use crate::money::Money;
use crate::store::{LeaseId, PropertyId, Record, TenantId};
use crate::ServiceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    #[default]
    Monthly,
    Quarterly,
}

impl BillingFrequency {
    /// Months covered by one billing period.
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Terminated,
}

impl LeaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Terminated => "Terminated",
        }
    }
}

fn default_payment_day() -> u8 {
    1
}

/// Contract terms as submitted by clients. Amounts are monthly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseDraft {
    pub property_id: PropertyId,
    pub tenant_ids: Vec<TenantId>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub rent_amount: Money,
    /// Monthly provision for recoverable charges.
    #[serde(default)]
    pub charges_amount: Money,
    #[serde(default)]
    pub deposit: Money,
    /// Day of the month rent falls due, 1 to 28.
    #[serde(default = "default_payment_day")]
    pub payment_day: u8,
    #[serde(default)]
    pub frequency: BillingFrequency,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LeaseDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        if self.tenant_ids.is_empty() {
            return Err(ServiceError::validation(
                "a lease needs at least one tenant",
            ));
        }
        let distinct: BTreeSet<_> = self.tenant_ids.iter().collect();
        if distinct.len() != self.tenant_ids.len() {
            return Err(ServiceError::validation("tenant_ids contains duplicates"));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ServiceError::validation(
                    "end_date must not precede start_date",
                ));
            }
        }
        if !(1..=28).contains(&self.payment_day) {
            return Err(ServiceError::validation(
                "payment_day must be between 1 and 28",
            ));
        }
        checks::positive("rent_amount", self.rent_amount)?;
        checks::non_negative("charges_amount", self.charges_amount)?;
        checks::non_negative("deposit", self.deposit)
    }

    /// Terms that shape already generated rents.
    pub(crate) fn same_billing_schedule(&self, other: &LeaseDraft) -> bool {
        self.property_id == other.property_id
            && self.start_date == other.start_date
            && self.frequency == other.frequency
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub status: LeaseStatus,
    #[serde(flatten)]
    pub terms: LeaseDraft,
}

impl Lease {
    pub fn is_active(&self) -> bool {
        self.status == LeaseStatus::Active
    }

    /// Whether `date` falls within the lease's date range. Status is not
    /// consulted: termination always sets the end date, so a lease under
    /// notice stays in force until then.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.terms.start_date <= date && self.terms.end_date.map_or(true, |end| date <= end)
    }

    pub fn overlaps(&self, start: NaiveDate, end: Option<NaiveDate>) -> bool {
        ranges_overlap(self.terms.start_date, self.terms.end_date, start, end)
    }
}

impl Record for Lease {
    type Id = LeaseId;
    const ENTITY: &'static str = "lease";

    fn id(&self) -> LeaseId {
        self.id
    }
}

/// Inclusive ranges where `None` means open-ended.
pub(crate) fn ranges_overlap(
    a_start: NaiveDate,
    a_end: Option<NaiveDate>,
    b_start: NaiveDate,
    b_end: Option<NaiveDate>,
) -> bool {
    let a_before_b_ends = b_end.map_or(true, |end| a_start <= end);
    let b_before_a_ends = a_end.map_or(true, |end| b_start <= end);
    a_before_b_ends && b_before_a_ends
}
