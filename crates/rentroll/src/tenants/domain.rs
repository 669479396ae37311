use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::checks;
use crate::money::Money;
use crate::portfolio::Address;
use crate::store::{GuarantorId, Record, TenantId};
use crate::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDraft {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TenantDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("first_name", &self.first_name)?;
        checks::required_text("last_name", &self.last_name)?;
        checks::optional_email("email", self.email.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    #[serde(flatten)]
    pub details: TenantDraft,
}

impl Tenant {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.details.first_name.trim(),
            self.details.last_name.trim()
        )
    }
}

impl Record for Tenant {
    type Id = TenantId;
    const ENTITY: &'static str = "tenant";

    fn id(&self) -> TenantId {
        self.id
    }
}

/// Person or body standing surety for a tenant's rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuarantorDraft {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub monthly_income: Option<Money>,
}

impl GuarantorDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("name", &self.name)?;
        checks::optional_email("email", self.email.as_deref())?;
        if let Some(address) = &self.address {
            address.validate("address")?;
        }
        if let Some(income) = self.monthly_income {
            checks::non_negative("monthly_income", income)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantor {
    pub id: GuarantorId,
    pub tenant_id: TenantId,
    #[serde(flatten)]
    pub details: GuarantorDraft,
}

impl Record for Guarantor {
    type Id = GuarantorId;
    const ENTITY: &'static str = "guarantor";

    fn id(&self) -> GuarantorId {
        self.id
    }
}
