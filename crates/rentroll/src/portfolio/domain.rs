use serde::{Deserialize, Serialize};

use crate::error::checks;
use crate::leases::Lease;
use crate::money::Money;
use crate::store::{LeaseId, OwnerId, PropertyId, Record};
use crate::ServiceError;

/// Postal address shared by owners, properties and guarantors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub postal_code: String,
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "FR".to_string()
}

impl Address {
    pub(crate) fn validate(&self, field: &str) -> Result<(), ServiceError> {
        checks::required_text(&format!("{field}.line1"), &self.line1)?;
        checks::required_text(&format!("{field}.postal_code"), &self.postal_code)?;
        checks::required_text(&format!("{field}.city"), &self.city)
    }

    /// Single-line rendering used in exports and mail bodies.
    pub fn one_line(&self) -> String {
        match &self.line2 {
            Some(line2) if !line2.trim().is_empty() => format!(
                "{}, {}, {} {}",
                self.line1, line2, self.postal_code, self.city
            ),
            _ => format!("{}, {} {}", self.line1, self.postal_code, self.city),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Individual,
    Company,
}

/// Owner fields as submitted by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerDraft {
    pub kind: OwnerKind,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    /// Company registration number (SIREN/SIRET).
    #[serde(default)]
    pub registration_number: Option<String>,
}

impl OwnerDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("name", &self.name)?;
        checks::optional_email("email", self.email.as_deref())?;
        if let Some(address) = &self.address {
            address.validate("address")?;
        }
        if self.kind == OwnerKind::Company
            && self
                .registration_number
                .as_deref()
                .map_or(true, |value| value.trim().is_empty())
        {
            return Err(ServiceError::validation(
                "registration_number is required for company owners",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    #[serde(flatten)]
    pub details: OwnerDraft,
}

impl Record for Owner {
    type Id = OwnerId;
    const ENTITY: &'static str = "owner";

    fn id(&self) -> OwnerId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    House,
    Parking,
    Commercial,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDraft {
    pub owner_id: OwnerId,
    pub name: String,
    pub kind: PropertyKind,
    pub address: Address,
    #[serde(default)]
    pub surface_m2: f32,
    #[serde(default)]
    pub rooms: u8,
    /// Rent proposed to new leases.
    #[serde(default)]
    pub reference_rent: Money,
    #[serde(default)]
    pub reference_charges: Money,
    #[serde(default)]
    pub description: Option<String>,
}

impl PropertyDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("name", &self.name)?;
        self.address.validate("address")?;
        if !self.surface_m2.is_finite() || self.surface_m2 < 0.0 {
            return Err(ServiceError::validation(
                "surface_m2 must be a non-negative number",
            ));
        }
        checks::non_negative("reference_rent", self.reference_rent)?;
        checks::non_negative("reference_charges", self.reference_charges)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    #[serde(flatten)]
    pub details: PropertyDraft,
}

impl Record for Property {
    type Id = PropertyId;
    const ENTITY: &'static str = "property";

    fn id(&self) -> PropertyId {
        self.id
    }
}

/// Property with its occupancy derived for a given date.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_lease_id: Option<LeaseId>,
}

impl PropertyView {
    pub(crate) fn build<'a, I>(property: Property, leases: I, on: chrono::NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Lease>,
    {
        let current_lease_id = leases
            .into_iter()
            .find(|lease| lease.terms.property_id == property.id && lease.covers(on))
            .map(|lease| lease.id);
        Self {
            property,
            occupied: current_lease_id.is_some(),
            current_lease_id,
        }
    }
}
