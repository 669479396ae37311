//! Seed data shared by the service tests.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::leases::{BillingFrequency, Lease, LeaseDraft, LeaseService};
use crate::money::Money;
use crate::portfolio::{
    Address, OwnerDraft, OwnerKind, PortfolioService, PropertyDraft, PropertyKind,
};
use crate::store::{InMemoryStore, OwnerId, PropertyId, TenantId};
use crate::tenants::{TenantDraft, TenantService};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(crate) fn address() -> Address {
    Address {
        line1: "12 rue des Lilas".to_string(),
        line2: None,
        postal_code: "69003".to_string(),
        city: "Lyon".to_string(),
        country: "FR".to_string(),
    }
}

pub(crate) fn owner_draft() -> OwnerDraft {
    OwnerDraft {
        kind: OwnerKind::Individual,
        name: "Claire Dumas".to_string(),
        email: Some("claire.dumas@example.fr".to_string()),
        phone: None,
        address: Some(address()),
        registration_number: None,
    }
}

pub(crate) fn property_draft(owner_id: OwnerId) -> PropertyDraft {
    PropertyDraft {
        owner_id,
        name: "Lilas T2".to_string(),
        kind: PropertyKind::Apartment,
        address: address(),
        surface_m2: 41.5,
        rooms: 2,
        reference_rent: Money::from_units(930),
        reference_charges: Money::from_units(62),
        description: None,
    }
}

pub(crate) fn tenant_draft(first_name: &str, email: Option<&str>) -> TenantDraft {
    TenantDraft {
        first_name: first_name.to_string(),
        last_name: "Martin".to_string(),
        email: email.map(str::to_string),
        phone: None,
        birth_date: None,
        notes: None,
    }
}

pub(crate) fn lease_draft(
    property_id: PropertyId,
    tenant_id: TenantId,
    start_date: NaiveDate,
) -> LeaseDraft {
    LeaseDraft {
        property_id,
        tenant_ids: vec![tenant_id],
        start_date,
        end_date: None,
        rent_amount: Money::from_units(930),
        charges_amount: Money::from_units(62),
        deposit: Money::from_units(930),
        payment_day: 5,
        frequency: BillingFrequency::Monthly,
        notes: None,
    }
}

/// Store seeded with one owner, one property and one tenant.
pub(crate) struct Seeded {
    pub store: Arc<InMemoryStore>,
    pub property_id: PropertyId,
    pub tenant_id: TenantId,
}

impl Seeded {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let portfolio = PortfolioService::new(Arc::clone(&store));
        let owner = portfolio.create_owner(owner_draft()).expect("owner");
        let property = portfolio
            .create_property(property_draft(owner.id))
            .expect("property");
        let tenant = TenantService::new(Arc::clone(&store))
            .create_tenant(tenant_draft("Lucie", Some("lucie.martin@example.fr")))
            .expect("tenant");
        Self {
            store,
            property_id: property.id,
            tenant_id: tenant.id,
        }
    }

    pub fn leases(&self) -> LeaseService<InMemoryStore> {
        LeaseService::new(Arc::clone(&self.store))
    }

    pub fn lease_from(&self, start_date: NaiveDate) -> Lease {
        self.leases()
            .create_lease(lease_draft(self.property_id, self.tenant_id, start_date))
            .expect("lease")
    }
}
