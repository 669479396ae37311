use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::domain::{Owner, OwnerDraft, Property, PropertyDraft, PropertyView};
use crate::store::{OwnerId, PropertyId, Store};
use crate::ServiceError;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PropertyFilter {
    #[serde(default)]
    pub owner_id: Option<OwnerId>,
}

/// Owners and properties.
pub struct PortfolioService<S> {
    store: Arc<S>,
}

impl<S> PortfolioService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_owner(&self, draft: OwnerDraft) -> Result<Owner, ServiceError> {
        draft.validate()?;
        let owner = self.store.write(|tables| {
            let id = tables.owners.allocate_id();
            Ok::<_, ServiceError>(tables.owners.insert(Owner { id, details: draft }))
        })?;
        info!(owner_id = %owner.id, "owner created");
        Ok(owner)
    }

    pub fn update_owner(&self, id: OwnerId, draft: OwnerDraft) -> Result<Owner, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            let owner = tables.owners.replace(Owner { id, details: draft })?;
            Ok(owner)
        })
    }

    pub fn get_owner(&self, id: OwnerId) -> Result<Owner, ServiceError> {
        let owner = self
            .store
            .read(|tables| tables.owners.require(id).cloned())??;
        Ok(owner)
    }

    pub fn list_owners(&self) -> Result<Vec<Owner>, ServiceError> {
        Ok(self
            .store
            .read(|tables| tables.owners.iter().cloned().collect())?)
    }

    /// Refused while the owner still holds properties.
    pub fn delete_owner(&self, id: OwnerId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.owners.require(id)?;
            let held = tables
                .properties
                .iter()
                .filter(|property| property.details.owner_id == id)
                .count();
            if held > 0 {
                return Err(ServiceError::conflict(format!(
                    "owner {id} still holds {held} propert{}",
                    if held == 1 { "y" } else { "ies" }
                )));
            }
            tables.owners.remove(id)?;
            Ok(())
        })?;
        info!(owner_id = %id, "owner deleted");
        Ok(())
    }

    pub fn create_property(&self, draft: PropertyDraft) -> Result<Property, ServiceError> {
        draft.validate()?;
        let property = self.store.write(|tables| {
            tables.owners.require(draft.owner_id)?;
            let id = tables.properties.allocate_id();
            Ok::<_, ServiceError>(tables.properties.insert(Property { id, details: draft }))
        })?;
        info!(
            property_id = %property.id,
            owner_id = %property.details.owner_id,
            "property created"
        );
        Ok(property)
    }

    pub fn update_property(
        &self,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> Result<Property, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            tables.owners.require(draft.owner_id)?;
            let property = tables.properties.replace(Property { id, details: draft })?;
            Ok(property)
        })
    }

    pub fn get_property(
        &self,
        id: PropertyId,
        on: NaiveDate,
    ) -> Result<PropertyView, ServiceError> {
        let view = self.store.read(|tables| {
            tables
                .properties
                .require(id)
                .map(|property| PropertyView::build(property.clone(), tables.leases.iter(), on))
        })??;
        Ok(view)
    }

    pub fn list_properties(
        &self,
        filter: PropertyFilter,
        on: NaiveDate,
    ) -> Result<Vec<PropertyView>, ServiceError> {
        Ok(self.store.read(|tables| {
            tables
                .properties
                .iter()
                .filter(|property| {
                    filter
                        .owner_id
                        .map_or(true, |owner_id| property.details.owner_id == owner_id)
                })
                .map(|property| PropertyView::build(property.clone(), tables.leases.iter(), on))
                .collect()
        })?)
    }

    /// Whether a lease covers `on`.
    pub fn property_occupancy(&self, id: PropertyId, on: NaiveDate) -> Result<bool, ServiceError> {
        Ok(self.get_property(id, on)?.occupied)
    }

    /// Refused while any lease (active or terminated) references the property.
    pub fn delete_property(&self, id: PropertyId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.properties.require(id)?;
            if tables
                .leases
                .iter()
                .any(|lease| lease.terms.property_id == id)
            {
                return Err(ServiceError::conflict(format!(
                    "property {id} is referenced by leases"
                )));
            }
            tables.properties.remove(id)?;
            tables.documents.remove_where(|document| {
                document.target == crate::documents::DocumentTarget::Property(id)
            });
            Ok(())
        })?;
        info!(property_id = %id, "property deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::portfolio::{Address, OwnerKind, PropertyKind};
    use crate::store::{InMemoryStore, RepositoryError};

    fn service() -> PortfolioService<InMemoryStore> {
        PortfolioService::new(Arc::new(InMemoryStore::new()))
    }

    fn owner_draft() -> OwnerDraft {
        OwnerDraft {
            kind: OwnerKind::Individual,
            name: "Jeanne Dupont".to_string(),
            email: Some("jeanne@example.fr".to_string()),
            phone: None,
            address: None,
            registration_number: None,
        }
    }

    fn property_draft(owner_id: OwnerId) -> PropertyDraft {
        PropertyDraft {
            owner_id,
            name: "T2 Croix-Rousse".to_string(),
            kind: PropertyKind::Apartment,
            address: Address {
                line1: "12 rue d'Austerlitz".to_string(),
                line2: None,
                postal_code: "69004".to_string(),
                city: "Lyon".to_string(),
                country: "FR".to_string(),
            },
            surface_m2: 42.5,
            rooms: 2,
            reference_rent: Money::from_units(780),
            reference_charges: Money::from_units(60),
            description: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
    }

    #[test]
    fn company_owner_requires_registration_number() {
        let service = service();
        let mut draft = owner_draft();
        draft.kind = OwnerKind::Company;
        match service.create_owner(draft) {
            Err(ServiceError::Validation(message)) => {
                assert!(message.contains("registration_number"))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn property_requires_existing_owner() {
        let service = service();
        match service.create_property(property_draft(OwnerId(99))) {
            Err(ServiceError::Repository(RepositoryError::NotFound { entity, id })) => {
                assert_eq!(entity, "owner");
                assert_eq!(id, 99);
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn owner_with_properties_cannot_be_deleted() {
        let service = service();
        let owner = service.create_owner(owner_draft()).expect("owner");
        let property = service
            .create_property(property_draft(owner.id))
            .expect("property");

        assert!(matches!(
            service.delete_owner(owner.id),
            Err(ServiceError::Conflict(_))
        ));

        service.delete_property(property.id).expect("property deleted");
        service.delete_owner(owner.id).expect("owner deleted");
        assert!(service.list_owners().expect("lists").is_empty());
    }

    #[test]
    fn listing_filters_by_owner_and_reports_vacancy() {
        let service = service();
        let first = service.create_owner(owner_draft()).expect("owner");
        let second = service.create_owner(owner_draft()).expect("owner");
        service
            .create_property(property_draft(first.id))
            .expect("property");
        service
            .create_property(property_draft(second.id))
            .expect("property");

        let filtered = service
            .list_properties(
                PropertyFilter {
                    owner_id: Some(second.id),
                },
                today(),
            )
            .expect("lists");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].property.details.owner_id, second.id);
        assert!(!filtered[0].occupied);
    }
}
