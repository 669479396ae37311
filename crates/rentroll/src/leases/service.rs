use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::charges::{Charge, ChargeDraft};
use super::domain::{Lease, LeaseDraft, LeaseStatus};
use crate::billing::Rent;
use crate::documents::DocumentTarget;
use crate::store::{ChargeId, LeaseId, PropertyId, Store, Tables, TenantId};
use crate::ServiceError;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LeaseFilter {
    #[serde(default)]
    pub property_id: Option<PropertyId>,
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub status: Option<LeaseStatus>,
}

impl LeaseFilter {
    fn matches(&self, lease: &Lease) -> bool {
        self.property_id
            .map_or(true, |id| lease.terms.property_id == id)
            && self
                .tenant_id
                .map_or(true, |id| lease.terms.tenant_ids.contains(&id))
            && self.status.map_or(true, |status| lease.status == status)
    }
}

/// Result of ending a lease early.
#[derive(Debug, Clone, Serialize)]
pub struct Termination {
    pub lease: Lease,
    pub removed_rents: usize,
}

/// Lease lifecycle and lease charges.
pub struct LeaseService<S> {
    store: Arc<S>,
}

impl<S> LeaseService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_lease(&self, draft: LeaseDraft) -> Result<Lease, ServiceError> {
        draft.validate()?;
        let lease = self.store.write(|tables| {
            check_references(tables, &draft, None)?;
            let id = tables.leases.allocate_id();
            Ok::<_, ServiceError>(tables.leases.insert(Lease {
                id,
                status: LeaseStatus::Active,
                terms: draft,
            }))
        })?;
        info!(
            lease_id = %lease.id,
            property_id = %lease.terms.property_id,
            tenants = lease.terms.tenant_ids.len(),
            "lease created"
        );
        Ok(lease)
    }

    /// Replaces the terms. Once rents exist the property, start date and
    /// billing frequency are frozen. An end date drops the unpaid rents
    /// billed past it, as termination does.
    pub fn update_lease(&self, id: LeaseId, draft: LeaseDraft) -> Result<Lease, ServiceError> {
        draft.validate()?;
        let (lease, removed_rents) = self.store.write(|tables| {
            let current = tables.leases.require(id)?.clone();
            if current.status == LeaseStatus::Terminated {
                return Err(ServiceError::conflict(format!(
                    "lease {id} is terminated"
                )));
            }
            let billed = tables.rents.iter().any(|rent| rent.lease_id == id);
            if billed && !current.terms.same_billing_schedule(&draft) {
                return Err(ServiceError::conflict(format!(
                    "lease {id} already has rents; property, start_date and frequency cannot change"
                )));
            }
            check_references(tables, &draft, Some(id))?;
            let removed_rents = match draft.end_date {
                Some(end_date) => drop_rents_after(tables, id, end_date)?,
                None => 0,
            };
            let lease = tables.leases.replace(Lease {
                id,
                status: current.status,
                terms: draft,
            })?;
            Ok::<_, ServiceError>((lease, removed_rents))
        })?;
        info!(lease_id = %id, removed_rents, "lease updated");
        Ok(lease)
    }

    pub fn get_lease(&self, id: LeaseId) -> Result<Lease, ServiceError> {
        let lease = self
            .store
            .read(|tables| tables.leases.require(id).cloned())??;
        Ok(lease)
    }

    pub fn list_leases(&self, filter: LeaseFilter) -> Result<Vec<Lease>, ServiceError> {
        Ok(self.store.read(|tables| {
            tables
                .leases
                .iter()
                .filter(|lease| filter.matches(lease))
                .cloned()
                .collect()
        })?)
    }

    /// Ends the lease on `end_date` and drops unpaid rents billed past it.
    pub fn terminate_lease(
        &self,
        id: LeaseId,
        end_date: NaiveDate,
    ) -> Result<Termination, ServiceError> {
        let termination = self.store.write(|tables| {
            let lease = tables.leases.require_mut(id)?;
            if lease.status == LeaseStatus::Terminated {
                return Err(ServiceError::conflict(format!(
                    "lease {id} is already terminated"
                )));
            }
            if end_date < lease.terms.start_date {
                return Err(ServiceError::validation(
                    "end_date must not precede the lease start_date",
                ));
            }
            lease.status = LeaseStatus::Terminated;
            lease.terms.end_date = Some(end_date);
            let lease = lease.clone();
            let removed_rents = drop_rents_after(tables, id, end_date)?;

            Ok(Termination {
                lease,
                removed_rents,
            })
        })?;
        info!(
            lease_id = %id,
            %end_date,
            removed_rents = termination.removed_rents,
            "lease terminated"
        );
        Ok(termination)
    }

    /// Refused once any rent of the lease has payments; otherwise cascades
    /// rents, charges and documents.
    pub fn delete_lease(&self, id: LeaseId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.leases.require(id)?;
            let rent_ids: Vec<_> = tables
                .rents
                .iter()
                .filter(|rent| rent.lease_id == id)
                .map(|rent| rent.id)
                .collect();
            if tables
                .payments
                .iter()
                .any(|payment| rent_ids.contains(&payment.rent_id))
            {
                return Err(ServiceError::conflict(format!(
                    "lease {id} has recorded payments"
                )));
            }
            tables.rents.remove_where(|rent| rent.lease_id == id);
            tables.charges.remove_where(|charge| charge.lease_id == id);
            tables
                .documents
                .remove_where(|document| document.target == DocumentTarget::Lease(id));
            tables.leases.remove(id)?;
            Ok(())
        })?;
        info!(lease_id = %id, "lease deleted");
        Ok(())
    }

    pub fn add_charge(
        &self,
        lease_id: LeaseId,
        draft: ChargeDraft,
    ) -> Result<Charge, ServiceError> {
        draft.validate()?;
        let charge = self.store.write(|tables| {
            tables.leases.require(lease_id)?;
            let id = tables.charges.allocate_id();
            Ok::<_, ServiceError>(tables.charges.insert(Charge {
                id,
                lease_id,
                details: draft,
            }))
        })?;
        info!(charge_id = %charge.id, lease_id = %lease_id, "charge added");
        Ok(charge)
    }

    /// Rents already generated keep the lines they were billed with.
    pub fn update_charge(&self, id: ChargeId, draft: ChargeDraft) -> Result<Charge, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            let charge = tables.charges.require_mut(id)?;
            charge.details = draft;
            Ok(charge.clone())
        })
    }

    pub fn list_charges(&self, lease_id: LeaseId) -> Result<Vec<Charge>, ServiceError> {
        let charges = self.store.read(|tables| {
            tables.leases.require(lease_id).map(|_| {
                tables
                    .charges
                    .iter()
                    .filter(|charge| charge.lease_id == lease_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
        })??;
        Ok(charges)
    }

    pub fn delete_charge(&self, id: ChargeId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.charges.remove(id)?;
            Ok(())
        })
    }
}

/// Removes the lease's rents whose period starts after `end_date`, unless
/// one of them already has payments.
fn drop_rents_after(
    tables: &mut Tables,
    id: LeaseId,
    end_date: NaiveDate,
) -> Result<usize, ServiceError> {
    let after_end = |rent: &Rent| rent.lease_id == id && rent.period_start > end_date;
    if let Some(rent) = tables
        .rents
        .iter()
        .find(|&rent| after_end(rent) && rent.amount_paid.is_positive())
    {
        return Err(ServiceError::conflict(format!(
            "rent {} after {end_date} already has payments",
            rent.id
        )));
    }
    Ok(tables.rents.remove_where(after_end))
}

/// Property and tenants must exist, and no other lease may occupy the
/// property over an overlapping range, including a terminated lease still
/// running its notice period.
fn check_references(
    tables: &Tables,
    draft: &LeaseDraft,
    exclude: Option<LeaseId>,
) -> Result<(), ServiceError> {
    tables.properties.require(draft.property_id)?;
    for tenant_id in &draft.tenant_ids {
        tables.tenants.require(*tenant_id)?;
    }
    if let Some(existing) = tables.leases.iter().find(|lease| {
        Some(lease.id) != exclude
            && lease.terms.property_id == draft.property_id
            && lease.overlaps(draft.start_date, draft.end_date)
    }) {
        warn!(
            property_id = %draft.property_id,
            existing_lease = %existing.id,
            "overlapping lease rejected"
        );
        return Err(ServiceError::conflict(format!(
            "property {} is already leased under lease {} over that period",
            draft.property_id, existing.id
        )));
    }
    Ok(())
}
