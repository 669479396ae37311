use std::sync::Arc;

use tracing::info;

use super::domain::{Guarantor, GuarantorDraft, Tenant, TenantDraft};
use crate::documents::DocumentTarget;
use crate::store::{GuarantorId, Store, TenantId};
use crate::ServiceError;

/// Tenants and guarantors.
pub struct TenantService<S> {
    store: Arc<S>,
}

impl<S> TenantService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_tenant(&self, draft: TenantDraft) -> Result<Tenant, ServiceError> {
        draft.validate()?;
        let tenant = self.store.write(|tables| {
            let id = tables.tenants.allocate_id();
            Ok::<_, ServiceError>(tables.tenants.insert(Tenant { id, details: draft }))
        })?;
        info!(tenant_id = %tenant.id, "tenant created");
        Ok(tenant)
    }

    pub fn update_tenant(&self, id: TenantId, draft: TenantDraft) -> Result<Tenant, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            let tenant = tables.tenants.replace(Tenant { id, details: draft })?;
            Ok(tenant)
        })
    }

    pub fn get_tenant(&self, id: TenantId) -> Result<Tenant, ServiceError> {
        let tenant = self
            .store
            .read(|tables| tables.tenants.require(id).cloned())??;
        Ok(tenant)
    }

    pub fn list_tenants(&self) -> Result<Vec<Tenant>, ServiceError> {
        Ok(self
            .store
            .read(|tables| tables.tenants.iter().cloned().collect())?)
    }

    /// Refused while a lease names the tenant; removes guarantors and documents with it.
    pub fn delete_tenant(&self, id: TenantId) -> Result<(), ServiceError> {
        let guarantors = self.store.write(|tables| {
            tables.tenants.require(id)?;
            if let Some(lease) = tables
                .leases
                .iter()
                .find(|lease| lease.terms.tenant_ids.contains(&id))
            {
                return Err(ServiceError::conflict(format!(
                    "tenant {id} is party to lease {}",
                    lease.id
                )));
            }
            tables.tenants.remove(id)?;
            tables
                .documents
                .remove_where(|document| document.target == DocumentTarget::Tenant(id));
            Ok(tables
                .guarantors
                .remove_where(|guarantor| guarantor.tenant_id == id))
        })?;
        info!(tenant_id = %id, guarantors, "tenant deleted");
        Ok(())
    }

    pub fn add_guarantor(
        &self,
        tenant_id: TenantId,
        draft: GuarantorDraft,
    ) -> Result<Guarantor, ServiceError> {
        draft.validate()?;
        let guarantor = self.store.write(|tables| {
            tables.tenants.require(tenant_id)?;
            let id = tables.guarantors.allocate_id();
            Ok::<_, ServiceError>(tables.guarantors.insert(Guarantor {
                id,
                tenant_id,
                details: draft,
            }))
        })?;
        info!(guarantor_id = %guarantor.id, tenant_id = %tenant_id, "guarantor added");
        Ok(guarantor)
    }

    pub fn update_guarantor(
        &self,
        id: GuarantorId,
        draft: GuarantorDraft,
    ) -> Result<Guarantor, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            let guarantor = tables.guarantors.require_mut(id)?;
            guarantor.details = draft;
            Ok(guarantor.clone())
        })
    }

    pub fn list_guarantors(&self, tenant_id: TenantId) -> Result<Vec<Guarantor>, ServiceError> {
        let guarantors = self.store.read(|tables| {
            tables.tenants.require(tenant_id).map(|_| {
                tables
                    .guarantors
                    .iter()
                    .filter(|guarantor| guarantor.tenant_id == tenant_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
        })??;
        Ok(guarantors)
    }

    pub fn delete_guarantor(&self, id: GuarantorId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.guarantors.remove(id)?;
            Ok(())
        })
    }
}
