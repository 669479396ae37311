//! Tenants and their guarantors.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{Guarantor, GuarantorDraft, Tenant, TenantDraft};
pub use router::tenant_router;
pub use service::TenantService;
