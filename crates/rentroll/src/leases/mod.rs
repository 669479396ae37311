//! Leases binding tenants to a property, and the charges billed on top of rent.

pub mod charges;
pub mod domain;
pub mod router;
pub mod service;

pub use charges::{Charge, ChargeDraft, ChargeFrequency, ChargeSchedule};
pub use domain::{BillingFrequency, Lease, LeaseDraft, LeaseStatus};
pub use router::lease_router;
pub use service::{LeaseFilter, LeaseService, Termination};
