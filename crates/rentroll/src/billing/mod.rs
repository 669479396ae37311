//! Rent lifecycle: billing generation, payments and status derivation.

pub mod domain;
pub mod periods;
pub mod router;
pub mod service;
pub mod status;


pub use domain::{
    Payment, PaymentDraft, PaymentMethod, Rent, RentDraft, RentLine, RentUpdate, RentView,
};
pub use periods::{billing_periods, plan_rents, BillingPeriod, PlanOutcome, RentPlan};
pub use router::billing_router;
pub use service::{BillingService, GenerationReport, PaymentReceipt, RentFilter};
pub use status::RentStatus;
