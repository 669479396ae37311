//! Owners and the properties they hold.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Address, Owner, OwnerDraft, OwnerKind, Property, PropertyDraft, PropertyKind, PropertyView,
};
pub use router::portfolio_router;
pub use service::{PortfolioService, PropertyFilter};
