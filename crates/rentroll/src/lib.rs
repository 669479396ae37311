//! Rental-property management: owners, properties, tenants, leases, the rent
//! lifecycle, documents, mail composition and reporting.

pub mod billing;
pub mod config;
pub mod dates;
pub mod documents;
pub mod error;
pub mod leases;
pub mod mail;
pub mod money;
pub mod portfolio;
pub mod reports;
pub mod store;
pub mod telemetry;
pub mod tenants;

#[cfg(test)]
mod fixtures;

pub use error::{AppError, ServiceError};
pub use money::Money;
