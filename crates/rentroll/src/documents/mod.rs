//! Document metadata attached to properties, leases and tenants. File bytes
//! live in external storage under `storage_key`.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{Document, DocumentDraft, DocumentKind, DocumentTarget};
pub use router::document_router;
pub use service::DocumentService;
