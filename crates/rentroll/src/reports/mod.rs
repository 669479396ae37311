//! Read-only views over the portfolio: dashboard figures, rent exports and
//! the annual fiscal summary.

pub mod dashboard;
pub mod export;
pub mod fiscal;
pub mod router;
pub mod service;

pub use dashboard::Dashboard;
pub use export::RentExportRow;
pub use fiscal::{FiscalRegime, FiscalSummary, PropertyIncome, MICRO_FONCIER_CEILING};
pub use router::report_router;
pub use service::ReportService;
