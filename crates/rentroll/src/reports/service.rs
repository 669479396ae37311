use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::dashboard::Dashboard;
use super::export::{export_rows, write_csv};
use super::fiscal::FiscalSummary;
use crate::billing::RentFilter;
use crate::store::Store;
use crate::ServiceError;

pub struct ReportService<S> {
    store: Arc<S>,
}

impl<S> ReportService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard, ServiceError> {
        Ok(self
            .store
            .read(|tables| Dashboard::compute(tables, today))?)
    }

    /// Rents matching `filter` as CSV bytes.
    pub fn export_rents_csv(
        &self,
        filter: RentFilter,
        today: NaiveDate,
    ) -> Result<Vec<u8>, ServiceError> {
        let rows = self
            .store
            .read(|tables| export_rows(tables, &filter, today))?;
        let bytes = write_csv(&rows)?;
        info!(rows = rows.len(), bytes = bytes.len(), "rents exported");
        Ok(bytes)
    }

    pub fn fiscal_summary(&self, year: i32) -> Result<FiscalSummary, ServiceError> {
        if !(1900..=9999).contains(&year) {
            return Err(ServiceError::validation(format!(
                "year {year} is out of range"
            )));
        }
        Ok(self
            .store
            .read(|tables| FiscalSummary::compute(tables, year))?)
    }
}
