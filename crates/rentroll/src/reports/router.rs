use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::dashboard::Dashboard;
use super::fiscal::FiscalSummary;
use super::service::ReportService;
use crate::billing::RentFilter;
use crate::dates;
use crate::store::Store;
use crate::ServiceError;

pub fn report_router<S>(service: Arc<ReportService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/api/v1/reports/dashboard", get(dashboard::<S>))
        .route("/api/v1/reports/rents.csv", get(export_rents::<S>))
        .route("/api/v1/reports/fiscal/:year", get(fiscal_summary::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default)]
    on: Option<NaiveDate>,
}

pub(crate) async fn dashboard<S: Store + 'static>(
    State(service): State<Arc<ReportService<S>>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ServiceError> {
    service
        .dashboard(query.on.unwrap_or_else(dates::today))
        .map(Json)
}

pub(crate) async fn export_rents<S: Store + 'static>(
    State(service): State<Arc<ReportService<S>>>,
    Query(filter): Query<RentFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let bytes = service.export_rents_csv(filter, dates::today())?;
    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref()),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"rents.csv\""),
        ],
        bytes,
    ))
}

pub(crate) async fn fiscal_summary<S: Store + 'static>(
    State(service): State<Arc<ReportService<S>>>,
    Path(year): Path<i32>,
) -> Result<Json<FiscalSummary>, ServiceError> {
    service.fiscal_summary(year).map(Json)
}
