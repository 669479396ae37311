use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{Payment, PaymentDraft, RentDraft, RentUpdate, RentView};
use super::service::{BillingService, GenerationReport, PaymentReceipt, RentFilter};
use crate::dates;
use crate::store::{LeaseId, PaymentId, RentId, Store};
use crate::ServiceError;

/// Router builder exposing rent generation, rent and payment endpoints.
pub fn billing_router<S>(service: Arc<BillingService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/api/v1/billing/generate", post(generate_all::<S>))
        .route("/api/v1/leases/:lease_id/rents", get(list_lease_rents::<S>))
        .route(
            "/api/v1/leases/:lease_id/rents/generate",
            post(generate_lease_rents::<S>),
        )
        .route(
            "/api/v1/rents",
            get(list_rents::<S>).post(create_rent::<S>),
        )
        .route(
            "/api/v1/rents/:rent_id",
            get(get_rent::<S>)
                .put(update_rent::<S>)
                .delete(delete_rent::<S>),
        )
        .route(
            "/api/v1/rents/:rent_id/payments",
            get(list_payments::<S>).post(record_payment::<S>),
        )
        .route(
            "/api/v1/payments/:payment_id",
            put(update_payment::<S>).delete(delete_payment::<S>),
        )
        .with_state(service)
}

/// Generation horizon; defaults to today.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateRequest {
    #[serde(default)]
    through: Option<NaiveDate>,
}

pub(crate) async fn generate_all<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<Vec<GenerationReport>>, ServiceError> {
    let today = dates::today();
    let through = body.and_then(|Json(request)| request.through).unwrap_or(today);
    service.generate_all(through, today).map(Json)
}

pub(crate) async fn generate_lease_rents<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(lease_id): Path<LeaseId>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerationReport>, ServiceError> {
    let today = dates::today();
    let through = body.and_then(|Json(request)| request.through).unwrap_or(today);
    service.generate_rents(lease_id, through, today).map(Json)
}

pub(crate) async fn list_lease_rents<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(lease_id): Path<LeaseId>,
    Query(filter): Query<RentFilter>,
) -> Result<Json<Vec<RentView>>, ServiceError> {
    let filter = RentFilter {
        lease_id: Some(lease_id),
        ..filter
    };
    service.list_rents(filter, dates::today()).map(Json)
}

pub(crate) async fn list_rents<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Query(filter): Query<RentFilter>,
) -> Result<Json<Vec<RentView>>, ServiceError> {
    service.list_rents(filter, dates::today()).map(Json)
}

pub(crate) async fn create_rent<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Json(draft): Json<RentDraft>,
) -> Result<(StatusCode, Json<RentView>), ServiceError> {
    let rent = service.create_rent(draft, dates::today())?;
    Ok((StatusCode::CREATED, Json(rent)))
}

pub(crate) async fn get_rent<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(rent_id): Path<RentId>,
) -> Result<Json<RentView>, ServiceError> {
    service.get_rent(rent_id, dates::today()).map(Json)
}

pub(crate) async fn update_rent<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(rent_id): Path<RentId>,
    Json(update): Json<RentUpdate>,
) -> Result<Json<RentView>, ServiceError> {
    service.update_rent(rent_id, update, dates::today()).map(Json)
}

pub(crate) async fn delete_rent<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(rent_id): Path<RentId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_rent(rent_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_payments<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(rent_id): Path<RentId>,
) -> Result<Json<Vec<Payment>>, ServiceError> {
    service.list_payments(rent_id).map(Json)
}

pub(crate) async fn record_payment<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(rent_id): Path<RentId>,
    Json(draft): Json<PaymentDraft>,
) -> Result<(StatusCode, Json<PaymentReceipt>), ServiceError> {
    let receipt = service.record_payment(rent_id, draft, dates::today())?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub(crate) async fn update_payment<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(payment_id): Path<PaymentId>,
    Json(draft): Json<PaymentDraft>,
) -> Result<Json<PaymentReceipt>, ServiceError> {
    service
        .update_payment(payment_id, draft, dates::today())
        .map(Json)
}

pub(crate) async fn delete_payment<S: Store + 'static>(
    State(service): State<Arc<BillingService<S>>>,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<RentView>, ServiceError> {
    service.delete_payment(payment_id, dates::today()).map(Json)
}
