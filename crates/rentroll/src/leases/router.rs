use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::charges::{Charge, ChargeDraft};
use super::domain::{Lease, LeaseDraft};
use super::service::{LeaseFilter, LeaseService, Termination};
use crate::store::{ChargeId, LeaseId, Store};
use crate::ServiceError;

/// Router builder exposing lease and charge endpoints.
pub fn lease_router<S>(service: Arc<LeaseService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/leases",
            get(list_leases::<S>).post(create_lease::<S>),
        )
        .route(
            "/api/v1/leases/:lease_id",
            get(get_lease::<S>)
                .put(update_lease::<S>)
                .delete(delete_lease::<S>),
        )
        .route(
            "/api/v1/leases/:lease_id/terminate",
            post(terminate_lease::<S>),
        )
        .route(
            "/api/v1/leases/:lease_id/charges",
            get(list_charges::<S>).post(add_charge::<S>),
        )
        .route(
            "/api/v1/charges/:charge_id",
            put(update_charge::<S>).delete(delete_charge::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TerminateRequest {
    end_date: NaiveDate,
}

pub(crate) async fn list_leases<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Query(filter): Query<LeaseFilter>,
) -> Result<Json<Vec<Lease>>, ServiceError> {
    service.list_leases(filter).map(Json)
}

pub(crate) async fn create_lease<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Json(draft): Json<LeaseDraft>,
) -> Result<(StatusCode, Json<Lease>), ServiceError> {
    let lease = service.create_lease(draft)?;
    Ok((StatusCode::CREATED, Json(lease)))
}

pub(crate) async fn get_lease<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(lease_id): Path<LeaseId>,
) -> Result<Json<Lease>, ServiceError> {
    service.get_lease(lease_id).map(Json)
}

pub(crate) async fn update_lease<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(lease_id): Path<LeaseId>,
    Json(draft): Json<LeaseDraft>,
) -> Result<Json<Lease>, ServiceError> {
    service.update_lease(lease_id, draft).map(Json)
}

pub(crate) async fn delete_lease<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(lease_id): Path<LeaseId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_lease(lease_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn terminate_lease<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(lease_id): Path<LeaseId>,
    Json(request): Json<TerminateRequest>,
) -> Result<Json<Termination>, ServiceError> {
    service.terminate_lease(lease_id, request.end_date).map(Json)
}

pub(crate) async fn list_charges<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(lease_id): Path<LeaseId>,
) -> Result<Json<Vec<Charge>>, ServiceError> {
    service.list_charges(lease_id).map(Json)
}

pub(crate) async fn add_charge<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(lease_id): Path<LeaseId>,
    Json(draft): Json<ChargeDraft>,
) -> Result<(StatusCode, Json<Charge>), ServiceError> {
    let charge = service.add_charge(lease_id, draft)?;
    Ok((StatusCode::CREATED, Json(charge)))
}

pub(crate) async fn update_charge<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(charge_id): Path<ChargeId>,
    Json(draft): Json<ChargeDraft>,
) -> Result<Json<Charge>, ServiceError> {
    service.update_charge(charge_id, draft).map(Json)
}

pub(crate) async fn delete_charge<S: Store + 'static>(
    State(service): State<Arc<LeaseService<S>>>,
    Path(charge_id): Path<ChargeId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_charge(charge_id)?;
    Ok(StatusCode::NO_CONTENT)
}
