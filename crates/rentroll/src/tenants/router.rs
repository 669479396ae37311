use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use super::domain::{Guarantor, GuarantorDraft, Tenant, TenantDraft};
use super::service::TenantService;
use crate::store::{GuarantorId, Store, TenantId};
use crate::ServiceError;

/// Router builder exposing tenant and guarantor endpoints.
pub fn tenant_router<S>(service: Arc<TenantService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenants",
            get(list_tenants::<S>).post(create_tenant::<S>),
        )
        .route(
            "/api/v1/tenants/:tenant_id",
            get(get_tenant::<S>)
                .put(update_tenant::<S>)
                .delete(delete_tenant::<S>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/guarantors",
            get(list_guarantors::<S>).post(add_guarantor::<S>),
        )
        .route(
            "/api/v1/guarantors/:guarantor_id",
            put(update_guarantor::<S>).delete(delete_guarantor::<S>),
        )
        .with_state(service)
}

pub(crate) async fn list_tenants<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
) -> Result<Json<Vec<Tenant>>, ServiceError> {
    service.list_tenants().map(Json)
}

pub(crate) async fn create_tenant<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Json(draft): Json<TenantDraft>,
) -> Result<(StatusCode, Json<Tenant>), ServiceError> {
    let tenant = service.create_tenant(draft)?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

pub(crate) async fn get_tenant<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(tenant_id): Path<TenantId>,
) -> Result<Json<Tenant>, ServiceError> {
    service.get_tenant(tenant_id).map(Json)
}

pub(crate) async fn update_tenant<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(tenant_id): Path<TenantId>,
    Json(draft): Json<TenantDraft>,
) -> Result<Json<Tenant>, ServiceError> {
    service.update_tenant(tenant_id, draft).map(Json)
}

pub(crate) async fn delete_tenant<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(tenant_id): Path<TenantId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_tenant(tenant_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_guarantors<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(tenant_id): Path<TenantId>,
) -> Result<Json<Vec<Guarantor>>, ServiceError> {
    service.list_guarantors(tenant_id).map(Json)
}

pub(crate) async fn add_guarantor<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(tenant_id): Path<TenantId>,
    Json(draft): Json<GuarantorDraft>,
) -> Result<(StatusCode, Json<Guarantor>), ServiceError> {
    let guarantor = service.add_guarantor(tenant_id, draft)?;
    Ok((StatusCode::CREATED, Json(guarantor)))
}

pub(crate) async fn update_guarantor<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(guarantor_id): Path<GuarantorId>,
    Json(draft): Json<GuarantorDraft>,
) -> Result<Json<Guarantor>, ServiceError> {
    service.update_guarantor(guarantor_id, draft).map(Json)
}

pub(crate) async fn delete_guarantor<S: Store + 'static>(
    State(service): State<Arc<TenantService<S>>>,
    Path(guarantor_id): Path<GuarantorId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_guarantor(guarantor_id)?;
    Ok(StatusCode::NO_CONTENT)
}
