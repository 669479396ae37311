use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::domain::{Document, DocumentDraft, DocumentTarget};
use super::service::DocumentService;
use crate::dates;
use crate::store::{DocumentId, LeaseId, PropertyId, Store, TenantId};
use crate::ServiceError;

pub fn document_router<S>(service: Arc<DocumentService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/documents",
            get(list_documents::<S>).post(create_document::<S>),
        )
        .route(
            "/api/v1/documents/:document_id",
            get(get_document::<S>)
                .put(update_document::<S>)
                .delete(delete_document::<S>),
        )
        .route(
            "/api/v1/properties/:property_id/documents",
            get(property_documents::<S>),
        )
        .route(
            "/api/v1/leases/:lease_id/documents",
            get(lease_documents::<S>),
        )
        .route(
            "/api/v1/tenants/:tenant_id/documents",
            get(tenant_documents::<S>),
        )
        .with_state(service)
}

pub(crate) async fn list_documents<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
) -> Result<Json<Vec<Document>>, ServiceError> {
    service.list_documents(None).map(Json)
}

pub(crate) async fn property_documents<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(property_id): Path<PropertyId>,
) -> Result<Json<Vec<Document>>, ServiceError> {
    service
        .list_documents(Some(DocumentTarget::Property(property_id)))
        .map(Json)
}

pub(crate) async fn lease_documents<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(lease_id): Path<LeaseId>,
) -> Result<Json<Vec<Document>>, ServiceError> {
    service
        .list_documents(Some(DocumentTarget::Lease(lease_id)))
        .map(Json)
}

pub(crate) async fn tenant_documents<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(tenant_id): Path<TenantId>,
) -> Result<Json<Vec<Document>>, ServiceError> {
    service
        .list_documents(Some(DocumentTarget::Tenant(tenant_id)))
        .map(Json)
}

pub(crate) async fn create_document<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Json(draft): Json<DocumentDraft>,
) -> Result<(StatusCode, Json<Document>), ServiceError> {
    let document = service.create_document(draft, dates::today())?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub(crate) async fn get_document<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<Document>, ServiceError> {
    service.get_document(document_id).map(Json)
}

pub(crate) async fn update_document<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(document_id): Path<DocumentId>,
    Json(draft): Json<DocumentDraft>,
) -> Result<Json<Document>, ServiceError> {
    service.update_document(document_id, draft).map(Json)
}

pub(crate) async fn delete_document<S: Store + 'static>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(document_id): Path<DocumentId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_document(document_id)?;
    Ok(StatusCode::NO_CONTENT)
}
