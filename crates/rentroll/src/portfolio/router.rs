use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{Owner, OwnerDraft, Property, PropertyDraft, PropertyView};
use super::service::{PortfolioService, PropertyFilter};
use crate::dates;
use crate::store::{OwnerId, PropertyId, Store};
use crate::ServiceError;

/// Router builder exposing owner and property endpoints.
pub fn portfolio_router<S>(service: Arc<PortfolioService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/owners",
            get(list_owners::<S>).post(create_owner::<S>),
        )
        .route(
            "/api/v1/owners/:owner_id",
            get(get_owner::<S>)
                .put(update_owner::<S>)
                .delete(delete_owner::<S>),
        )
        .route(
            "/api/v1/properties",
            get(list_properties::<S>).post(create_property::<S>),
        )
        .route(
            "/api/v1/properties/:property_id",
            get(get_property::<S>)
                .put(update_property::<S>)
                .delete(delete_property::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OccupancyQuery {
    #[serde(default)]
    on: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PropertyListQuery {
    #[serde(default)]
    owner_id: Option<OwnerId>,
    #[serde(default)]
    on: Option<NaiveDate>,
}

pub(crate) async fn list_owners<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
) -> Result<Json<Vec<Owner>>, ServiceError> {
    service.list_owners().map(Json)
}

pub(crate) async fn create_owner<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Json(draft): Json<OwnerDraft>,
) -> Result<(StatusCode, Json<Owner>), ServiceError> {
    let owner = service.create_owner(draft)?;
    Ok((StatusCode::CREATED, Json(owner)))
}

pub(crate) async fn get_owner<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Path(owner_id): Path<OwnerId>,
) -> Result<Json<Owner>, ServiceError> {
    service.get_owner(owner_id).map(Json)
}

pub(crate) async fn update_owner<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Path(owner_id): Path<OwnerId>,
    Json(draft): Json<OwnerDraft>,
) -> Result<Json<Owner>, ServiceError> {
    service.update_owner(owner_id, draft).map(Json)
}

pub(crate) async fn delete_owner<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Path(owner_id): Path<OwnerId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_owner(owner_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_properties<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Query(query): Query<PropertyListQuery>,
) -> Result<Json<Vec<PropertyView>>, ServiceError> {
    let filter = PropertyFilter {
        owner_id: query.owner_id,
    };
    let on = query.on.unwrap_or_else(dates::today);
    service.list_properties(filter, on).map(Json)
}

pub(crate) async fn create_property<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Json(draft): Json<PropertyDraft>,
) -> Result<(StatusCode, Json<Property>), ServiceError> {
    let property = service.create_property(draft)?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(crate) async fn get_property<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Path(property_id): Path<PropertyId>,
    Query(query): Query<OccupancyQuery>,
) -> Result<Json<PropertyView>, ServiceError> {
    let on = query.on.unwrap_or_else(dates::today);
    service.get_property(property_id, on).map(Json)
}

pub(crate) async fn update_property<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Path(property_id): Path<PropertyId>,
    Json(draft): Json<PropertyDraft>,
) -> Result<Json<Property>, ServiceError> {
    service.update_property(property_id, draft).map(Json)
}

pub(crate) async fn delete_property<S: Store + 'static>(
    State(service): State<Arc<PortfolioService<S>>>,
    Path(property_id): Path<PropertyId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_property(property_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        portfolio_router(Arc::new(PortfolioService::new(Arc::new(
            InMemoryStore::new(),
        ))))
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn create_then_fetch_owner() {
        let router = router();
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/owners")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "kind": "individual", "name": "Paul Morel" }).to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = read_json(response).await;
        let id = created["id"].as_u64().expect("numeric id");

        let response = router
            .oneshot(
                Request::get(format!("/api/v1/owners/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["name"], "Paul Morel");
    }

    #[tokio::test]
    async fn missing_property_is_not_found() {
        let response = router()
            .oneshot(
                Request::get("/api/v1/properties/42")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_json(response).await;
        assert_eq!(body["error"], "property 42 not found");
    }

    #[tokio::test]
    async fn invalid_owner_is_unprocessable() {
        let response = router()
            .oneshot(
                Request::post("/api/v1/owners")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "kind": "individual", "name": "  ", "email": "nope" })
                            .to_string(),
                    ))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
