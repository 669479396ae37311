use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::config::{EmailConfigDraft, EmailConfigView};
use super::service::{MailReport, MailService};
use super::templates::{EmailTemplate, EmailTemplateDraft};
use crate::dates;
use crate::store::{EmailConfigId, EmailTemplateId, RentId, Store};
use crate::ServiceError;

/// Router builder exposing email configuration, template and sending endpoints.
pub fn mail_router<S>(service: Arc<MailService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/email/configs",
            get(list_configs::<S>).post(create_config::<S>),
        )
        .route(
            "/api/v1/email/configs/:config_id",
            get(get_config::<S>)
                .put(update_config::<S>)
                .delete(delete_config::<S>),
        )
        .route(
            "/api/v1/email/configs/:config_id/default",
            post(set_default_config::<S>),
        )
        .route(
            "/api/v1/email/templates",
            get(list_templates::<S>).post(create_template::<S>),
        )
        .route(
            "/api/v1/email/templates/:template_id",
            get(get_template::<S>)
                .put(update_template::<S>)
                .delete(delete_template::<S>),
        )
        .route("/api/v1/email/reminders", post(send_reminders::<S>))
        .route("/api/v1/rents/:rent_id/receipt", post(send_receipt::<S>))
        .with_state(service)
}

pub(crate) async fn list_configs<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
) -> Result<Json<Vec<EmailConfigView>>, ServiceError> {
    service.list_configs().map(Json)
}

pub(crate) async fn create_config<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Json(draft): Json<EmailConfigDraft>,
) -> Result<(StatusCode, Json<EmailConfigView>), ServiceError> {
    let config = service.create_config(draft)?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub(crate) async fn get_config<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(config_id): Path<EmailConfigId>,
) -> Result<Json<EmailConfigView>, ServiceError> {
    service.get_config(config_id).map(Json)
}

pub(crate) async fn update_config<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(config_id): Path<EmailConfigId>,
    Json(draft): Json<EmailConfigDraft>,
) -> Result<Json<EmailConfigView>, ServiceError> {
    service.update_config(config_id, draft).map(Json)
}

pub(crate) async fn delete_config<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(config_id): Path<EmailConfigId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_config(config_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn set_default_config<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(config_id): Path<EmailConfigId>,
) -> Result<Json<EmailConfigView>, ServiceError> {
    service.set_default_config(config_id).map(Json)
}

pub(crate) async fn list_templates<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
) -> Result<Json<Vec<EmailTemplate>>, ServiceError> {
    service.list_templates().map(Json)
}

pub(crate) async fn create_template<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Json(draft): Json<EmailTemplateDraft>,
) -> Result<(StatusCode, Json<EmailTemplate>), ServiceError> {
    let template = service.create_template(draft)?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub(crate) async fn get_template<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(template_id): Path<EmailTemplateId>,
) -> Result<Json<EmailTemplate>, ServiceError> {
    service.get_template(template_id).map(Json)
}

pub(crate) async fn update_template<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(template_id): Path<EmailTemplateId>,
    Json(draft): Json<EmailTemplateDraft>,
) -> Result<Json<EmailTemplate>, ServiceError> {
    service.update_template(template_id, draft).map(Json)
}

pub(crate) async fn delete_template<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(template_id): Path<EmailTemplateId>,
) -> Result<StatusCode, ServiceError> {
    service.delete_template(template_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn send_reminders<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
) -> Result<Json<MailReport>, ServiceError> {
    service.send_rent_reminders(dates::today()).map(Json)
}

pub(crate) async fn send_receipt<S: Store + 'static>(
    State(service): State<Arc<MailService<S>>>,
    Path(rent_id): Path<RentId>,
) -> Result<Json<MailReport>, ServiceError> {
    service.send_receipt(rent_id, dates::today()).map(Json)
}
