use crate::config::ConfigError;
use crate::mail::{MailError, TemplateError};
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Error raised by the domain services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::Template(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Repository(RepositoryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Mail(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Repository(RepositoryError::Unavailable(_))
            | ServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Service(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Service(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Service(err) => err.into_response(),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Service(ServiceError::Repository(value))
    }
}

/// Field-level checks shared by the draft types.
pub(crate) mod checks {
    use super::ServiceError;
    use crate::money::Money;

    pub(crate) fn required_text(field: &str, value: &str) -> Result<(), ServiceError> {
        if value.trim().is_empty() {
            return Err(ServiceError::validation(format!("{field} must not be empty")));
        }
        Ok(())
    }

    pub(crate) fn optional_email(field: &str, value: Option<&str>) -> Result<(), ServiceError> {
        match value {
            Some(email) => email_address(field, email),
            None => Ok(()),
        }
    }

    pub(crate) fn email_address(field: &str, value: &str) -> Result<(), ServiceError> {
        let trimmed = value.trim();
        let well_formed = match trimmed.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && domain.contains('.')
                    && !trimmed.contains(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            return Err(ServiceError::validation(format!(
                "{field} '{value}' is not a valid email address"
            )));
        }
        Ok(())
    }

    pub(crate) fn non_negative(field: &str, amount: Money) -> Result<(), ServiceError> {
        if amount.is_negative() {
            return Err(ServiceError::validation(format!(
                "{field} must not be negative"
            )));
        }
        bounded(field, amount)
    }

    pub(crate) fn positive(field: &str, amount: Money) -> Result<(), ServiceError> {
        if !amount.is_positive() {
            return Err(ServiceError::validation(format!(
                "{field} must be greater than zero"
            )));
        }
        bounded(field, amount)
    }

    pub(crate) fn bounded(field: &str, amount: Money) -> Result<(), ServiceError> {
        if amount > Money::MAX {
            return Err(ServiceError::validation(format!(
                "{field} must not exceed {}",
                Money::MAX
            )));
        }
        Ok(())
    }

}
