use serde::{Deserialize, Serialize};

use crate::error::checks;
use crate::store::{EmailConfigId, Record};
use crate::ServiceError;

fn default_port() -> u16 {
    587
}

fn default_tls() -> bool {
    true
}

/// Sender settings as submitted by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfigDraft {
    pub name: String,
    pub smtp_host: String,
    #[serde(default = "default_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    /// On update, `None` keeps the stored password.
    #[serde(default)]
    pub password: Option<String>,
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default = "default_tls")]
    pub use_tls: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl EmailConfigDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("name", &self.name)?;
        checks::required_text("smtp_host", &self.smtp_host)?;
        if self.smtp_port == 0 {
            return Err(ServiceError::validation("smtp_port must not be zero"));
        }
        checks::email_address("from_address", &self.from_address)
    }
}

/// Stored configuration. The password is persisted but never returned by the
/// API; responses go through [`EmailConfigView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub id: EmailConfigId,
    #[serde(flatten)]
    pub details: EmailConfigDraft,
}

impl EmailConfig {
    pub fn is_default(&self) -> bool {
        self.details.is_default
    }

    pub fn view(&self) -> EmailConfigView {
        let details = &self.details;
        EmailConfigView {
            id: self.id,
            name: details.name.clone(),
            smtp_host: details.smtp_host.clone(),
            smtp_port: details.smtp_port,
            username: details.username.clone(),
            has_password: details.password.is_some(),
            from_address: details.from_address.clone(),
            from_name: details.from_name.clone(),
            use_tls: details.use_tls,
            is_default: details.is_default,
        }
    }
}

impl Record for EmailConfig {
    type Id = EmailConfigId;
    const ENTITY: &'static str = "email config";

    fn id(&self) -> EmailConfigId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailConfigView {
    pub id: EmailConfigId,
    pub name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub has_password: bool,
    pub from_address: String,
    pub from_name: Option<String>,
    pub use_tls: bool,
    pub is_default: bool,
}
