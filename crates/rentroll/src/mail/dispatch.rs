use serde::{Deserialize, Serialize};

use crate::store::EmailConfigId;

/// A composed message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub config_id: EmailConfigId,
    pub from_address: String,
    pub from_name: Option<String>,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub template_key: String,
}

/// Outbound mail hook; SMTP or queue adapters implement it.
pub trait MailDispatcher: Send + Sync {
    fn dispatch(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}
