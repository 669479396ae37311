//! Email sender configurations, message templates and rent mail composition.
//!
//! Delivery is delegated to a [`MailDispatcher`]; nothing here speaks SMTP.

pub mod config;
pub mod dispatch;
pub mod router;
pub mod service;
pub mod templates;

#[cfg(test)]
mod tests;

pub use config::{EmailConfig, EmailConfigDraft, EmailConfigView};
pub use dispatch::{MailDispatcher, MailError, OutgoingMail};
pub use router::mail_router;
pub use service::{MailReport, MailService};
pub use templates::{
    render, EmailTemplate, EmailTemplateDraft, RenderedMessage, TemplateError, RENT_RECEIPT,
    RENT_REMINDER,
};
