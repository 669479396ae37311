use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::checks;
use crate::store::{EmailTemplateId, Record};
use crate::ServiceError;

pub const RENT_REMINDER: &str = "rent_reminder";
pub const RENT_RECEIPT: &str = "rent_receipt";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template '{template}' uses unknown placeholder '{placeholder}'")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },
    #[error("email template '{0}' is not defined")]
    Missing(String),
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplateDraft {
    /// Stable identifier, unique across templates.
    pub key: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl EmailTemplateDraft {
    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        checks::required_text("key", &self.key)?;
        checks::required_text("subject", &self.subject)?;
        checks::required_text("body", &self.body)?;
        let well_formed = self
            .key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !well_formed {
            return Err(ServiceError::validation(format!(
                "key '{}' may only contain lowercase letters, digits and underscores",
                self.key
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: EmailTemplateId,
    #[serde(flatten)]
    pub details: EmailTemplateDraft,
}

impl EmailTemplate {
    pub fn render(
        &self,
        context: &BTreeMap<&str, String>,
    ) -> Result<RenderedMessage, TemplateError> {
        let key = &self.details.key;
        Ok(RenderedMessage {
            subject: render(key, &self.details.subject, context)?,
            body: render(key, &self.details.body, context)?,
        })
    }
}

impl Record for EmailTemplate {
    type Id = EmailTemplateId;
    const ENTITY: &'static str = "email template";

    fn id(&self) -> EmailTemplateId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

fn placeholder() -> Result<&'static Regex, TemplateError> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    if let Some(regex) = PLACEHOLDER.get() {
        return Ok(regex);
    }
    let regex = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}")?;
    Ok(PLACEHOLDER.get_or_init(|| regex))
}

/// Replaces every `{{name}}` in `text` from `context`.
pub fn render(
    template: &str,
    text: &str,
    context: &BTreeMap<&str, String>,
) -> Result<String, TemplateError> {
    let placeholder = placeholder()?;
    if let Some(unknown) = placeholder
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .find(|name| !context.contains_key(name.as_str()))
    {
        return Err(TemplateError::UnknownPlaceholder {
            template: template.to_string(),
            placeholder: unknown,
        });
    }
    Ok(placeholder
        .replace_all(text, |caps: &Captures<'_>| {
            context.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Templates seeded by `ensure_default_templates`.
pub(crate) fn default_templates() -> Vec<EmailTemplateDraft> {
    vec![
        EmailTemplateDraft {
            key: RENT_REMINDER.to_string(),
            subject: "Rent reminder for {{property_name}}".to_string(),
            body: "Hello {{tenant_name}},\n\n\
                   The rent for {{property_name}} covering {{period_start}} to {{period_end}} \
                   was due on {{due_date}}. {{outstanding}} remains outstanding.\n\n\
                   Kind regards,\n{{sender_name}}"
                .to_string(),
            description: Some("Sent for overdue rents".to_string()),
        },
        EmailTemplateDraft {
            key: RENT_RECEIPT.to_string(),
            subject: "Rent receipt for {{property_name}}, {{period_start}} to {{period_end}}"
                .to_string(),
            body: "Hello {{tenant_name}},\n\n\
                   We acknowledge receipt of {{amount_paid}} for {{property_name}} \
                   ({{property_address}}), covering {{period_start}} to {{period_end}}: \
                   rent {{rent_amount}}, charges {{charges_amount}}.\n\n\
                   Kind regards,\n{{sender_name}}"
                .to_string(),
            description: Some("Sent once a rent is fully paid".to_string()),
        },
    ]
}
