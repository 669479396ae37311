use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::{EmailConfig, EmailConfigDraft, EmailConfigView};
use super::dispatch::{MailDispatcher, OutgoingMail};
use super::templates::{
    default_templates, EmailTemplate, EmailTemplateDraft, TemplateError, RENT_RECEIPT,
    RENT_REMINDER,
};
use crate::billing::{Rent, RentStatus};
use crate::store::{EmailConfigId, EmailTemplateId, RentId, Store, Tables};
use crate::tenants::Tenant;
use crate::ServiceError;

/// Outcome of a composition run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailReport {
    pub rents: usize,
    pub sent: usize,
    pub failed: usize,
    /// Tenants skipped because they have no email address.
    pub without_email: usize,
}

/// Email configurations, templates and rent mail composition.
pub struct MailService<S> {
    store: Arc<S>,
    dispatcher: Arc<dyn MailDispatcher>,
}

impl<S> MailService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>, dispatcher: Arc<dyn MailDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// The first configuration becomes the default whatever the draft says.
    pub fn create_config(&self, draft: EmailConfigDraft) -> Result<EmailConfigView, ServiceError> {
        draft.validate()?;
        let config = self.store.write(|tables| {
            let mut draft = draft;
            draft.is_default = draft.is_default || tables.email_configs.is_empty();
            let id = tables.email_configs.allocate_id();
            let config = tables.email_configs.insert(EmailConfig { id, details: draft });
            if config.is_default() {
                clear_other_defaults(tables, id);
            }
            Ok::<_, ServiceError>(config)
        })?;
        info!(config_id = %config.id, is_default = config.is_default(), "email config created");
        Ok(config.view())
    }

    /// A missing password keeps the stored one. The default flag can be moved
    /// onto this config but not removed from it.
    pub fn update_config(
        &self,
        id: EmailConfigId,
        draft: EmailConfigDraft,
    ) -> Result<EmailConfigView, ServiceError> {
        draft.validate()?;
        let config = self.store.write(|tables| {
            let current = tables.email_configs.require(id)?.clone();
            if current.is_default() && !draft.is_default {
                return Err(ServiceError::conflict(format!(
                    "email config {id} is the default; make another config default instead"
                )));
            }
            let mut draft = draft;
            if draft.password.is_none() {
                draft.password = current.details.password;
            }
            let config = tables.email_configs.replace(EmailConfig { id, details: draft })?;
            if config.is_default() {
                clear_other_defaults(tables, id);
            }
            Ok(config)
        })?;
        Ok(config.view())
    }

    pub fn set_default_config(&self, id: EmailConfigId) -> Result<EmailConfigView, ServiceError> {
        let config = self.store.write(|tables| {
            let config = tables.email_configs.require_mut(id)?;
            config.details.is_default = true;
            let config = config.clone();
            clear_other_defaults(tables, id);
            Ok::<_, ServiceError>(config)
        })?;
        info!(config_id = %id, "default email config changed");
        Ok(config.view())
    }

    pub fn get_config(&self, id: EmailConfigId) -> Result<EmailConfigView, ServiceError> {
        let view = self
            .store
            .read(|tables| tables.email_configs.require(id).map(EmailConfig::view))??;
        Ok(view)
    }

    pub fn list_configs(&self) -> Result<Vec<EmailConfigView>, ServiceError> {
        Ok(self
            .store
            .read(|tables| tables.email_configs.iter().map(EmailConfig::view).collect())?)
    }

    /// Deleting the default promotes the remaining config with the lowest id.
    pub fn delete_config(&self, id: EmailConfigId) -> Result<(), ServiceError> {
        let promoted = self.store.write(|tables| {
            let removed = tables.email_configs.remove(id)?;
            if !removed.is_default() {
                return Ok::<_, ServiceError>(None);
            }
            Ok(tables.email_configs.iter_mut().next().map(|config| {
                config.details.is_default = true;
                config.id
            }))
        })?;
        match promoted {
            Some(promoted) => {
                info!(config_id = %id, %promoted, "email config deleted; default promoted")
            }
            None => info!(config_id = %id, "email config deleted"),
        }
        Ok(())
    }

    pub fn create_template(
        &self,
        draft: EmailTemplateDraft,
    ) -> Result<EmailTemplate, ServiceError> {
        draft.validate()?;
        let template = self.store.write(|tables| {
            ensure_unique_key(tables, &draft.key, None)?;
            let id = tables.email_templates.allocate_id();
            let template = EmailTemplate { id, details: draft };
            Ok::<_, ServiceError>(tables.email_templates.insert(template))
        })?;
        info!(
            template_id = %template.id,
            key = %template.details.key,
            "email template created"
        );
        Ok(template)
    }

    pub fn update_template(
        &self,
        id: EmailTemplateId,
        draft: EmailTemplateDraft,
    ) -> Result<EmailTemplate, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            ensure_unique_key(tables, &draft.key, Some(id))?;
            Ok(tables
                .email_templates
                .replace(EmailTemplate { id, details: draft })?)
        })
    }

    pub fn get_template(&self, id: EmailTemplateId) -> Result<EmailTemplate, ServiceError> {
        let template = self
            .store
            .read(|tables| tables.email_templates.require(id).cloned())??;
        Ok(template)
    }

    pub fn list_templates(&self) -> Result<Vec<EmailTemplate>, ServiceError> {
        Ok(self
            .store
            .read(|tables| tables.email_templates.iter().cloned().collect())?)
    }

    pub fn delete_template(&self, id: EmailTemplateId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.email_templates.remove(id)?;
            Ok(())
        })
    }

    /// Seeds the built-in templates whose keys are absent. Returns how many
    /// were created.
    pub fn ensure_default_templates(&self) -> Result<usize, ServiceError> {
        let created = self.store.write(|tables| {
            let mut created = 0;
            for draft in default_templates() {
                if find_template(tables, &draft.key).is_some() {
                    continue;
                }
                let id = tables.email_templates.allocate_id();
                tables.email_templates.insert(EmailTemplate { id, details: draft });
                created += 1;
            }
            Ok::<_, ServiceError>(created)
        })?;
        if created > 0 {
            info!(created, "default email templates seeded");
        }
        Ok(created)
    }

    /// Sends one reminder per tenant email for every rent overdue on `today`.
    /// Delivery failures are counted, not fatal.
    pub fn send_rent_reminders(&self, today: NaiveDate) -> Result<MailReport, ServiceError> {
        let (messages, mut report) = self.store.read(|tables| {
            let overdue: Vec<&Rent> = tables
                .rents
                .iter()
                .filter(|rent| rent.status_on(today) == RentStatus::Overdue)
                .collect();
            compose(tables, RENT_REMINDER, &overdue)
        })??;

        for mail in &messages {
            match self.dispatcher.dispatch(mail) {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    warn!(to = %mail.to, error = %err, "rent reminder not delivered");
                    report.failed += 1;
                }
            }
        }
        info!(
            rents = report.rents,
            sent = report.sent,
            failed = report.failed,
            without_email = report.without_email,
            "rent reminders sent"
        );
        Ok(report)
    }

    /// Sends the receipt of a fully paid rent to each of its tenants.
    pub fn send_receipt(
        &self,
        rent_id: RentId,
        today: NaiveDate,
    ) -> Result<MailReport, ServiceError> {
        let (messages, mut report) = self.store.read(|tables| {
            let rent = tables.rents.require(rent_id)?;
            if rent.status_on(today) != RentStatus::Paid {
                return Err(ServiceError::conflict(format!(
                    "rent {rent_id} is not fully paid"
                )));
            }
            compose(tables, RENT_RECEIPT, &[rent])
        })??;

        for mail in &messages {
            self.dispatcher.dispatch(mail)?;
            report.sent += 1;
        }
        info!(rent_id = %rent_id, sent = report.sent, "rent receipt sent");
        Ok(report)
    }
}

fn clear_other_defaults(tables: &mut Tables, keep: EmailConfigId) {
    for config in tables.email_configs.iter_mut() {
        if config.id != keep {
            config.details.is_default = false;
        }
    }
}

fn find_template<'a>(tables: &'a Tables, key: &str) -> Option<&'a EmailTemplate> {
    tables
        .email_templates
        .iter()
        .find(|template| template.details.key == key)
}

fn ensure_unique_key(
    tables: &Tables,
    key: &str,
    exclude: Option<EmailTemplateId>,
) -> Result<(), ServiceError> {
    match find_template(tables, key) {
        Some(existing) if Some(existing.id) != exclude => Err(ServiceError::conflict(format!(
            "email template key '{key}' is already used by template {}",
            existing.id
        ))),
        _ => Ok(()),
    }
}

/// Renders `template_key` for every tenant of every rent.
fn compose(
    tables: &Tables,
    template_key: &str,
    rents: &[&Rent],
) -> Result<(Vec<OutgoingMail>, MailReport), ServiceError> {
    let mut report = MailReport {
        rents: rents.len(),
        ..MailReport::default()
    };
    if rents.is_empty() {
        return Ok((Vec::new(), report));
    }
    let config = tables
        .email_configs
        .iter()
        .find(|config| config.is_default())
        .ok_or_else(|| ServiceError::conflict("no default email configuration"))?;
    let template = find_template(tables, template_key)
        .ok_or_else(|| TemplateError::Missing(template_key.to_string()))?;
    let sender_name = config
        .details
        .from_name
        .clone()
        .unwrap_or_else(|| config.details.name.clone());

    let mut messages = Vec::new();
    for rent in rents {
        let lease = tables.leases.require(rent.lease_id)?;
        let property = tables.properties.require(lease.terms.property_id)?;
        for tenant_id in &lease.terms.tenant_ids {
            let tenant = tables.tenants.require(*tenant_id)?;
            let Some(to) = tenant.details.email.clone() else {
                debug!(tenant_id = %tenant.id, rent_id = %rent.id, "tenant has no email address");
                report.without_email += 1;
                continue;
            };
            let mut context = rent_context(rent, tenant);
            context.insert("property_name", property.details.name.clone());
            context.insert("property_address", property.details.address.one_line());
            context.insert("sender_name", sender_name.clone());
            let rendered = template.render(&context)?;
            messages.push(OutgoingMail {
                config_id: config.id,
                from_address: config.details.from_address.clone(),
                from_name: config.details.from_name.clone(),
                to,
                subject: rendered.subject,
                body: rendered.body,
                template_key: template_key.to_string(),
            });
        }
    }
    Ok((messages, report))
}

fn rent_context(rent: &Rent, tenant: &Tenant) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("tenant_name", tenant.full_name()),
        ("tenant_first_name", tenant.details.first_name.clone()),
        ("period_start", rent.period_start.to_string()),
        ("period_end", rent.period_end.to_string()),
        ("due_date", rent.due_date.to_string()),
        ("rent_amount", rent.rent_amount.to_string()),
        ("charges_amount", rent.charges_amount.to_string()),
        ("amount_due", rent.amount_due().to_string()),
        ("amount_paid", rent.amount_paid.to_string()),
        ("outstanding", rent.outstanding().to_string()),
    ])
}
