use std::sync::{Arc, Mutex};

use super::*;
use crate::billing::{BillingService, PaymentDraft, PaymentMethod, RentFilter};
use crate::fixtures::{date, Seeded};
use crate::money::Money;
use crate::store::{EmailConfigId, InMemoryStore};
use crate::tenants::TenantService;
use crate::ServiceError;

#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_for: Option<String>,
}

impl RecordingDispatcher {
    fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("lock").clone()
    }
}

impl MailDispatcher for RecordingDispatcher {
    fn dispatch(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.fail_for.as_deref() == Some(mail.to.as_str()) {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().expect("lock").push(mail.clone());
        Ok(())
    }
}

fn config_draft(name: &str) -> EmailConfigDraft {
    EmailConfigDraft {
        name: name.to_string(),
        smtp_host: "smtp.example.fr".to_string(),
        smtp_port: 587,
        username: Some("gestion".to_string()),
        password: Some("s3cret".to_string()),
        from_address: "gestion@example.fr".to_string(),
        from_name: Some("Gestion Dumas".to_string()),
        use_tls: true,
        is_default: false,
    }
}

fn service(
    seeded: &Seeded,
    dispatcher: Arc<RecordingDispatcher>,
) -> MailService<InMemoryStore> {
    MailService::new(Arc::clone(&seeded.store), dispatcher)
}

fn defaults(configs: &[EmailConfigView]) -> Vec<EmailConfigId> {
    configs
        .iter()
        .filter(|config| config.is_default)
        .map(|config| config.id)
        .collect()
}

#[test]
fn first_config_becomes_default() {
    let seeded = Seeded::new();
    let service = service(&seeded, Arc::default());
    let first = service.create_config(config_draft("main")).expect("creates");
    let second = service.create_config(config_draft("backup")).expect("creates");

    assert!(first.is_default);
    assert!(!second.is_default);
    assert_eq!(defaults(&service.list_configs().expect("lists")), vec![first.id]);
}

#[test]
fn setting_a_default_clears_the_others() {
    let seeded = Seeded::new();
    let service = service(&seeded, Arc::default());
    service.create_config(config_draft("main")).expect("creates");
    let second = service.create_config(config_draft("backup")).expect("creates");

    service.set_default_config(second.id).expect("sets default");
    assert_eq!(defaults(&service.list_configs().expect("lists")), vec![second.id]);

    let mut draft = config_draft("third");
    draft.is_default = true;
    let third = service.create_config(draft).expect("creates");
    assert_eq!(defaults(&service.list_configs().expect("lists")), vec![third.id]);
}

#[test]
fn default_cannot_be_unset_directly() {
    let seeded = Seeded::new();
    let service = service(&seeded, Arc::default());
    let first = service.create_config(config_draft("main")).expect("creates");

    let err = service
        .update_config(first.id, config_draft("main"))
        .expect_err("would leave no default");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn deleting_the_default_promotes_lowest_id() {
    let seeded = Seeded::new();
    let service = service(&seeded, Arc::default());
    let first = service.create_config(config_draft("a")).expect("creates");
    let second = service.create_config(config_draft("b")).expect("creates");
    service.create_config(config_draft("c")).expect("creates");

    service.delete_config(first.id).expect("deletes");
    assert_eq!(defaults(&service.list_configs().expect("lists")), vec![second.id]);
}

#[test]
fn password_is_hidden_and_kept_on_update() {
    let seeded = Seeded::new();
    let service = service(&seeded, Arc::default());
    let created = service.create_config(config_draft("main")).expect("creates");
    let json = serde_json::to_value(&created).expect("serializes");
    assert!(json.get("password").is_none());
    assert_eq!(json["has_password"], true);

    let mut draft = config_draft("main");
    draft.password = None;
    draft.is_default = true;
    let updated = service.update_config(created.id, draft).expect("updates");
    assert!(updated.has_password);
}

#[test]
fn template_keys_are_unique() {
    let seeded = Seeded::new();
    let service = service(&seeded, Arc::default());
    assert_eq!(service.ensure_default_templates().expect("seeds"), 2);
    assert_eq!(service.ensure_default_templates().expect("seeds"), 0);

    let err = service
        .create_template(EmailTemplateDraft {
            key: RENT_REMINDER.to_string(),
            subject: "Again".to_string(),
            body: "Body".to_string(),
            description: None,
        })
        .expect_err("duplicate key");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn reminders_go_to_each_tenant_with_an_email() {
    let seeded = Seeded::new();
    let roommate = TenantService::new(Arc::clone(&seeded.store))
        .create_tenant(crate::fixtures::tenant_draft("Hugo", None))
        .expect("tenant");
    let mut draft =
        crate::fixtures::lease_draft(seeded.property_id, seeded.tenant_id, date(2025, 1, 1));
    draft.tenant_ids.push(roommate.id);
    let lease = seeded.leases().create_lease(draft).expect("lease");
    BillingService::new(Arc::clone(&seeded.store))
        .generate_rents(lease.id, date(2025, 2, 28), date(2025, 1, 1))
        .expect("generates");

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(&seeded, Arc::clone(&dispatcher));
    service.create_config(config_draft("main")).expect("config");
    service.ensure_default_templates().expect("templates");

    let report = service
        .send_rent_reminders(date(2025, 1, 20))
        .expect("sends");
    assert_eq!(report.rents, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(report.without_email, 1);

    let sent = dispatcher.sent();
    assert_eq!(sent[0].to, "lucie.martin@example.fr");
    assert_eq!(sent[0].subject, "Rent reminder for Lilas T2");
    assert!(sent[0].body.contains("992.00 remains outstanding"));
}

#[test]
fn delivery_failures_are_counted() {
    let seeded = Seeded::new();
    let lease = seeded.lease_from(date(2025, 1, 1));
    BillingService::new(Arc::clone(&seeded.store))
        .generate_rents(lease.id, date(2025, 1, 31), date(2025, 1, 1))
        .expect("generates");
    let dispatcher = Arc::new(RecordingDispatcher {
        fail_for: Some("lucie.martin@example.fr".to_string()),
        ..RecordingDispatcher::default()
    });
    let service = service(&seeded, dispatcher);
    service.create_config(config_draft("main")).expect("config");
    service.ensure_default_templates().expect("templates");

    let report = service
        .send_rent_reminders(date(2025, 2, 1))
        .expect("runs");
    assert_eq!((report.sent, report.failed), (0, 1));
}

#[test]
fn reminders_need_a_default_config() {
    let seeded = Seeded::new();
    let lease = seeded.lease_from(date(2025, 1, 1));
    BillingService::new(Arc::clone(&seeded.store))
        .generate_rents(lease.id, date(2025, 1, 31), date(2025, 1, 1))
        .expect("generates");
    let service = service(&seeded, Arc::default());
    service.ensure_default_templates().expect("templates");

    let err = service
        .send_rent_reminders(date(2025, 2, 1))
        .expect_err("no config");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn receipt_requires_a_paid_rent() {
    let seeded = Seeded::new();
    let lease = seeded.lease_from(date(2025, 1, 1));
    let billing = BillingService::new(Arc::clone(&seeded.store));
    billing
        .generate_rents(lease.id, date(2025, 1, 31), date(2025, 1, 1))
        .expect("generates");
    let rent = billing
        .list_rents(RentFilter::default(), date(2025, 1, 1))
        .expect("lists")
        .remove(0);

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = service(&seeded, Arc::clone(&dispatcher));
    service.create_config(config_draft("main")).expect("config");
    service.ensure_default_templates().expect("templates");

    let err = service
        .send_receipt(rent.rent.id, date(2025, 1, 2))
        .expect_err("unpaid");
    assert!(matches!(err, ServiceError::Conflict(_)));

    billing
        .record_payment(
            rent.rent.id,
            PaymentDraft {
                amount: Money::from_units(992),
                paid_on: date(2025, 1, 3),
                method: PaymentMethod::Transfer,
                reference: Some("VIR-0125".to_string()),
            },
            date(2025, 1, 3),
        )
        .expect("pays");
    let report = service
        .send_receipt(rent.rent.id, date(2025, 1, 3))
        .expect("sends");
    assert_eq!(report.sent, 1);
    assert!(dispatcher.sent()[0].body.contains("receipt of 992.00"));
}
