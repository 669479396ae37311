use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rentroll::billing::{BillingService, PaymentDraft, PaymentMethod, RentFilter, RentStatus};
use rentroll::documents::{DocumentDraft, DocumentKind, DocumentService, DocumentTarget};
use rentroll::leases::{BillingFrequency, LeaseDraft, LeaseService};
use rentroll::mail::{
    EmailConfigDraft, MailDispatcher, MailError, MailService, OutgoingMail,
};
use rentroll::portfolio::{
    Address, OwnerDraft, OwnerKind, PortfolioService, PropertyDraft, PropertyKind,
};
use rentroll::reports::ReportService;
use rentroll::store::{JsonFileStore, LeaseId, PropertyId, Store, TenantId};
use rentroll::tenants::{TenantDraft, TenantService};
use rentroll::Money;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn address() -> Address {
    Address {
        line1: "4 quai Saint-Vincent".to_string(),
        line2: None,
        postal_code: "69001".to_string(),
        city: "Lyon".to_string(),
        country: "FR".to_string(),
    }
}

struct Fixture {
    property_id: PropertyId,
    tenant_id: TenantId,
}

fn seed<S: Store + 'static>(store: &Arc<S>) -> Fixture {
    let portfolio = PortfolioService::new(Arc::clone(store));
    let owner = portfolio
        .create_owner(OwnerDraft {
            kind: OwnerKind::Individual,
            name: "Paul Girard".to_string(),
            email: Some("paul.girard@example.fr".to_string()),
            phone: None,
            address: Some(address()),
            registration_number: None,
        })
        .expect("owner created");
    let property = portfolio
        .create_property(PropertyDraft {
            owner_id: owner.id,
            name: "Quai T3".to_string(),
            kind: PropertyKind::Apartment,
            address: address(),
            surface_m2: 64.0,
            rooms: 3,
            reference_rent: Money::from_units(930),
            reference_charges: Money::from_units(62),
            description: None,
        })
        .expect("property created");
    let tenant = TenantService::new(Arc::clone(store))
        .create_tenant(TenantDraft {
            first_name: "Nora".to_string(),
            last_name: "Benali".to_string(),
            email: Some("nora.benali@example.fr".to_string()),
            phone: None,
            birth_date: None,
            notes: None,
        })
        .expect("tenant created");
    Fixture {
        property_id: property.id,
        tenant_id: tenant.id,
    }
}

fn sign_lease<S: Store + 'static>(store: &Arc<S>, fixture: &Fixture, start: NaiveDate) -> LeaseId {
    LeaseService::new(Arc::clone(store))
        .create_lease(LeaseDraft {
            property_id: fixture.property_id,
            tenant_ids: vec![fixture.tenant_id],
            start_date: start,
            end_date: None,
            rent_amount: Money::from_units(930),
            charges_amount: Money::from_units(62),
            deposit: Money::from_units(930),
            payment_day: 5,
            frequency: BillingFrequency::Monthly,
            notes: None,
        })
        .expect("lease created")
        .id
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MailDispatcher for Outbox {
    fn dispatch(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("poisoned".to_string()))?
            .push(mail.clone());
        Ok(())
    }
}

#[test]
fn json_store_survives_a_reopen_mid_lifecycle() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("rentroll.json");

    let (lease_id, first_rent) = {
        let store = Arc::new(JsonFileStore::open(&path).expect("store opens"));
        let fixture = seed(&store);
        let lease_id = sign_lease(&store, &fixture, date(2025, 1, 15));
        let report = BillingService::new(Arc::clone(&store))
            .generate_rents(lease_id, date(2025, 3, 31), date(2025, 1, 15))
            .expect("rents generated");
        assert_eq!(report.created.len(), 3);
        (lease_id, report.created[0])
    };

    let store = Arc::new(JsonFileStore::open(&path).expect("store reopens"));
    let billing = BillingService::new(Arc::clone(&store));

    let first = billing
        .get_rent(first_rent, date(2025, 1, 15))
        .expect("rent persisted");
    assert_eq!(first.rent.period_start, date(2025, 1, 1));
    assert_eq!(first.rent.due_date, date(2025, 1, 15));
    assert_eq!(first.rent.rent_amount, Money::from_units(510));
    assert_eq!(first.amount_due, Money::from_units(544));

    let again = billing
        .generate_rents(lease_id, date(2025, 3, 31), date(2025, 1, 15))
        .expect("generation reruns");
    assert!(again.created.is_empty());
    assert_eq!(again.skipped, 3);

    let receipt = billing
        .record_payment(
            first_rent,
            PaymentDraft {
                amount: Money::from_units(544),
                paid_on: date(2025, 1, 14),
                method: PaymentMethod::Transfer,
                reference: Some("VIR-0114".to_string()),
            },
            date(2025, 1, 20),
        )
        .expect("payment recorded");
    assert_eq!(receipt.rent.rent.status, RentStatus::Paid);
    assert!(receipt.rent.outstanding.is_zero());
    drop(billing);
    drop(store);

    let store = Arc::new(JsonFileStore::open(&path).expect("store reopens"));
    let payments = BillingService::new(Arc::clone(&store))
        .list_payments(first_rent)
        .expect("payments listed");
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].details.reference.as_deref(), Some("VIR-0114"));
}

#[test]
fn failed_transaction_leaves_the_file_untouched() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("rentroll.json");
    let store = Arc::new(JsonFileStore::open(&path).expect("store opens"));
    let fixture = seed(&store);
    let lease_id = sign_lease(&store, &fixture, date(2025, 2, 1));
    let billing = BillingService::new(Arc::clone(&store));
    let report = billing
        .generate_rents(lease_id, date(2025, 2, 28), date(2025, 2, 1))
        .expect("rents generated");
    let before = std::fs::read(&path).expect("snapshot written");

    let overpayment = billing.record_payment(
        report.created[0],
        PaymentDraft {
            amount: Money::from_units(2_000),
            paid_on: date(2025, 2, 5),
            method: PaymentMethod::Check,
            reference: None,
        },
        date(2025, 2, 5),
    );
    assert!(overpayment.is_err());
    assert_eq!(std::fs::read(&path).expect("snapshot readable"), before);
}

#[test]
fn overdue_rent_gets_a_reminder_then_a_receipt() {
    let store = Arc::new(rentroll::store::InMemoryStore::new());
    let fixture = seed(&store);
    let lease_id = sign_lease(&store, &fixture, date(2025, 4, 1));
    let billing = BillingService::new(Arc::clone(&store));
    let rent_id = billing
        .generate_rents(lease_id, date(2025, 4, 30), date(2025, 4, 1))
        .expect("rents generated")
        .created[0];

    let outbox = Arc::new(Outbox::default());
    let mail = MailService::new(Arc::clone(&store), outbox.clone());
    mail.ensure_default_templates().expect("templates installed");
    mail.create_config(EmailConfigDraft {
        name: "Gestion".to_string(),
        smtp_host: "smtp.example.fr".to_string(),
        smtp_port: 587,
        username: Some("gestion".to_string()),
        password: Some("s3cret".to_string()),
        from_address: "gestion@example.fr".to_string(),
        from_name: Some("Paul Girard".to_string()),
        use_tls: true,
        is_default: true,
    })
    .expect("config created");

    let report = mail
        .send_rent_reminders(date(2025, 4, 10))
        .expect("reminders sent");
    assert_eq!(report.rents, 1);
    assert_eq!(report.sent, 1);

    billing
        .record_payment(
            rent_id,
            PaymentDraft {
                amount: Money::from_units(992),
                paid_on: date(2025, 4, 11),
                method: PaymentMethod::Transfer,
                reference: None,
            },
            date(2025, 4, 11),
        )
        .expect("payment recorded");
    let report = mail
        .send_rent_reminders(date(2025, 4, 12))
        .expect("reminders sent");
    assert_eq!(report.rents, 0);

    mail.send_receipt(rent_id, date(2025, 4, 12))
        .expect("receipt sent");
    let sent = outbox.sent.lock().expect("outbox lock");
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|mail| mail.to == "nora.benali@example.fr"));
    assert!(sent[1].body.contains("992.00"));
}

#[test]
fn reports_follow_the_rent_ledger() {
    let store = Arc::new(rentroll::store::InMemoryStore::new());
    let fixture = seed(&store);
    let lease_id = sign_lease(&store, &fixture, date(2025, 1, 1));
    let billing = BillingService::new(Arc::clone(&store));
    let rents = billing
        .generate_rents(lease_id, date(2025, 3, 31), date(2025, 1, 1))
        .expect("rents generated")
        .created;
    billing
        .record_payment(
            rents[0],
            PaymentDraft {
                amount: Money::from_units(992),
                paid_on: date(2025, 1, 5),
                method: PaymentMethod::DirectDebit,
                reference: None,
            },
            date(2025, 1, 5),
        )
        .expect("payment recorded");

    let overdue = billing
        .list_rents(
            RentFilter {
                status: Some(RentStatus::Overdue),
                ..RentFilter::default()
            },
            date(2025, 3, 10),
        )
        .expect("rents listed");
    assert_eq!(overdue.len(), 2);

    let reports = ReportService::new(Arc::clone(&store));
    let dashboard = reports.dashboard(date(2025, 3, 10)).expect("dashboard");
    assert_eq!(dashboard.overdue_rents, 2);
    assert_eq!(dashboard.overdue_outstanding, Money::from_units(1_984));

    let fiscal = reports.fiscal_summary(2025).expect("fiscal summary");
    assert_eq!(fiscal.gross_rent, Money::from_units(930));
    assert_eq!(fiscal.charges_collected, Money::from_units(62));
}

#[test]
fn deleting_a_lease_removes_its_documents() {
    let store = Arc::new(rentroll::store::InMemoryStore::new());
    let fixture = seed(&store);
    let lease_id = sign_lease(&store, &fixture, date(2025, 5, 1));
    let documents = DocumentService::new(Arc::clone(&store));
    let contract = documents
        .create_document(
            DocumentDraft {
                target: DocumentTarget::Lease(lease_id),
                kind: DocumentKind::LeaseContract,
                title: "Bail signé".to_string(),
                file_name: "bail.pdf".to_string(),
                storage_key: "leases/1/bail.pdf".to_string(),
                size_bytes: 48_213,
                uploaded_on: None,
            },
            date(2025, 5, 1),
        )
        .expect("document created");
    assert_eq!(contract.content_type, "application/pdf");

    LeaseService::new(Arc::clone(&store))
        .delete_lease(lease_id)
        .expect("lease deleted");
    assert!(documents
        .list_documents(Some(DocumentTarget::Lease(lease_id)))
        .expect("documents listed")
        .is_empty());
}
