use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{Payment, PaymentDraft, Rent, RentDraft, RentUpdate, RentView};
use super::periods::plan_rents;
use super::status::RentStatus;
use crate::money::Money;
use crate::store::{LeaseId, PaymentId, RentId, Store, Tables};
use crate::ServiceError;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RentFilter {
    #[serde(default)]
    pub lease_id: Option<LeaseId>,
    #[serde(default)]
    pub status: Option<RentStatus>,
    /// Keeps rents whose period starts on or after this date.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Keeps rents whose period starts on or before this date.
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl RentFilter {
    pub(crate) fn matches(&self, rent: &Rent, today: NaiveDate) -> bool {
        self.lease_id.map_or(true, |id| rent.lease_id == id)
            && self
                .status
                .map_or(true, |status| rent.status_on(today) == status)
            && self.from.map_or(true, |from| rent.period_start >= from)
            && self.to.map_or(true, |to| rent.period_start <= to)
    }
}

/// Outcome of billing one lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub lease_id: LeaseId,
    pub created: Vec<RentId>,
    pub skipped: usize,
    /// Set when the per-run cap stopped generation early.
    pub truncated: bool,
}

/// Payment together with the rent it settled.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub rent: RentView,
}

/// Rents and payments.
pub struct BillingService<S> {
    store: Arc<S>,
}

impl<S> BillingService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Bills every unbilled period of the lease starting on or before `through`.
    /// Running it twice creates nothing new.
    pub fn generate_rents(
        &self,
        lease_id: LeaseId,
        through: NaiveDate,
        today: NaiveDate,
    ) -> Result<GenerationReport, ServiceError> {
        let report = self
            .store
            .write(|tables| generate_for_lease(tables, lease_id, through, today))?;
        log_report(&report);
        Ok(report)
    }

    /// Bills every lease in one transaction. Terminated leases stop at their
    /// end date, so the months of a notice period are still billed.
    pub fn generate_all(
        &self,
        through: NaiveDate,
        today: NaiveDate,
    ) -> Result<Vec<GenerationReport>, ServiceError> {
        let reports = self.store.write(|tables| {
            let lease_ids: Vec<LeaseId> = tables.leases.iter().map(|lease| lease.id).collect();
            lease_ids
                .into_iter()
                .map(|lease_id| generate_for_lease(tables, lease_id, through, today))
                .collect::<Result<Vec<_>, ServiceError>>()
        })?;
        let created: usize = reports.iter().map(|report| report.created.len()).sum();
        info!(leases = reports.len(), created, %through, "billing run complete");
        for report in reports.iter().filter(|report| report.truncated) {
            warn!(lease_id = %report.lease_id, "billing run truncated; rerun to continue");
        }
        Ok(reports)
    }

    pub fn get_rent(&self, id: RentId, today: NaiveDate) -> Result<RentView, ServiceError> {
        let view = self
            .store
            .read(|tables| tables.rents.require(id).map(|rent| rent.view(today)))??;
        Ok(view)
    }

    pub fn list_rents(
        &self,
        filter: RentFilter,
        today: NaiveDate,
    ) -> Result<Vec<RentView>, ServiceError> {
        let mut rents: Vec<RentView> = self.store.read(|tables| {
            tables
                .rents
                .iter()
                .filter(|rent| filter.matches(rent, today))
                .map(|rent| rent.view(today))
                .collect()
        })?;
        rents.sort_by(|a, b| {
            (a.rent.period_start, a.rent.lease_id).cmp(&(b.rent.period_start, b.rent.lease_id))
        });
        Ok(rents)
    }

    /// Bills a period by hand. One rent per lease and period start.
    pub fn create_rent(
        &self,
        draft: RentDraft,
        today: NaiveDate,
    ) -> Result<RentView, ServiceError> {
        draft.validate()?;
        let rent = self.store.write(|tables| {
            tables.leases.require(draft.lease_id)?;
            if tables.rents.iter().any(|rent| {
                rent.lease_id == draft.lease_id && rent.period_start == draft.period_start
            }) {
                return Err(ServiceError::conflict(format!(
                    "lease {} already has a rent for the period starting {}",
                    draft.lease_id, draft.period_start
                )));
            }
            let id = tables.rents.allocate_id();
            let mut rent = Rent {
                id,
                lease_id: draft.lease_id,
                period_start: draft.period_start,
                period_end: draft.period_end,
                due_date: draft.due_date,
                rent_amount: draft.rent_amount,
                charges_amount: draft.charges_amount,
                extra_charges: draft.extra_charges,
                amount_paid: Money::ZERO,
                status: RentStatus::Pending,
                notes: draft.notes,
            };
            rent.refresh_status(today);
            Ok(tables.rents.insert(rent))
        })?;
        info!(rent_id = %rent.id, lease_id = %rent.lease_id, "rent created");
        Ok(rent.view(today))
    }

    /// Adjusts amounts and due date. The new amount due may not fall below
    /// what has already been paid.
    pub fn update_rent(
        &self,
        id: RentId,
        update: RentUpdate,
        today: NaiveDate,
    ) -> Result<RentView, ServiceError> {
        update.validate()?;
        let rent = self.store.write(|tables| {
            let rent = tables.rents.require_mut(id)?;
            rent.due_date = update.due_date;
            rent.rent_amount = update.rent_amount;
            rent.charges_amount = update.charges_amount;
            rent.extra_charges = update.extra_charges;
            rent.notes = update.notes;
            if rent.amount_paid > rent.amount_due() {
                return Err(ServiceError::conflict(format!(
                    "rent {id} already has {} paid, more than the new amount due {}",
                    rent.amount_paid,
                    rent.amount_due()
                )));
            }
            rent.refresh_status(today);
            Ok(rent.clone())
        })?;
        Ok(rent.view(today))
    }

    pub fn delete_rent(&self, id: RentId) -> Result<(), ServiceError> {
        self.store.write(|tables| {
            tables.rents.require(id)?;
            if tables.payments.iter().any(|payment| payment.rent_id == id) {
                return Err(ServiceError::conflict(format!(
                    "rent {id} has recorded payments"
                )));
            }
            tables.rents.remove(id)?;
            Ok(())
        })?;
        info!(rent_id = %id, "rent deleted");
        Ok(())
    }

    pub fn list_payments(&self, rent_id: RentId) -> Result<Vec<Payment>, ServiceError> {
        let payments = self.store.read(|tables| {
            tables.rents.require(rent_id).map(|_| {
                let mut payments: Vec<Payment> = tables
                    .payments
                    .iter()
                    .filter(|payment| payment.rent_id == rent_id)
                    .cloned()
                    .collect();
                payments.sort_by_key(|payment| (payment.details.paid_on, payment.id));
                payments
            })
        })??;
        Ok(payments)
    }

    /// Records a payment and settles the rent in the same transaction.
    pub fn record_payment(
        &self,
        rent_id: RentId,
        draft: PaymentDraft,
        today: NaiveDate,
    ) -> Result<PaymentReceipt, ServiceError> {
        draft.validate()?;
        let receipt = self.store.write(|tables| {
            tables.rents.require(rent_id)?;
            let id = tables.payments.allocate_id();
            let payment = tables.payments.insert(Payment {
                id,
                rent_id,
                details: draft,
            });
            let rent = settle(tables, rent_id, today)?;
            Ok::<_, ServiceError>(PaymentReceipt {
                payment,
                rent: rent.view(today),
            })
        })?;
        info!(
            payment_id = %receipt.payment.id,
            rent_id = %rent_id,
            amount = %receipt.payment.details.amount,
            status = receipt.rent.status_label,
            "payment recorded"
        );
        Ok(receipt)
    }

    pub fn update_payment(
        &self,
        id: PaymentId,
        draft: PaymentDraft,
        today: NaiveDate,
    ) -> Result<PaymentReceipt, ServiceError> {
        draft.validate()?;
        self.store.write(|tables| {
            let payment = tables.payments.require_mut(id)?;
            payment.details = draft;
            let payment = payment.clone();
            let rent = settle(tables, payment.rent_id, today)?;
            Ok(PaymentReceipt {
                payment,
                rent: rent.view(today),
            })
        })
    }

    /// Removes a payment and returns the re-settled rent.
    pub fn delete_payment(
        &self,
        id: PaymentId,
        today: NaiveDate,
    ) -> Result<RentView, ServiceError> {
        let rent = self.store.write(|tables| {
            let payment = tables.payments.remove(id)?;
            settle(tables, payment.rent_id, today)
        })?;
        info!(payment_id = %id, rent_id = %rent.id, "payment deleted");
        Ok(rent.view(today))
    }
}

/// Rewrites `amount_paid` and status from the rent's payments.
fn settle(tables: &mut Tables, rent_id: RentId, today: NaiveDate) -> Result<Rent, ServiceError> {
    let paid: Money = tables
        .payments
        .iter()
        .filter(|payment| payment.rent_id == rent_id)
        .map(|payment| payment.details.amount)
        .sum();
    let rent = tables.rents.require_mut(rent_id)?;
    let due = rent.amount_due();
    if paid > due {
        return Err(ServiceError::conflict(format!(
            "payments of {paid} would exceed the {due} due on rent {rent_id}"
        )));
    }
    rent.amount_paid = paid;
    rent.refresh_status(today);
    debug!(rent_id = %rent_id, %paid, %due, status = rent.status.label(), "rent settled");
    Ok(rent.clone())
}

fn generate_for_lease(
    tables: &mut Tables,
    lease_id: LeaseId,
    through: NaiveDate,
    today: NaiveDate,
) -> Result<GenerationReport, ServiceError> {
    let lease = tables.leases.require(lease_id)?.clone();
    let billed: BTreeSet<NaiveDate> = tables
        .rents
        .iter()
        .filter(|rent| rent.lease_id == lease_id)
        .map(|rent| rent.period_start)
        .collect();
    let outcome = plan_rents(&lease, tables.charges.iter(), &billed, through)?;

    let mut created = Vec::with_capacity(outcome.plans.len());
    for plan in outcome.plans {
        let id = tables.rents.allocate_id();
        let mut rent = Rent {
            id,
            lease_id,
            period_start: plan.period.start,
            period_end: plan.period.end,
            due_date: plan.period.due_date,
            rent_amount: plan.rent_amount,
            charges_amount: plan.charges_amount,
            extra_charges: plan.extra_charges,
            amount_paid: Money::ZERO,
            status: RentStatus::Pending,
            notes: plan.period.is_prorated().then(|| {
                format!(
                    "prorated {}/{} days",
                    plan.period.occupied_days, plan.period.period_days
                )
            }),
        };
        rent.refresh_status(today);
        tables.rents.insert(rent);
        created.push(id);
    }

    Ok(GenerationReport {
        lease_id,
        created,
        skipped: outcome.skipped,
        truncated: outcome.truncated,
    })
}

fn log_report(report: &GenerationReport) {
    info!(
        lease_id = %report.lease_id,
        created = report.created.len(),
        skipped = report.skipped,
        truncated = report.truncated,
        "rents generated"
    );
}
