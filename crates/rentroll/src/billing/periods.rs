//! Billing periods and rent planning for a lease.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::domain::RentLine;
use crate::dates;
use crate::leases::{Charge, Lease};
use crate::money::Money;
use crate::ServiceError;

/// Upper bound on rents created by one generation run for one lease.
pub const MAX_PERIODS_PER_RUN: usize = 240;

/// Upper bound on periods walked, billed or not.
const MAX_PERIOD_SCAN: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub due_date: NaiveDate,
    /// Days of the period the lease actually covers.
    pub occupied_days: i64,
    pub period_days: i64,
}

impl BillingPeriod {
    pub fn is_prorated(&self) -> bool {
        self.occupied_days < self.period_days
    }

    fn prorate(&self, amount: Money) -> Money {
        amount.prorate(self.occupied_days, self.period_days)
    }
}

/// Periods of `lease` starting on or before `through`, in order.
///
/// Periods are month-aligned blocks of the lease frequency anchored on the
/// month of the lease start. The lease range clips the first and last block.
pub fn billing_periods(lease: &Lease, through: NaiveDate) -> Vec<BillingPeriod> {
    let terms = &lease.terms;
    let anchor = dates::first_of_month(terms.start_date);
    let step = terms.frequency.months();
    let mut periods = Vec::new();

    for k in 0..MAX_PERIOD_SCAN {
        let Some(start) = dates::add_months(anchor, k * step) else {
            break;
        };
        let Some(next) = dates::add_months(anchor, (k + 1) * step) else {
            break;
        };
        let end = next - Duration::days(1);
        if start > through || terms.end_date.map_or(false, |lease_end| start > lease_end) {
            break;
        }

        let occupied_start = start.max(terms.start_date);
        let occupied_end = terms.end_date.map_or(end, |lease_end| end.min(lease_end));
        let due_date = dates::day_of_month(start, u32::from(terms.payment_day)).max(occupied_start);

        periods.push(BillingPeriod {
            start,
            end,
            due_date,
            occupied_days: dates::inclusive_days(occupied_start, occupied_end),
            period_days: dates::inclusive_days(start, end),
        });
    }

    periods
}

/// Amounts for one rent about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentPlan {
    pub period: BillingPeriod,
    pub rent_amount: Money,
    pub charges_amount: Money,
    pub extra_charges: Vec<RentLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    pub plans: Vec<RentPlan>,
    pub skipped: usize,
    pub truncated: bool,
}

/// Plans the rents of `lease` not yet billed, up to `through`.
///
/// `billed` holds the period starts that already have a rent. Lease amounts
/// are monthly and scaled by the period length before proration. Fails when
/// a period total would exceed [`Money::MAX`].
pub fn plan_rents<'a, I>(
    lease: &Lease,
    charges: I,
    billed: &BTreeSet<NaiveDate>,
    through: NaiveDate,
) -> Result<PlanOutcome, ServiceError>
where
    I: IntoIterator<Item = &'a Charge>,
{
    let charges: Vec<&Charge> = charges
        .into_iter()
        .filter(|charge| charge.lease_id == lease.id)
        .collect();
    let months = i64::from(lease.terms.frequency.months());
    let mut outcome = PlanOutcome::default();

    for period in billing_periods(lease, through) {
        if billed.contains(&period.start) {
            outcome.skipped += 1;
            continue;
        }
        if outcome.plans.len() == MAX_PERIODS_PER_RUN {
            outcome.truncated = true;
            break;
        }

        let occupied_start = period.start.max(lease.terms.start_date);
        let occupied_end = lease
            .terms
            .end_date
            .map_or(period.end, |end| period.end.min(end));
        let mut extra_charges = Vec::new();
        for charge in &charges {
            let count = charge.occurrences(occupied_start, occupied_end).len() as i64;
            if count == 0 {
                continue;
            }
            extra_charges.push(RentLine {
                charge_id: Some(charge.id),
                label: charge.details.label.clone(),
                amount: scaled(lease, charge.details.amount, count)?,
            });
        }

        let plan = RentPlan {
            rent_amount: period.prorate(scaled(lease, lease.terms.rent_amount, months)?),
            charges_amount: period.prorate(scaled(lease, lease.terms.charges_amount, months)?),
            extra_charges,
            period,
        };
        let total = plan
            .extra_charges
            .iter()
            .try_fold(plan.rent_amount, |total, line| total.checked_add(line.amount))
            .and_then(|total| total.checked_add(plan.charges_amount));
        if total.map_or(true, |total| total > Money::MAX) {
            return Err(too_large(lease));
        }
        outcome.plans.push(plan);
    }

    Ok(outcome)
}

fn scaled(lease: &Lease, amount: Money, factor: i64) -> Result<Money, ServiceError> {
    amount
        .checked_mul(factor)
        .filter(|scaled| *scaled <= Money::MAX)
        .ok_or_else(|| too_large(lease))
}

fn too_large(lease: &Lease) -> ServiceError {
    ServiceError::validation(format!(
        "lease {} bills more than {} for one period",
        lease.id,
        Money::MAX
    ))
}
