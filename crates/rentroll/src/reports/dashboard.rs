use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::billing::RentStatus;
use crate::money::Money;
use crate::portfolio::PropertyView;
use crate::store::Tables;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub properties: usize,
    pub occupied_properties: usize,
    /// Share of occupied properties, 0 to 100.
    pub occupancy_rate: f64,
    pub active_leases: usize,
    pub tenants: usize,
    /// Amount due on rents falling due this month.
    pub expected_this_month: Money,
    /// Amount already paid on those rents.
    pub collected_this_month: Money,
    pub overdue_rents: usize,
    pub overdue_outstanding: Money,
}

impl Dashboard {
    pub(crate) fn compute(tables: &Tables, today: NaiveDate) -> Self {
        let properties = tables.properties.len();
        let occupied_properties = tables
            .properties
            .iter()
            .filter(|property| {
                PropertyView::build((*property).clone(), tables.leases.iter(), today).occupied
            })
            .count();
        let occupancy_rate = if properties == 0 {
            0.0
        } else {
            (occupied_properties as f64 * 1000.0 / properties as f64).round() / 10.0
        };

        let this_month =
            |date: NaiveDate| date.year() == today.year() && date.month() == today.month();
        let (expected_this_month, collected_this_month) = tables
            .rents
            .iter()
            .filter(|rent| this_month(rent.due_date))
            .fold((Money::ZERO, Money::ZERO), |(due, paid), rent| {
                (due + rent.amount_due(), paid + rent.amount_paid)
            });

        let overdue: Vec<_> = tables
            .rents
            .iter()
            .filter(|rent| rent.status_on(today) == RentStatus::Overdue)
            .collect();

        Self {
            as_of: today,
            properties,
            occupied_properties,
            occupancy_rate,
            active_leases: tables.leases.iter().filter(|lease| lease.covers(today)).count(),
            tenants: tables.tenants.len(),
            expected_this_month,
            collected_this_month,
            overdue_rents: overdue.len(),
            overdue_outstanding: overdue.iter().map(|rent| rent.outstanding()).sum(),
        }
    }
}
