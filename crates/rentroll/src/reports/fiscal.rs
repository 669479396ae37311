//! Annual rental-income summary for the French property-income declaration.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::money::Money;
use crate::store::{PropertyId, Tables};

/// Gross rent ceiling of the micro-foncier regime.
pub const MICRO_FONCIER_CEILING: Money = Money::from_units(15_000);

/// Flat abatement of the micro-foncier regime, in percent.
const MICRO_FONCIER_ABATEMENT: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalRegime {
    MicroFoncier,
    Reel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyIncome {
    pub property_id: PropertyId,
    pub property_name: String,
    /// Rent share of the payments received in the year.
    pub gross_rent: Money,
    /// Charges share of those payments, recovered from tenants.
    pub charges_collected: Money,
    pub payments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiscalSummary {
    pub year: i32,
    pub properties: Vec<PropertyIncome>,
    pub gross_rent: Money,
    pub charges_collected: Money,
    pub regime: FiscalRegime,
    pub abatement: Money,
    pub taxable_income: Money,
}

impl FiscalSummary {
    pub(crate) fn compute(tables: &Tables, year: i32) -> Self {
        let mut per_property: BTreeMap<PropertyId, PropertyIncome> = BTreeMap::new();

        for payment in tables
            .payments
            .iter()
            .filter(|payment| payment.details.paid_on.year() == year)
        {
            let Some(rent) = tables.rents.get(payment.rent_id) else {
                continue;
            };
            let Some(lease) = tables.leases.get(rent.lease_id) else {
                continue;
            };
            let property_id = lease.terms.property_id;
            let amount = payment.details.amount;
            let rent_share = amount.prorate(rent.rent_amount.cents(), rent.amount_due().cents());

            let entry = per_property.entry(property_id).or_insert_with(|| PropertyIncome {
                property_id,
                property_name: tables
                    .properties
                    .get(property_id)
                    .map(|property| property.details.name.clone())
                    .unwrap_or_default(),
                gross_rent: Money::ZERO,
                charges_collected: Money::ZERO,
                payments: 0,
            });
            entry.gross_rent += rent_share;
            entry.charges_collected += amount - rent_share;
            entry.payments += 1;
        }

        let properties: Vec<PropertyIncome> = per_property.into_values().collect();
        let gross_rent: Money = properties.iter().map(|income| income.gross_rent).sum();
        let charges_collected: Money = properties
            .iter()
            .map(|income| income.charges_collected)
            .sum();
        let (regime, abatement) = regime_for(gross_rent);

        Self {
            year,
            properties,
            gross_rent,
            charges_collected,
            regime,
            abatement,
            taxable_income: gross_rent - abatement,
        }
    }
}

/// Regime and abatement applicable to `gross_rent`.
pub fn regime_for(gross_rent: Money) -> (FiscalRegime, Money) {
    if gross_rent <= MICRO_FONCIER_CEILING {
        (
            FiscalRegime::MicroFoncier,
            gross_rent.percent(MICRO_FONCIER_ABATEMENT),
        )
    } else {
        (FiscalRegime::Reel, Money::ZERO)
    }
}
