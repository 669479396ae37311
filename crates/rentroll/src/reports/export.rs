use chrono::NaiveDate;
use serde::Serialize;

use crate::billing::{Rent, RentFilter};
use crate::money::Money;
use crate::store::{LeaseId, PropertyId, RentId, Tables};
use crate::ServiceError;

/// One CSV line of the rent export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentExportRow {
    pub rent_id: RentId,
    pub lease_id: LeaseId,
    pub property_id: PropertyId,
    pub property: String,
    pub tenants: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub rent_amount: Money,
    pub charges_amount: Money,
    pub extra_charges: Money,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub outstanding: Money,
    pub status: &'static str,
}

impl RentExportRow {
    fn build(tables: &Tables, rent: &Rent, today: NaiveDate) -> Option<Self> {
        let lease = tables.leases.get(rent.lease_id)?;
        let property = tables.properties.get(lease.terms.property_id)?;
        let tenants = lease
            .terms
            .tenant_ids
            .iter()
            .filter_map(|id| tables.tenants.get(*id))
            .map(|tenant| tenant.full_name())
            .collect::<Vec<_>>()
            .join("; ");
        Some(Self {
            rent_id: rent.id,
            lease_id: lease.id,
            property_id: property.id,
            property: property.details.name.clone(),
            tenants,
            period_start: rent.period_start,
            period_end: rent.period_end,
            due_date: rent.due_date,
            rent_amount: rent.rent_amount,
            charges_amount: rent.charges_amount,
            extra_charges: rent.extra_charges.iter().map(|line| line.amount).sum(),
            amount_due: rent.amount_due(),
            amount_paid: rent.amount_paid,
            outstanding: rent.outstanding(),
            status: rent.status_on(today).label(),
        })
    }
}

pub(crate) fn export_rows(
    tables: &Tables,
    filter: &RentFilter,
    today: NaiveDate,
) -> Vec<RentExportRow> {
    let mut rows: Vec<RentExportRow> = tables
        .rents
        .iter()
        .filter(|rent| filter.matches(rent, today))
        .filter_map(|rent| RentExportRow::build(tables, rent, today))
        .collect();
    rows.sort_by(|a, b| (a.period_start, a.rent_id).cmp(&(b.period_start, b.rent_id)));
    rows
}

/// Serializes rows as CSV with a header line. Amounts are written in cents.
pub(crate) fn write_csv(rows: &[RentExportRow]) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| ServiceError::Export(csv::Error::from(err.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RentExportRow {
        let date = |m, d| NaiveDate::from_ymd_opt(2025, m, d).expect("valid date");
        RentExportRow {
            rent_id: RentId(3),
            lease_id: LeaseId(1),
            property_id: PropertyId(2),
            property: "Lilas, T2".to_string(),
            tenants: "Lucie Martin; Hugo Martin".to_string(),
            period_start: date(3, 1),
            period_end: date(3, 31),
            due_date: date(3, 5),
            rent_amount: Money::from_units(930),
            charges_amount: Money::from_units(62),
            extra_charges: Money::ZERO,
            amount_due: Money::from_units(992),
            amount_paid: Money::from_units(500),
            outstanding: Money::from_units(492),
            status: "Partially paid",
        }
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let bytes = write_csv(&[row()]).expect("writes");
        let text = String::from_utf8(bytes).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "rent_id,lease_id,property_id,property,tenants,period_start,period_end,due_date,\
                 rent_amount,charges_amount,extra_charges,amount_due,amount_paid,outstanding,status"
            )
        );
        assert_eq!(
            lines.next(),
            Some(
                "3,1,2,\"Lilas, T2\",Lucie Martin; Hugo Martin,2025-03-01,2025-03-31,2025-03-05,\
                 93000,6200,0,99200,50000,49200,Partially paid"
            )
        );
    }
}
