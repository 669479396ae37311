use chrono::{Datelike, Local, Months, NaiveDate};
use serde::Deserialize;

/// Local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Adds whole months, clamping to the last day of the target month.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    match add_months(first, 1) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Date in the same month as `date` on `day`, clamped to the month length.
pub fn day_of_month(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(date));
    date.with_day(day).unwrap_or(date)
}

/// Inclusive day count of `[start, end]`, zero when the range is empty.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn month_helpers_handle_leap_years() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2025, 2, 10)), 28);
        assert_eq!(day_of_month(date(2025, 2, 1), 31), date(2025, 2, 28));
        assert_eq!(add_months(date(2025, 1, 31), 1), Some(date(2025, 2, 28)));
    }

    #[test]
    fn parse_date_reports_input() {
        assert_eq!(parse_date(" 2025-03-01 "), Ok(date(2025, 3, 1)));
        let err = parse_date("03/01/2025").expect_err("rejects non-iso");
        assert!(err.contains("03/01/2025"));
    }

    #[test]
    fn inclusive_days_counts_both_ends() {
        assert_eq!(inclusive_days(date(2025, 3, 1), date(2025, 3, 31)), 31);
        assert_eq!(inclusive_days(date(2025, 3, 2), date(2025, 3, 1)), 0);
    }
}
