//! One-shot jobs run against a JSON data file.

use crate::infra::OutboxDispatcher;
use chrono::NaiveDate;
use clap::Args;
use rentroll::billing::{BillingService, RentFilter, RentStatus};
use rentroll::config::{AppConfig, ConfigError};
use rentroll::dates;
use rentroll::error::AppError;
use rentroll::mail::MailService;
use rentroll::reports::ReportService;
use rentroll::store::{JsonFileStore, LeaseId};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct BillingGenerateArgs {
    /// Bill periods starting on or before this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = dates::parse_date)]
    pub(crate) through: Option<NaiveDate>,
    /// JSON data file. Falls back to RENTROLL_DATA_PATH.
    #[arg(long)]
    pub(crate) data_path: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RentExportArgs {
    /// JSON data file. Falls back to RENTROLL_DATA_PATH.
    #[arg(long)]
    pub(crate) data_path: Option<PathBuf>,
    /// Write the CSV here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Only rents of this lease
    #[arg(long)]
    pub(crate) lease_id: Option<u64>,
    /// Only rents in this status (pending, partial, paid, overdue)
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<RentStatus>,
    /// Periods starting on or after this date
    #[arg(long, value_parser = dates::parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Periods starting on or before this date
    #[arg(long, value_parser = dates::parse_date)]
    pub(crate) to: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct MailRemindArgs {
    /// Reference date for overdue detection (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = dates::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// JSON data file. Falls back to RENTROLL_DATA_PATH.
    #[arg(long)]
    pub(crate) data_path: Option<PathBuf>,
}

pub(crate) fn run_billing_generate(args: BillingGenerateArgs) -> Result<(), AppError> {
    let store = open_store(args.data_path)?;
    let today = dates::today();
    let through = args.through.unwrap_or(today);

    let reports = BillingService::new(store).generate_all(through, today)?;
    let created: usize = reports.iter().map(|report| report.created.len()).sum();

    println!("Billing run through {through}");
    for report in &reports {
        println!(
            "  lease {}: {} created, {} already billed{}",
            report.lease_id,
            report.created.len(),
            report.skipped,
            if report.truncated { " (truncated)" } else { "" }
        );
    }
    println!("{created} rent(s) created across {} lease(s)", reports.len());
    Ok(())
}

pub(crate) fn run_rent_export(args: RentExportArgs) -> Result<(), AppError> {
    let RentExportArgs {
        data_path,
        output,
        lease_id,
        status,
        from,
        to,
    } = args;
    let store = open_store(data_path)?;
    let filter = RentFilter {
        lease_id: lease_id.map(LeaseId::from),
        status,
        from,
        to,
    };

    let bytes = ReportService::new(store).export_rents_csv(filter, dates::today())?;
    match output {
        Some(path) => {
            std::fs::write(&path, &bytes)?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => print!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

pub(crate) fn run_mail_reminders(args: MailRemindArgs) -> Result<(), AppError> {
    let store = open_store(args.data_path)?;
    let today = args.today.unwrap_or_else(dates::today);
    let outbox = Arc::new(OutboxDispatcher::default());

    let service = MailService::new(store, outbox.clone());
    service.ensure_default_templates()?;
    let report = service.send_rent_reminders(today)?;

    println!("Rent reminders as of {today}");
    println!(
        "  {} overdue rent(s): {} sent, {} failed, {} tenant(s) without email",
        report.rents, report.sent, report.failed, report.without_email
    );
    for mail in outbox.messages() {
        println!("  -> {} | {}", mail.to, mail.subject);
    }
    Ok(())
}

fn open_store(data_path: Option<PathBuf>) -> Result<Arc<JsonFileStore>, AppError> {
    let path = match data_path {
        Some(path) => path,
        None => AppConfig::load()?
            .storage
            .data_path
            .ok_or(ConfigError::MissingDataPath)?,
    };
    Ok(Arc::new(JsonFileStore::open(path)?))
}

fn parse_status(raw: &str) -> Result<RentStatus, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_ascii_lowercase()))
        .map_err(|_| format!("unknown rent status '{raw}'"))
}
