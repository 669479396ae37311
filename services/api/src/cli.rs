use crate::commands::{
    run_billing_generate, run_mail_reminders, run_rent_export, BillingGenerateArgs,
    MailRemindArgs, RentExportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rentroll::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rentroll",
    about = "Run the rental management service or its maintenance jobs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rent generation jobs
    Billing {
        #[command(subcommand)]
        command: BillingCommand,
    },
    /// Rent exports
    Rents {
        #[command(subcommand)]
        command: RentsCommand,
    },
    /// Mail composition jobs
    Mail {
        #[command(subcommand)]
        command: MailCommand,
    },
}

#[derive(Subcommand, Debug)]
enum BillingCommand {
    /// Bill every lease up to a date
    Generate(BillingGenerateArgs),
}

#[derive(Subcommand, Debug)]
enum RentsCommand {
    /// Write rents as CSV
    Export(RentExportArgs),
}

#[derive(Subcommand, Debug)]
enum MailCommand {
    /// Send reminders for every unpaid rent past due
    Remind(MailRemindArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Persist data to this JSON file instead of keeping it in memory
    #[arg(long)]
    pub(crate) data_path: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Billing {
            command: BillingCommand::Generate(args),
        } => run_billing_generate(args),
        Command::Rents {
            command: RentsCommand::Export(args),
        } => run_rent_export(args),
        Command::Mail {
            command: MailCommand::Remind(args),
        } => run_mail_reminders(args),
    }
}
