use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use loantrack::application::tracker::LoanTracker;
use loantrack::config::Settings;
use loantrack::domain::book::StatusFilter;
use loantrack::domain::loan::{LoanId, NewLoan};
use loantrack::domain::ports::{LoanStoreBox, PreferenceStoreBox};
use loantrack::domain::schedule::{Cadence, InterestModel, LoanTerms};
use loantrack::infrastructure::json_file::JsonFileStore;
#[cfg(feature = "storage-rocksdb")]
use loantrack::infrastructure::rocksdb::RocksDBStore;
use loantrack::interfaces::csv::loan_writer::LoanWriter;
use loantrack::interfaces::csv::schedule_writer::ScheduleWriter;
use loantrack::interfaces::display::{Currency, render_stats};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Track loans, schedules and payments", long_about = None)]
struct Cli {
    /// JSON file holding loans and preferences (overrides the configured data file)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Path to a RocksDB database. If provided, it is used instead of the JSON file.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Currency used when printing amounts (usd or php)
    #[arg(long, global = true)]
    currency: Option<Currency>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a loan and print its id
    Add {
        #[arg(long)]
        name: String,
        /// Amount borrowed
        #[arg(long)]
        principal: Decimal,
        /// Interest rate in percent
        #[arg(long)]
        rate: Decimal,
        /// Number of installments
        #[arg(long)]
        term: u32,
        /// First day of the loan (YYYY-MM-DD); installments start one period later
        #[arg(long)]
        start: NaiveDate,
        /// flat or amortizing
        #[arg(long)]
        model: Option<InterestModel>,
        /// weekly or monthly
        #[arg(long)]
        cadence: Option<Cadence>,
    },
    /// Record a payment against a loan
    Pay {
        id: LoanId,
        #[arg(long)]
        amount: Decimal,
        /// Payment date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a loan
    Delete { id: LoanId },
    /// List loans as CSV
    List {
        /// Case-insensitive substring of the loan name
        #[arg(long, default_value = "")]
        search: String,
        /// all, active or paid
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Print a loan's amortization schedule as CSV
    Schedule { id: LoanId },
    /// Print totals and the next payment due
    Stats {
        /// Reference date for the upcoming payment (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Show or set the dark-mode preference
    Theme { mode: Option<ThemeMode> },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeMode {
    Dark,
    Light,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_stores(cli: &Cli, settings: &Settings) -> Result<(LoanStoreBox, PreferenceStoreBox)> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok((Box::new(store.clone()), Box::new(store)));
    }

    let path = cli
        .data_file
        .clone()
        .unwrap_or_else(|| settings.data_file.clone());
    let store = JsonFileStore::open(path);
    Ok((Box::new(store.clone()), Box::new(store)))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().into_diagnostic()?;
    init_tracing(&settings.log_level);

    let currency = cli.currency.unwrap_or(settings.currency);
    let (loan_store, preferences) = open_stores(&cli, &settings)?;
    let mut tracker = LoanTracker::open(loan_store, preferences)
        .await
        .into_diagnostic()?;

    match cli.command {
        Command::Add {
            name,
            principal,
            rate,
            term,
            start,
            model,
            cadence,
        } => {
            let new_loan = NewLoan {
                name,
                terms: LoanTerms {
                    principal,
                    rate_percent: rate,
                    periods: term,
                    start_date: start,
                    model: model.unwrap_or(settings.default_model),
                    cadence: cadence.unwrap_or(settings.default_cadence),
                },
            };
            let loan = tracker.add_loan(new_loan).await.into_diagnostic()?;
            println!("{}", loan.id);
        }
        Command::Pay {
            id,
            amount,
            date,
            note,
        } => {
            let outcome = tracker
                .make_payment(id, amount, date.unwrap_or_else(today), note)
                .await
                .into_diagnostic()?;
            println!(
                "Remaining balance: {} ({})",
                currency.format(outcome.remaining_balance.value()),
                outcome.status
            );
            if !outcome.absorbed.is_zero() {
                println!(
                    "Overpayment not credited: {}",
                    currency.format(outcome.absorbed.value())
                );
            }
        }
        Command::Delete { id } => {
            let removed = tracker.delete_loan(id).await.into_diagnostic()?;
            println!("Deleted {}", removed.name);
        }
        Command::List { search, status } => {
            let stdout = io::stdout();
            let mut writer = LoanWriter::new(stdout.lock());
            writer
                .write_loans(tracker.loans(&search, status))
                .into_diagnostic()?;
        }
        Command::Schedule { id } => {
            let loan = tracker.loan(id).into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = ScheduleWriter::new(stdout.lock());
            writer
                .write_schedule(&loan.payment_schedule)
                .into_diagnostic()?;
        }
        Command::Stats { today: reference } => {
            let stats = tracker.stats(reference.unwrap_or_else(today));
            print!("{}", render_stats(&stats, currency));
        }
        Command::Theme { mode } => {
            if let Some(mode) = mode {
                tracker
                    .set_dark_mode(matches!(mode, ThemeMode::Dark))
                    .await
                    .into_diagnostic()?;
            }
            let dark = tracker.dark_mode().await.into_diagnostic()?;
            println!("{}", if dark { "dark" } else { "light" });
        }
    }

    Ok(())
}
