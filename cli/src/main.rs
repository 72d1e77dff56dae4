//! Admin command-line interface for the tubeledger store.
//!
//! Covers the startup and maintenance surface the desktop shell calls
//! programmatically: bringing the schema up to date, inspecting the
//! store, seeding demo data, and logical backup/restore.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use tubeledger_sqlite::{Store, seed_demo};

#[derive(Parser)]
#[command(name = "tubeledger", version, about = "Back-office store administration")]
struct Cli {
    /// Data directory holding the database file and artifact folders.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update the schema and run pending migrations.
    Init {
        /// Seed demo data when the store is empty.
        #[arg(long)]
        seed: bool,
    },
    /// Show schema version and row counts.
    Status,
    /// Run the migration pass only.
    Migrate,
    /// Seed demo data (no-op when customers exist).
    Seed,
    /// Export a logical snapshot of all tables.
    Backup {
        /// Destination file for the JSON snapshot.
        file: PathBuf,
    },
    /// Replace all rows with the contents of a snapshot.
    Restore {
        /// Snapshot file produced by `backup`.
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> tubeledger_sqlite::Result<()> {
    match cli.command {
        Command::Init { seed } => {
            let mut store = Store::init(&cli.data_dir)?;
            if seed {
                let report = seed_demo(&mut store, Local::now().date_naive())?;
                if report.seeded {
                    println!(
                        "seeded {} customers, {} tubes, {} certificates",
                        report.customers, report.tubes, report.certificates
                    );
                } else {
                    println!("store not empty, seed skipped");
                }
            }
            println!("store ready at {}", cli.data_dir.display());
        }
        Command::Status => {
            let store = Store::init(&cli.data_dir)?;
            let status = store.status()?;
            println!("schema version: {}", status.schema_version);
            println!("customers:      {}", status.customers);
            println!("tubes:          {}", status.tubes);
            println!("certificates:   {}", status.certificates);
            println!("quotes:         {}", status.quotes);
            println!("contracts:      {}", status.contracts);
        }
        Command::Migrate => {
            let mut store = Store::open(&cli.data_dir)?;
            store.ensure_schema()?;
            let report = store.migrate()?;
            if report.applied.is_empty() {
                println!("schema already up to date");
            } else {
                for step in &report.applied {
                    println!("applied: {step}");
                }
            }
            if report.skipped_statements > 0 {
                println!("skipped {} statement(s), see log", report.skipped_statements);
            }
        }
        Command::Seed => {
            let mut store = Store::init(&cli.data_dir)?;
            let report = seed_demo(&mut store, Local::now().date_naive())?;
            if report.seeded {
                println!("seeded {} customers", report.customers);
            } else {
                println!("store not empty, seed skipped");
            }
        }
        Command::Backup { file } => {
            let store = Store::init(&cli.data_dir)?;
            store.export_snapshot(&file)?;
            println!("snapshot written to {}", file.display());
        }
        Command::Restore { file } => {
            let mut store = Store::init(&cli.data_dir)?;
            store.restore_snapshot(&file)?;
            println!("snapshot restored from {}", file.display());
        }
    }
    Ok(())
}
