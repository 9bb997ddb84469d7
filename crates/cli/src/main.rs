//! WePay Records CLI - table setup and record maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Print the generated DDL
//! wepay-cli schema
//!
//! # Create the tables
//! wepay-cli init-db
//!
//! # Import WePay API responses (one object or an array)
//! wepay-cli import checkout checkouts.json
//!
//! # List active, deleted or all accounts as JSON lines
//! wepay-cli list account
//! wepay-cli list account --deleted
//!
//! # Delete a user and everything it owns
//! wepay-cli delete user 12345 --hard
//! ```
//!
//! # Environment Variables
//!
//! - `WEPAY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `WEPAY_RETAIN_RECORDS` - default deletions keep rows (default `true`)
//! - `WEPAY_CASCADE_WITHDRAWALS` - account deletions include withdrawals
//! - `RUST_LOG` - log filter (default `info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "wepay-cli")]
#[command(author, version, about = "WePay Records CLI tools")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CREATE TABLE statements
    Schema,
    /// Create the tables in the configured database
    InitDb,
    /// Create or revive records from a JSON file
    Import {
        /// Record type in the file
        entity: EntityKind,
        /// JSON file holding one object or an array of objects
        file: PathBuf,
    },
    /// Print records as JSON lines
    List {
        /// Record type to list
        entity: EntityKind,
        /// Only soft-deleted records
        #[arg(long, conflicts_with = "all")]
        deleted: bool,
        /// Active and soft-deleted records
        #[arg(long)]
        all: bool,
    },
    /// Delete a record and everything it owns
    Delete {
        /// Record type to delete
        entity: EntityKind,
        /// Primary key
        id: i64,
        /// Remove rows instead of flagging them
        #[arg(long, conflicts_with = "soft")]
        hard: bool,
        /// Flag rows as deleted regardless of `WEPAY_RETAIN_RECORDS`
        #[arg(long)]
        soft: bool,
    },
}

/// Record types addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    User,
    Account,
    Preapproval,
    Checkout,
    Withdrawal,
    Address,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so `list` output stays machine readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let json_layer = cli.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!cli.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Schema => commands::tables::print_schema(),
        Commands::InitDb => commands::tables::init_db().await?,
        Commands::Import { entity, file } => commands::records::import(entity, &file).await?,
        Commands::List {
            entity,
            deleted,
            all,
        } => {
            let scope = if all {
                commands::records::ListScope::All
            } else if deleted {
                commands::records::ListScope::Deleted
            } else {
                commands::records::ListScope::Active
            };
            commands::records::list(entity, scope).await?;
        }
        Commands::Delete {
            entity,
            id,
            hard,
            soft,
        } => {
            let deletion = if hard {
                wepay_records::Deletion::Hard
            } else if soft {
                wepay_records::Deletion::Soft
            } else {
                wepay_records::Deletion::Default
            };
            commands::records::delete(entity, id, deletion).await?;
        }
    }
    Ok(())
}
