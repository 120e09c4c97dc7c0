//! Merch CLI - company merch store in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{auth, buy, catalog, info, send, status};

/// Merch - spend and share your coins
#[derive(Parser)]
#[command(name = "merch", version, about, long_about = None)]
struct Cli {
    /// Account name to act as (falls back to MERCH_USER)
    #[arg(long, short, global = true, env = "MERCH_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, creating the account on first use
    Auth,

    /// Send coins to another account
    Send {
        /// Receiver account name
        to: String,
        /// Number of coins to send
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Buy one item from the store
    Buy {
        /// Item name
        item: String,
    },

    /// Show balance, inventory and transfer history
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List store items and prices
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show store-wide ledger totals
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Install the log subscriber; RUST_LOG controls the filter
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let user = cli.user;
    match cli.command {
        Commands::Auth => auth::run(user).await,
        Commands::Send { to, amount } => send::run(user, &to, amount).await,
        Commands::Buy { item } => buy::run(user, &item).await,
        Commands::Info { json } => info::run(user, json).await,
        Commands::Catalog { json } => catalog::run(json).await,
        Commands::Status { json } => status::run(json).await,
    }
}
