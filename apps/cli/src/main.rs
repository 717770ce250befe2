//! # Storefront Counter CLI
//!
//! Runs the counter engine from a terminal: sign in, inspect the session,
//! load master data and read the daily summary.
//!
//! ## Start-up
//! ```text
//! init_tracing() ──► ClientConfig::load ──► ClientContext::open ──► start()
//!                                                                     │
//!                                                     command ◄───────┘
//! ```

mod cli;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use storefront_client::{ClientConfig, ClientContext};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> storefront_client::ClientResult<()> {
    let config = ClientConfig::load(cli.config.clone().map(PathBuf::from))?;
    debug!(
        environment = %config.api.environment,
        timeout_secs = config.api.request_timeout_secs,
        "Configuration loaded"
    );

    let context = ClientContext::open(&config).await?;
    context.start().await;

    let result = cli.run(&context).await;
    context.close().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront_client=trace` - Trace the engine only
/// - Default: `info,storefront=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
