//! Tasklist - a terminal client for the tasklist to-do service.
//!
//! Sign in once, then list, add, advance, reorder and delete tasks from the
//! command line. Tokens are kept between runs and refreshed transparently.

mod commands;
mod format;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tasklist_core::{AppContext, AuthEvent, Config};

use commands::Cli;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }

    let ctx = AppContext::from_config(&config)?;
    let mut events = ctx.events.subscribe();

    let state = ctx.session.check_status();
    debug!(?state, "Session restored");
    info!("Tasklist starting");

    let result = commands::run(cli.command, &ctx, &mut config).await;

    // The gateway dropped our credentials somewhere along the way
    if let Ok(AuthEvent::SignedOut { reason }) = events.try_recv() {
        while events.try_recv().is_ok() {}
        ctx.session.check_status();
        eprintln!("Signed out: {}. Run `tasklist login` to sign in again.", reason);
    }

    result
}
