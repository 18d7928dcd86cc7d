//! Dover TUI entry point.

use std::{fs::OpenOptions, sync::Arc};

use clap::Parser;
use dover_app::{FileSlot, MemorySlot, Runtime, SessionSlot};
use dover_client::HttpHistoryLoader;
use dover_tui::{Args, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    tracing::info!(server = %args.server, "Dover TUI starting");

    match args.session_slot.clone() {
        Some(path) => run(&args, FileSlot::new(path)).await,
        None => run(&args, MemorySlot::new()).await,
    }
}

async fn run<S: SessionSlot>(args: &Args, slot: S) -> Result<(), Box<dyn std::error::Error>> {
    let loader = HttpHistoryLoader::new(&args.server)?;
    let channel = args.channel_config()?;
    tracing::info!(channel = %channel.url, "channel configured");

    let driver = TerminalDriver::new(channel)?;
    let runtime =
        Runtime::new(driver, loader, slot, args.controller_config(), args.runtime_config());

    Ok(runtime.run().await?)
}

/// Log to `--log-file` when given. The terminal is the UI, so without a file
/// nothing is logged.
fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        .with(filter)
        .init();

    Ok(())
}
