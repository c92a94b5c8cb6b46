mod cli;
mod engine;
mod metrics;
mod model;
mod orchestrator;
mod protocol;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod validate;

use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    // The local offset can only be read soundly while the process is single-threaded,
    // so capture it before the runtime starts its workers.
    let utc_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    cli::init_logging(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(cli::run(args, orchestrator::ViewConfig::new(utc_offset)))
}
