//! Undertow CLI - Command-line interface
//!
//! Creates torrents for GitHub release assets. Configuration comes from the
//! GitHub Actions environment; flags override it for local use.

mod commands;

use clap::Parser;
use undertow_core::tracing_setup::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    if let Err(error) = commands::execute(cli).await {
        tracing::error!("{error:#}");
        return Err(error);
    }

    Ok(())
}
