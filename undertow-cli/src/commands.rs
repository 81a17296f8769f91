//! CLI arguments and run dispatch

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use undertow_core::config::{AssetSource, UndertowConfig, parse_patterns};
use undertow_core::tracing_setup::CliLogLevel;
use undertow_core::{GitHubClient, UndertowError, run};

/// Command-line options. Every flag overrides its environment counterpart.
#[derive(Debug, Parser)]
#[command(name = "undertow")]
#[command(about = "Create BitTorrent files for GitHub release assets")]
#[command(version)]
pub struct Cli {
    /// Build torrents for local files instead of the latest release's assets
    #[arg(long)]
    pub local: bool,

    /// Glob patterns of local files; each value may hold several lines
    #[arg(long = "files", value_name = "PATTERN", num_args = 1..)]
    pub files: Vec<String>,

    /// Put every matched local file into one combined torrent
    #[arg(long)]
    pub single_torrent: bool,

    /// Tag ref the local files belong to, e.g. refs/tags/v1.2.3
    #[arg(long, value_name = "REF")]
    pub tag: Option<String>,

    /// Directory for downloaded assets and generated torrents
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Fixed piece length in bytes (power of two, at least 16384)
    #[arg(long, value_name = "BYTES")]
    pub piece_length: Option<u32>,

    /// Console log level
    #[arg(long, value_enum, env = "UNDERTOW_LOG_LEVEL", default_value_t = CliLogLevel::Info)]
    pub log_level: CliLogLevel,

    /// Also write a full trace log of the run into this directory
    #[arg(long, value_name = "DIR")]
    pub logs_dir: Option<PathBuf>,
}

impl Cli {
    /// Applies flag overrides on top of environment configuration.
    pub fn apply_to(&self, config: &mut UndertowConfig) {
        if self.local {
            config.source = AssetSource::Local;
        }
        if !self.files.is_empty() {
            config.local.patterns = self
                .files
                .iter()
                .flat_map(|value| parse_patterns(value))
                .collect();
        }
        if self.single_torrent {
            config.local.single_torrent = true;
        }
        if let Some(tag) = &self.tag {
            config.local.tag_ref = Some(tag.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(piece_length) = self.piece_length {
            config.output.piece_length = Some(piece_length);
        }
    }
}

/// Loads configuration, runs the selected pipeline, and reports completion.
///
/// # Errors
/// Returns the first configuration, transport, or torrent error of the run.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = UndertowConfig::from_env();
    cli.apply_to(&mut config);
    config.validate().context("invalid configuration")?;

    let client = GitHubClient::new(&config.github)?;
    let summary = run(&config, &client).await.map_err(|error| {
        if let Some(hint) = failure_hint(&error) {
            tracing::info!("{hint}");
        }
        error
    })?;

    tracing::info!(
        "Wrote {} torrents, uploaded {}",
        summary.torrents.len(),
        summary.uploads
    );
    println!("All files processed.");
    Ok(())
}

/// Points the user at their inputs when a run fails because of them.
fn failure_hint(error: &UndertowError) -> Option<&'static str> {
    error
        .is_user_error()
        .then_some("Check the action inputs: repository, tag ref, and file patterns")
}
