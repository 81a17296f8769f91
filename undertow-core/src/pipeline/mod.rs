//! Run orchestration: local and remote asset pipelines
//!
//! Both pipelines are strictly sequential. Each step is awaited before the
//! next begins and the first error aborts the whole run.

mod local;
mod remote;

use std::path::PathBuf;

pub use local::run_local;
pub use remote::run_remote;

use crate::config::{AssetSource, OutputConfig, UndertowConfig};
use crate::release::ReleaseHost;
use crate::torrent::TorrentCreator;

/// What a completed run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Torrent files written, in creation order
    pub torrents: Vec<PathBuf>,
    /// Torrents uploaded back to the release
    pub uploads: usize,
}

/// Runs the pipeline selected by `config.source`.
///
/// # Errors
/// Propagates the first error raised by the selected pipeline.
pub async fn run(config: &UndertowConfig, host: &dyn ReleaseHost) -> crate::Result<RunSummary> {
    match config.source {
        AssetSource::Local => run_local(config).await,
        AssetSource::Remote => run_remote(config, host).await,
    }
}

fn creator_for(output: &OutputConfig) -> TorrentCreator {
    match output.piece_length {
        Some(piece_length) => TorrentCreator::with_piece_length(piece_length),
        None => TorrentCreator::new(),
    }
}
