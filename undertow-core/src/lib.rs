//! Undertow Core - torrent seeding for GitHub release assets
//!
//! Builds BitTorrent metadata for release assets, either from local files
//! matched by glob patterns or from the assets already attached to the
//! latest published release, and uploads the generated torrents back to
//! that release.

pub mod config;
pub mod patterns;
pub mod pipeline;
pub mod release;
pub mod torrent;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{AssetSource, ConfigError, UndertowConfig};
pub use pipeline::{RunSummary, run, run_local, run_remote};
pub use release::{GitHubClient, Release, ReleaseAsset, ReleaseError, ReleaseHost, RepoRef};
pub use torrent::{TorrentCreator, TorrentError, TorrentJob};

/// Errors that can abort an Undertow run.
///
/// Every failure is terminal: the pipeline never recovers from one of these,
/// it only surfaces the message to the user.
#[derive(Debug, thiserror::Error)]
pub enum UndertowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No files matched the pattern: {pattern}")]
    NoMatches { pattern: String },

    #[error("Torrent error: {0}")]
    Torrent(#[from] TorrentError),

    #[error("Release error: {0}")]
    Release(#[from] ReleaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UndertowError {
    /// Checks if this error was caused by user-supplied input rather than
    /// by the hosting platform or the filesystem.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            UndertowError::Config(_) | UndertowError::NoMatches { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, UndertowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_matches_message_names_pattern() {
        let error = UndertowError::NoMatches {
            pattern: "dist/*.zip".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No files matched the pattern: dist/*.zip"
        );
        assert!(error.is_user_error());
    }

    #[test]
    fn test_upload_rejection_is_not_user_error() {
        let error = UndertowError::from(ReleaseError::UploadRejected { status: 422 });
        assert!(!error.is_user_error());
        assert!(error.to_string().contains("422"));
    }
}
