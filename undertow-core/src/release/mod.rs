//! GitHub release access: metadata lookup and asset transfer

pub mod client;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::GitHubClient;

use crate::config::{ConfigError, REPOSITORY_KEY};

/// Repository a release belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Predicts the public download URL an asset will have once it is
    /// attached to the release tagged `tag`.
    ///
    /// # Examples
    /// ```
    /// use undertow_core::RepoRef;
    ///
    /// let repo = RepoRef::new("acme", "widget");
    /// assert_eq!(
    ///     repo.asset_download_url("https://github.com", "v1.2.3", "widget.zip"),
    ///     "https://github.com/acme/widget/releases/download/v1.2.3/widget.zip"
    /// );
    /// ```
    pub fn asset_download_url(&self, server_url: &str, tag: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}/releases/download/{}/{}",
            server_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            tag,
            file_name
        )
    }
}

impl FromStr for RepoRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(ConfigError::Invalid {
                key: REPOSITORY_KEY,
                reason: format!("expected owner/repo, got '{s}'"),
            }),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Published release as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// File attached to a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// Errors from the hosting platform or from moving asset bytes.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to upload file: {status}")]
    UploadRejected { status: u16 },

    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("HTTP client setup failed: {reason}")]
    ClientSetup { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Release operations the pipelines depend on.
///
/// Implementations talk to a hosting platform; tests substitute in-memory
/// hosts. Every call completes before the caller issues the next one.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Fetches the latest published (non-draft, non-prerelease) release.
    ///
    /// # Errors
    /// - `ReleaseError::Transport` - Network failure
    /// - `ReleaseError::Status` - Not found, unauthorized, or rate limited
    /// - `ReleaseError::MalformedResponse` - Body is not a release
    async fn latest_release(&self, repo: &RepoRef) -> Result<Release, ReleaseError>;

    /// Lists every asset attached to a release.
    ///
    /// # Errors
    /// - `ReleaseError::Transport` - Network failure
    /// - `ReleaseError::Status` - API rejected the request
    /// - `ReleaseError::MalformedResponse` - Body is not an asset list
    async fn list_release_assets(
        &self,
        repo: &RepoRef,
        release_id: u64,
    ) -> Result<Vec<ReleaseAsset>, ReleaseError>;

    /// Streams an asset's raw bytes into `destination`, returning the byte count.
    ///
    /// # Errors
    /// - `ReleaseError::Transport` - Network failure mid-stream
    /// - `ReleaseError::Status` - API rejected the request
    /// - `ReleaseError::Io` - Destination could not be written
    async fn download_asset(
        &self,
        repo: &RepoRef,
        asset_id: u64,
        destination: &Path,
    ) -> Result<u64, ReleaseError>;

    /// Uploads a local file as a new asset of the release.
    ///
    /// # Errors
    /// - `ReleaseError::UploadRejected` - Response status was not 201 Created
    /// - `ReleaseError::Transport` - Network failure
    /// - `ReleaseError::Io` - File could not be read
    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release_id: u64,
        file_path: &Path,
    ) -> Result<(), ReleaseError>;
}
