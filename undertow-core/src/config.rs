//! Centralized configuration for Undertow.
//!
//! Settings are read once from the GitHub Actions environment and may then be
//! overridden by command-line flags. Nothing here touches the filesystem or
//! the network, so every configuration error surfaces before work begins.

use std::path::PathBuf;

use url::Url;

use crate::release::RepoRef;
use crate::torrent::creation::{MAX_PIECE_LENGTH, MIN_PIECE_LENGTH};

pub const TOKEN_INPUT_KEY: &str = "INPUT_GITHUB_TOKEN";
pub const TOKEN_KEY: &str = "GITHUB_TOKEN";
pub const REPOSITORY_KEY: &str = "GITHUB_REPOSITORY";
pub const REF_KEY: &str = "GITHUB_REF";
pub const LOCAL_KEY: &str = "INPUT_LOCAL";
pub const FILES_KEY: &str = "INPUT_FILES";
pub const ONEFILE_KEY: &str = "INPUT_ONEFILE";
pub const API_URL_KEY: &str = "GITHUB_API_URL";
pub const SERVER_URL_KEY: &str = "GITHUB_SERVER_URL";
pub const UPLOADS_URL_KEY: &str = "UNDERTOW_UPLOADS_URL";
pub const OUTPUT_DIR_KEY: &str = "UNDERTOW_OUTPUT_DIR";
pub const PIECE_LENGTH_KEY: &str = "UNDERTOW_PIECE_LENGTH";
pub const ACTIONS_KEY: &str = "GITHUB_ACTIONS";

const TAG_REF_PREFIX: &str = "refs/tags/";

/// Errors raised while validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {key}")]
    Missing { key: &'static str },

    #[error("Could not extract tag name from GITHUB_REF")]
    MissingTag,

    #[error("No files provided in the 'files' input")]
    NoPatterns,

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Which assets a run turns into torrents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetSource {
    /// Assets already attached to the latest published release.
    #[default]
    Remote,
    /// Files on the local filesystem matched by glob patterns.
    Local,
}

/// Root configuration grouping every section.
#[derive(Debug, Clone, Default)]
pub struct UndertowConfig {
    pub github: GitHubConfig,
    pub source: AssetSource,
    pub local: LocalAssetsConfig,
    pub output: OutputConfig,
}

/// Hosting-platform endpoints and credentials.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Bearer token for the REST API
    pub token: Option<String>,
    /// `owner/repo` of the repository being released
    pub repository: Option<String>,
    /// REST API root
    pub api_url: String,
    /// Root of the release asset upload endpoint
    pub uploads_url: String,
    /// Web host used for predicted asset download URLs
    pub server_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Emit `::error::` workflow annotations
    pub actions_annotations: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repository: None,
            api_url: "https://api.github.com".to_string(),
            uploads_url: "https://uploads.github.com".to_string(),
            server_url: "https://github.com".to_string(),
            user_agent: concat!("undertow/", env!("CARGO_PKG_VERSION")).to_string(),
            actions_annotations: false,
        }
    }
}

/// Inputs for local-assets mode.
#[derive(Debug, Clone)]
pub struct LocalAssetsConfig {
    /// Glob patterns, in the order given
    pub patterns: Vec<String>,
    /// Ref that triggered the run, e.g. `refs/tags/v1.2.3`
    pub tag_ref: Option<String>,
    /// Build one combined torrent instead of one per file
    pub single_torrent: bool,
    /// Directory relative patterns resolve against
    pub base_dir: PathBuf,
}

impl Default for LocalAssetsConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            tag_ref: None,
            single_torrent: false,
            base_dir: PathBuf::from("."),
        }
    }
}

/// Where generated torrents and downloaded assets go.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Fixed piece length; chosen from the payload size when unset
    pub piece_length: Option<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./torrents"),
            piece_length: None,
        }
    }
}

impl UndertowConfig {
    /// Creates configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults. Values that cannot be parsed are
    /// ignored with a warning, matching how unset keys behave.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.github.token = lookup(TOKEN_INPUT_KEY)
            .filter(|token| !token.is_empty())
            .or_else(|| lookup(TOKEN_KEY))
            .filter(|token| !token.is_empty());
        config.github.repository = lookup(REPOSITORY_KEY);

        if let Some(api_url) = lookup(API_URL_KEY) {
            config.github.api_url = api_url;
        }
        if let Some(server_url) = lookup(SERVER_URL_KEY) {
            config.github.server_url = server_url;
        }
        if let Some(uploads_url) = lookup(UPLOADS_URL_KEY) {
            config.github.uploads_url = uploads_url;
        }
        config.github.actions_annotations = is_true(lookup(ACTIONS_KEY));

        if is_true(lookup(LOCAL_KEY)) {
            config.source = AssetSource::Local;
        }
        if let Some(files) = lookup(FILES_KEY) {
            config.local.patterns = parse_patterns(&files);
        }
        config.local.tag_ref = lookup(REF_KEY);
        config.local.single_torrent = is_true(lookup(ONEFILE_KEY));

        if let Some(dir) = lookup(OUTPUT_DIR_KEY) {
            config.output.dir = PathBuf::from(dir);
        }
        if let Some(piece_length) = lookup(PIECE_LENGTH_KEY) {
            match piece_length.parse::<u32>() {
                Ok(bytes) => config.output.piece_length = Some(bytes),
                Err(e) => tracing::warn!("Ignoring {PIECE_LENGTH_KEY}={piece_length}: {e}"),
            }
        }

        config
    }

    /// Checks everything the selected mode needs before any work starts.
    ///
    /// # Errors
    /// - `ConfigError::MissingTag` - Local mode without a usable tag ref
    /// - `ConfigError::NoPatterns` - Local mode without any file pattern
    /// - `ConfigError::Missing` - Token or repository not provided
    /// - `ConfigError::Invalid` - Malformed repository, URL, or piece length
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source == AssetSource::Local {
            self.local.tag()?;
            self.local.patterns()?;
        }
        self.github.token()?;
        self.repository()?;
        parse_url(API_URL_KEY, &self.github.api_url)?;
        parse_url(UPLOADS_URL_KEY, &self.github.uploads_url)?;
        parse_url(SERVER_URL_KEY, &self.github.server_url)?;
        self.output.validate_piece_length()?;
        Ok(())
    }

    /// Returns the repository the run operates on.
    ///
    /// # Errors
    /// - `ConfigError::Missing` - `GITHUB_REPOSITORY` not set
    /// - `ConfigError::Invalid` - Value is not of the form `owner/repo`
    pub fn repository(&self) -> Result<RepoRef, ConfigError> {
        let raw = self
            .github
            .repository
            .as_deref()
            .ok_or(ConfigError::Missing {
                key: REPOSITORY_KEY,
            })?;
        raw.parse()
    }
}

impl GitHubConfig {
    /// Returns the bearer token.
    ///
    /// # Errors
    /// - `ConfigError::Missing` - No token in either token key
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .ok_or(ConfigError::Missing { key: TOKEN_KEY })
    }
}

impl LocalAssetsConfig {
    /// Extracts the release tag from the triggering ref.
    ///
    /// The `refs/tags/` prefix is stripped when present; any other ref is
    /// used verbatim.
    ///
    /// # Errors
    /// - `ConfigError::MissingTag` - Ref unset or empty after stripping
    pub fn tag(&self) -> Result<String, ConfigError> {
        let tag_ref = self.tag_ref.as_deref().unwrap_or_default();
        let tag = tag_ref.strip_prefix(TAG_REF_PREFIX).unwrap_or(tag_ref);
        if tag.is_empty() {
            return Err(ConfigError::MissingTag);
        }
        Ok(tag.to_string())
    }

    /// Returns the glob patterns.
    ///
    /// # Errors
    /// - `ConfigError::NoPatterns` - Pattern list is empty
    pub fn patterns(&self) -> Result<&[String], ConfigError> {
        if self.patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        Ok(&self.patterns)
    }
}

impl OutputConfig {
    fn validate_piece_length(&self) -> Result<(), ConfigError> {
        let Some(bytes) = self.piece_length else {
            return Ok(());
        };
        if !bytes.is_power_of_two() || !(MIN_PIECE_LENGTH..=MAX_PIECE_LENGTH).contains(&bytes) {
            return Err(ConfigError::Invalid {
                key: PIECE_LENGTH_KEY,
                reason: format!(
                    "{bytes} is not a power of two between {MIN_PIECE_LENGTH} and {MAX_PIECE_LENGTH}"
                ),
            });
        }
        Ok(())
    }
}

/// Splits a multi-line input into trimmed, non-blank glob patterns.
pub fn parse_patterns(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_true(value: Option<String>) -> bool {
    value.as_deref() == Some("true")
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{raw}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> UndertowConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        UndertowConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config_values() {
        let config = UndertowConfig::default();

        assert_eq!(config.source, AssetSource::Remote);
        assert_eq!(config.output.dir, PathBuf::from("./torrents"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.server_url, "https://github.com");
        assert!(!config.local.single_torrent);
        assert!(config.output.piece_length.is_none());
    }

    #[test]
    fn test_local_mode_from_lookup() {
        let config = config_from(&[
            (LOCAL_KEY, "true"),
            (FILES_KEY, "dist/*.zip\n\n  build/app.tar.gz  \n"),
            (ONEFILE_KEY, "true"),
            (REF_KEY, "refs/tags/v1.2.3"),
            (REPOSITORY_KEY, "acme/widget"),
            (TOKEN_KEY, "secret"),
        ]);

        assert_eq!(config.source, AssetSource::Local);
        assert_eq!(config.local.patterns, vec!["dist/*.zip", "build/app.tar.gz"]);
        assert!(config.local.single_torrent);
        assert_eq!(config.local.tag().unwrap(), "v1.2.3");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_only_accept_literal_true() {
        let config = config_from(&[(LOCAL_KEY, "TRUE"), (ONEFILE_KEY, "1")]);
        assert_eq!(config.source, AssetSource::Remote);
        assert!(!config.local.single_torrent);
    }

    #[test]
    fn test_input_token_takes_precedence() {
        let config = config_from(&[(TOKEN_INPUT_KEY, "input"), (TOKEN_KEY, "env")]);
        assert_eq!(config.github.token().unwrap(), "input");

        let config = config_from(&[(TOKEN_INPUT_KEY, ""), (TOKEN_KEY, "env")]);
        assert_eq!(config.github.token().unwrap(), "env");
    }

    #[test]
    fn test_tag_without_prefix_is_used_verbatim() {
        let local = LocalAssetsConfig {
            tag_ref: Some("nightly".to_string()),
            ..Default::default()
        };
        assert_eq!(local.tag().unwrap(), "nightly");
    }

    #[test]
    fn test_missing_tag_fails_local_validation() {
        let config = config_from(&[
            (LOCAL_KEY, "true"),
            (FILES_KEY, "*.zip"),
            (REF_KEY, "refs/tags/"),
            (REPOSITORY_KEY, "acme/widget"),
            (TOKEN_KEY, "secret"),
        ]);
        assert!(matches!(config.validate(), Err(ConfigError::MissingTag)));
    }

    #[test]
    fn test_empty_patterns_fail_local_validation() {
        let config = config_from(&[
            (LOCAL_KEY, "true"),
            (FILES_KEY, "\n  \n"),
            (REF_KEY, "refs/tags/v1"),
            (REPOSITORY_KEY, "acme/widget"),
            (TOKEN_KEY, "secret"),
        ]);
        assert!(matches!(config.validate(), Err(ConfigError::NoPatterns)));
    }

    #[test]
    fn test_remote_mode_requires_token_and_repository() {
        let config = config_from(&[(REPOSITORY_KEY, "acme/widget")]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { key: TOKEN_KEY })
        ));

        let config = config_from(&[(TOKEN_KEY, "secret")]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing {
                key: REPOSITORY_KEY
            })
        ));
    }

    #[test]
    fn test_invalid_piece_length_rejected() {
        let config = config_from(&[
            (TOKEN_KEY, "secret"),
            (REPOSITORY_KEY, "acme/widget"),
            (PIECE_LENGTH_KEY, "100000"),
        ]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: PIECE_LENGTH_KEY,
                ..
            })
        ));
    }

    #[test]
    fn test_unparsable_piece_length_ignored() {
        let config = config_from(&[(PIECE_LENGTH_KEY, "large")]);
        assert!(config.output.piece_length.is_none());
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let config = config_from(&[
            (TOKEN_KEY, "secret"),
            (REPOSITORY_KEY, "acme/widget"),
            (API_URL_KEY, "not a url"),
        ]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: API_URL_KEY,
                ..
            })
        ));
    }
}
