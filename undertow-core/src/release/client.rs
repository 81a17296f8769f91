//! GitHub REST client for release metadata and asset transfer

use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio::io::AsyncWriteExt;
use url::Url;

use super::{Release, ReleaseAsset, ReleaseError, ReleaseHost, RepoRef};
use crate::config::GitHubConfig;

const API_ACCEPT: &str = "application/vnd.github+json";
const BINARY_CONTENT: &str = "application/octet-stream";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const ASSETS_PER_PAGE: usize = 100;

/// GitHub REST client.
///
/// Requests carry no timeout and are never retried; the first failure is
/// returned to the caller.
pub struct GitHubClient {
    api_url: Url,
    uploads_url: Url,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Creates a client authenticated with the configured token.
    ///
    /// # Errors
    /// - `UndertowError::Config` - No token configured
    /// - `ReleaseError::InvalidEndpoint` - API or upload root is not a URL
    /// - `ReleaseError::ClientSetup` - Token is not a valid header value
    pub fn new(config: &GitHubConfig) -> crate::Result<Self> {
        let token = config.token()?;

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            ReleaseError::ClientSetup {
                reason: format!("invalid token: {e}"),
            }
        })?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| ReleaseError::ClientSetup {
                reason: e.to_string(),
            })?;

        Ok(Self {
            api_url: parse_root(&config.api_url)?,
            uploads_url: parse_root(&config.uploads_url)?,
            client,
        })
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, ReleaseError>
    where
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;
        let response = check_status(&url, response)?;

        response
            .json::<T>()
            .await
            .map_err(|e| ReleaseError::MalformedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ReleaseHost for GitHubClient {
    async fn latest_release(&self, repo: &RepoRef) -> Result<Release, ReleaseError> {
        let url = endpoint(
            &self.api_url,
            &["repos", &repo.owner, &repo.repo, "releases", "latest"],
        )?;
        let release: Release = self.get_json(url).await?;
        tracing::info!(
            "Latest release of {repo} is {} (id {})",
            release.tag_name,
            release.id
        );
        Ok(release)
    }

    async fn list_release_assets(
        &self,
        repo: &RepoRef,
        release_id: u64,
    ) -> Result<Vec<ReleaseAsset>, ReleaseError> {
        let release_id = release_id.to_string();
        let base = endpoint(
            &self.api_url,
            &["repos", &repo.owner, &repo.repo, "releases", &release_id, "assets"],
        )?;

        let mut assets = Vec::new();
        for page in 1.. {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("per_page", &ASSETS_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<ReleaseAsset> = self.get_json(url).await?;
            let last_page = batch.len() < ASSETS_PER_PAGE;
            assets.extend(batch);
            if last_page {
                break;
            }
        }

        tracing::debug!("Release {release_id} of {repo} has {} assets", assets.len());
        Ok(assets)
    }

    async fn download_asset(
        &self,
        repo: &RepoRef,
        asset_id: u64,
        destination: &Path,
    ) -> Result<u64, ReleaseError> {
        let asset_id = asset_id.to_string();
        let url = endpoint(
            &self.api_url,
            &["repos", &repo.owner, &repo.repo, "releases", "assets", &asset_id],
        )?;

        tracing::debug!("Downloading asset {asset_id} from {url}");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, BINARY_CONTENT)
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;
        let mut response = check_status(&url, response)?;

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error(&url, &e))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!("Downloaded asset {asset_id} ({written} bytes)");
        println!("Downloaded {}", destination.display());
        Ok(written)
    }

    async fn upload_asset(
        &self,
        repo: &RepoRef,
        release_id: u64,
        file_path: &Path,
    ) -> Result<(), ReleaseError> {
        let file_name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ReleaseError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid asset file name: {}", file_path.display()),
                ))
            })?;

        let release_id = release_id.to_string();
        let mut url = endpoint(
            &self.uploads_url,
            &["repos", &repo.owner, &repo.repo, "releases", &release_id, "assets"],
        )?;
        url.query_pairs_mut().append_pair("name", file_name);

        let contents = tokio::fs::read(file_path).await?;
        let content_length = contents.len();

        tracing::debug!("Uploading {file_name} ({content_length} bytes) to {url}");
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, BINARY_CONTENT)
            .header(CONTENT_LENGTH, content_length)
            .body(contents)
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            tracing::warn!("Upload of {file_name} to release {release_id} returned {status}");
            return Err(ReleaseError::UploadRejected {
                status: status.as_u16(),
            });
        }

        println!("Uploaded {file_name} to release assets.");
        Ok(())
    }
}

fn parse_root(raw: &str) -> Result<Url, ReleaseError> {
    let url = Url::parse(raw).map_err(|e| ReleaseError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ReleaseError::InvalidEndpoint {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

/// Appends percent-encoded path segments to a root URL
fn endpoint(root: &Url, segments: &[&str]) -> Result<Url, ReleaseError> {
    let mut url = root.clone();
    url.path_segments_mut()
        .map_err(|()| ReleaseError::InvalidEndpoint {
            url: root.to_string(),
            reason: "not a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn check_status(url: &Url, response: reqwest::Response) -> Result<reqwest::Response, ReleaseError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!("{url} returned status {status}");
        Err(ReleaseError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn transport_error(url: &Url, error: &reqwest::Error) -> ReleaseError {
    tracing::warn!("HTTP request to {url} failed: {error}");
    ReleaseError::Transport {
        url: url.to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let root = parse_root("https://api.github.com").unwrap();
        let url = endpoint(&root, &["repos", "acme", "my widget", "releases", "latest"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/my%20widget/releases/latest"
        );
    }

    #[test]
    fn test_endpoint_keeps_enterprise_prefix() {
        let root = parse_root("https://ghe.example.com/api/v3/").unwrap();
        let url = endpoint(&root, &["repos", "acme", "widget", "releases", "latest"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/acme/widget/releases/latest"
        );
    }

    #[test]
    fn test_parse_root_rejects_non_base_urls() {
        assert!(parse_root("mailto:someone@example.com").is_err());
        assert!(parse_root("not a url").is_err());
    }

    #[test]
    fn test_client_requires_token() {
        let config = GitHubConfig::default();
        let result = GitHubClient::new(&config);
        assert!(matches!(result, Err(crate::UndertowError::Config(_))));
    }
}
