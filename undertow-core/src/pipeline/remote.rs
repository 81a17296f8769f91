//! Remote-assets pipeline: torrents for assets already on the latest release

use std::path::Path;

use tracing::Instrument;

use super::{RunSummary, creator_for};
use crate::UndertowError;
use crate::config::UndertowConfig;
use crate::release::{ReleaseAsset, ReleaseError, ReleaseHost};
use crate::torrent::TorrentJob;

/// Seeds every asset of the latest release.
///
/// Each asset is downloaded, turned into `<asset>.torrent` web-seeded by
/// its public download URL, and the torrent is uploaded to the same
/// release. An asset is finished before the next one starts.
///
/// # Errors
/// - `UndertowError::Config` - Repository missing or malformed
/// - `UndertowError::Release` - Lookup, download, or upload failed
/// - `UndertowError::Torrent` - Hashing, encoding, or writing failed
pub async fn run_remote(
    config: &UndertowConfig,
    host: &dyn ReleaseHost,
) -> crate::Result<RunSummary> {
    let repo = config.repository()?;
    let release = host.latest_release(&repo).await?;
    let assets = host.list_release_assets(&repo, release.id).await?;

    let output_dir = &config.output.dir;
    tokio::fs::create_dir_all(output_dir).await?;

    let creator = creator_for(&config.output);
    let mut summary = RunSummary::default();

    for asset in &assets {
        check_asset_name(asset)?;
        let span = tracing::info_span!(
            "asset",
            name = %asset.name,
            id = asset.id,
            size = asset.size
        );

        let torrent_path = async {
            let asset_path = output_dir.join(&asset.name);
            let written = host.download_asset(&repo, asset.id, &asset_path).await?;
            if written != asset.size {
                tracing::warn!(
                    "Downloaded {written} bytes but the release lists {} bytes",
                    asset.size
                );
            }

            let job = TorrentJob {
                files: vec![asset_path],
                output_name: format!("{}.torrent", asset.name),
                web_seeds: vec![asset.browser_download_url.clone()],
            };
            let torrent_path = creator.write(&job, output_dir).await?;

            host.upload_asset(&repo, release.id, &torrent_path).await?;
            Ok::<_, UndertowError>(torrent_path)
        }
        .instrument(span)
        .await?;

        summary.torrents.push(torrent_path);
        summary.uploads += 1;
    }

    tracing::info!(
        "Seeded {} assets of {repo} release {}",
        summary.uploads,
        release.tag_name
    );
    Ok(summary)
}

/// Asset names become local file names, so they must be a single component.
fn check_asset_name(asset: &ReleaseAsset) -> Result<(), ReleaseError> {
    let name = Path::new(&asset.name);
    if name.file_name().is_some_and(|file_name| file_name == name.as_os_str()) {
        Ok(())
    } else {
        Err(ReleaseError::MalformedResponse {
            url: asset.browser_download_url.clone(),
            reason: format!("unsafe asset name '{}'", asset.name),
        })
    }
}
