//! Local-assets pipeline: torrents for files that will be attached to a tag

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{RunSummary, creator_for};
use crate::UndertowError;
use crate::config::UndertowConfig;
use crate::patterns::expand_pattern;
use crate::release::RepoRef;
use crate::torrent::TorrentJob;

/// Builds torrents for local files matched by the configured patterns.
///
/// With `single_torrent` set, every match across all patterns goes into one
/// torrent named `<repo>-<tag>.torrent`. Otherwise each matched file gets
/// its own `<file>-<tag>.torrent`, once even when several patterns match it,
/// and a pattern matching nothing aborts the run. Web seeds point at the URL each file will have once attached to the
/// tagged release. Nothing is uploaded.
///
/// # Errors
/// - `UndertowError::Config` - Tag, patterns, or repository missing
/// - `UndertowError::NoMatches` - A pattern (or, combined, every pattern) matched no files
/// - `UndertowError::Torrent` - Hashing, encoding, or writing failed
pub async fn run_local(config: &UndertowConfig) -> crate::Result<RunSummary> {
    let tag = config.local.tag()?;
    let patterns = config.local.patterns()?;
    let repo = config.repository()?;

    let output_dir = &config.output.dir;
    tokio::fs::create_dir_all(output_dir).await?;

    let creator = creator_for(&config.output);
    let server_url = config.github.server_url.as_str();
    let base_dir = config.local.base_dir.as_path();
    let mut summary = RunSummary::default();

    if config.local.single_torrent {
        let mut files = Vec::new();
        for pattern in patterns {
            files.extend(expand_pattern(pattern, base_dir)?);
        }
        if files.is_empty() {
            let pattern = patterns.join(", ");
            report_unmatched(config, &pattern);
            return Err(UndertowError::NoMatches { pattern });
        }

        let web_seeds = files
            .iter()
            .map(|file| repo.asset_download_url(server_url, &tag, &display_name(file)))
            .collect();
        let job = TorrentJob {
            files,
            output_name: combined_torrent_name(&repo, &tag),
            web_seeds,
        };
        summary.torrents.push(creator.write(&job, output_dir).await?);
    } else {
        let mut seen = HashSet::new();
        for pattern in patterns {
            let matched = expand_pattern(pattern, base_dir)?;
            if matched.is_empty() {
                report_unmatched(config, pattern);
                return Err(UndertowError::NoMatches {
                    pattern: pattern.clone(),
                });
            }

            for file in matched {
                // Overlapping patterns reuse the torrent already written
                if !seen.insert(file.clone()) {
                    continue;
                }
                let name = display_name(&file);
                let job = TorrentJob {
                    web_seeds: vec![repo.asset_download_url(server_url, &tag, &name)],
                    output_name: per_file_torrent_name(&name, &tag),
                    files: vec![file],
                };
                summary.torrents.push(creator.write(&job, output_dir).await?);
            }
        }
    }

    tracing::info!(
        "Created {} torrents for {repo} at {tag}",
        summary.torrents.len()
    );
    Ok(summary)
}

fn combined_torrent_name(repo: &RepoRef, tag: &str) -> String {
    format!("{}-{tag}.torrent", repo.repo)
}

fn per_file_torrent_name(file_name: &str, tag: &str) -> String {
    format!("{file_name}-{tag}.torrent")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

fn report_unmatched(config: &UndertowConfig, pattern: &str) {
    tracing::error!("No files matched the pattern: {pattern}");
    if config.github.actions_annotations {
        println!("::error::No files matched the pattern: {pattern}");
    }
}
