//! Torrent creation from local files with piece splitting and hashing
//!
//! Files are concatenated in job order and split into fixed-size pieces that
//! span file boundaries, as BitTorrent v1 requires. Each piece is hashed with
//! SHA-1 and the result is wrapped in a bencoded [`MetaInfo`] document.

use std::path::{Component, Path, PathBuf};

use sha1::{Digest, Sha1};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::metainfo::{FileEntry, Info, MetaInfo};
use super::trackers::{PUBLIC_TRACKERS, announce_tiers};
use super::TorrentError;

/// Smallest piece length chosen automatically (16 KiB)
pub const MIN_PIECE_LENGTH: u32 = 16_384;

/// Largest piece length chosen automatically (16 MiB)
pub const MAX_PIECE_LENGTH: u32 = 16_777_216;

/// Piece count the automatic piece length aims to stay under
const TARGET_PIECE_COUNT: u64 = 1024;

const CREATED_BY: &str = concat!("undertow/", env!("CARGO_PKG_VERSION"));

/// Inputs for one torrent: the files it covers, the name of the `.torrent`
/// to write, and the web seeds to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct TorrentJob {
    pub files: Vec<PathBuf>,
    pub output_name: String,
    pub web_seeds: Vec<String>,
}

/// Torrent creator for converting local files to torrent format
#[derive(Debug, Clone, Default)]
pub struct TorrentCreator {
    piece_length: Option<u32>,
}

impl TorrentCreator {
    /// Creates torrent creator that sizes pieces from the payload
    pub fn new() -> Self {
        Self { piece_length: None }
    }

    /// Creates torrent creator with a fixed piece length
    pub fn with_piece_length(piece_length: u32) -> Self {
        Self {
            piece_length: Some(piece_length),
        }
    }

    /// Builds torrent metadata for a job.
    ///
    /// A single input produces a single-file torrent named after the file.
    /// Several inputs produce a multi-file torrent named after the output
    /// file, with each path relative to the inputs' deepest common directory.
    ///
    /// # Errors
    /// - `TorrentError::NoInputFiles` - Job lists no files
    /// - `TorrentError::InvalidInput` - Input missing, not a file, or empty
    /// - `TorrentError::InvalidPieceLength` - Fixed piece length out of range
    /// - `TorrentError::Io` - File read error
    pub async fn create(&self, job: &TorrentJob) -> Result<MetaInfo, TorrentError> {
        if job.files.is_empty() {
            return Err(TorrentError::NoInputFiles);
        }

        let mut lengths = Vec::with_capacity(job.files.len());
        for path in &job.files {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| TorrentError::invalid_input(path, e.to_string()))?;
            if !metadata.is_file() {
                return Err(TorrentError::invalid_input(path, "not a regular file"));
            }
            lengths.push(metadata.len());
        }

        let total_length: u64 = lengths.iter().sum();
        if total_length == 0 {
            return Err(TorrentError::invalid_input(
                &job.files[0],
                "cannot create torrent from empty input",
            ));
        }

        let piece_length = self.resolve_piece_length(total_length)?;
        let pieces = hash_pieces(&job.files, &lengths, piece_length).await?;

        let info = if let [path] = job.files.as_slice() {
            Info {
                files: None,
                length: Some(total_length),
                name: file_name(path)?,
                piece_length: u64::from(piece_length),
                pieces,
            }
        } else {
            let files = relative_paths(&job.files)?
                .into_iter()
                .zip(&lengths)
                .map(|(path, &length)| FileEntry { length, path })
                .collect();
            Info {
                files: Some(files),
                length: None,
                name: job
                    .output_name
                    .strip_suffix(".torrent")
                    .unwrap_or(&job.output_name)
                    .to_string(),
                piece_length: u64::from(piece_length),
                pieces,
            }
        };

        Ok(MetaInfo {
            announce: PUBLIC_TRACKERS[0].to_string(),
            announce_list: announce_tiers(),
            created_by: CREATED_BY.to_string(),
            creation_date: chrono::Utc::now().timestamp(),
            info,
            url_list: job.web_seeds.clone(),
        })
    }

    /// Builds a job's torrent and writes it into `output_dir`.
    ///
    /// Creates `output_dir` if needed and returns the written path.
    ///
    /// # Errors
    /// - Any error from [`TorrentCreator::create`]
    /// - `TorrentError::Encoding` - Bencode serialization failed
    /// - `TorrentError::Io` - Output directory or file could not be written
    pub async fn write(&self, job: &TorrentJob, output_dir: &Path) -> Result<PathBuf, TorrentError> {
        let metainfo = self.create(job).await?;
        let bytes = metainfo.to_bytes()?;
        let info_hash = metainfo.info_hash()?;

        tokio::fs::create_dir_all(output_dir).await?;
        let torrent_path = output_dir.join(&job.output_name);
        tokio::fs::write(&torrent_path, &bytes).await?;

        tracing::info!(
            %info_hash,
            bytes = metainfo.info.total_length(),
            pieces = metainfo.info.piece_count(),
            web_seeds = metainfo.url_list.len(),
            "Wrote {}",
            torrent_path.display()
        );
        println!("Torrent created: {}", torrent_path.display());

        Ok(torrent_path)
    }

    fn resolve_piece_length(&self, total_length: u64) -> Result<u32, TorrentError> {
        match self.piece_length {
            Some(piece_length)
                if !piece_length.is_power_of_two()
                    || !(MIN_PIECE_LENGTH..=MAX_PIECE_LENGTH).contains(&piece_length) =>
            {
                Err(TorrentError::InvalidPieceLength { piece_length })
            }
            Some(piece_length) => Ok(piece_length),
            None => Ok(piece_length_for(total_length)),
        }
    }
}

/// Picks the smallest power-of-two piece length that keeps the piece count
/// at or under the target, clamped to the supported range.
pub fn piece_length_for(total_length: u64) -> u32 {
    let wanted = total_length.div_ceil(TARGET_PIECE_COUNT).max(1);
    let rounded = wanted
        .checked_next_power_of_two()
        .unwrap_or(u64::from(MAX_PIECE_LENGTH));
    rounded.clamp(u64::from(MIN_PIECE_LENGTH), u64::from(MAX_PIECE_LENGTH)) as u32
}

/// Calculates SHA-1 hashes for pieces spanning all files in order
async fn hash_pieces(
    files: &[PathBuf],
    lengths: &[u64],
    piece_length: u32,
) -> Result<Vec<u8>, TorrentError> {
    let piece_size = piece_length as usize;
    let mut pieces = Vec::new();
    let mut buffer = vec![0u8; piece_size];
    let mut filled = 0usize;

    for (path, &expected) in files.iter().zip(lengths) {
        let mut file = File::open(path).await?;
        let mut consumed = 0u64;

        loop {
            let read = file.read(&mut buffer[filled..]).await?;
            if read == 0 {
                break;
            }
            filled += read;
            consumed += read as u64;

            if filled == piece_size {
                pieces.extend_from_slice(&Sha1::digest(&buffer));
                filled = 0;
            }
        }

        if consumed != expected {
            return Err(TorrentError::invalid_input(
                path,
                format!("size changed while hashing ({expected} -> {consumed} bytes)"),
            ));
        }
    }

    if filled > 0 {
        pieces.extend_from_slice(&Sha1::digest(&buffer[..filled]));
    }

    Ok(pieces)
}

fn file_name(path: &Path) -> Result<String, TorrentError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| TorrentError::invalid_input(path, "invalid file name"))
}

/// Path components of each file below the files' deepest common directory
fn relative_paths(files: &[PathBuf]) -> Result<Vec<Vec<String>>, TorrentError> {
    let parents: Vec<Vec<Component<'_>>> = files
        .iter()
        .map(|file| {
            file.parent()
                .map(|parent| parent.components().collect())
                .unwrap_or_default()
        })
        .collect();

    let common = parents.iter().skip(1).fold(parents[0].len(), |shared, parent| {
        parents[0]
            .iter()
            .zip(parent)
            .take(shared)
            .take_while(|(a, b)| a == b)
            .count()
    });

    files
        .iter()
        .map(|file| {
            file.components()
                .skip(common)
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part),
                    _ => None,
                })
                .map(|part| {
                    part.to_str()
                        .map(str::to_string)
                        .ok_or_else(|| TorrentError::invalid_input(file, "path is not UTF-8"))
                })
                .collect::<Result<Vec<String>, TorrentError>>()
        })
        .collect()
}
