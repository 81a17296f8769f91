//! Torrent metadata generation for release assets

pub mod creation;
pub mod metainfo;
pub mod trackers;

use std::fmt;
use std::path::{Path, PathBuf};

pub use creation::{TorrentCreator, TorrentJob};
pub use metainfo::{FileEntry, Info, MetaInfo};
pub use trackers::PUBLIC_TRACKERS;

/// SHA-1 hash identifying a unique torrent.
///
/// 20-byte SHA-1 hash of the bencoded info dictionary. Displayed as
/// lowercase hex, the form clients and trackers print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Errors that can occur while building a torrent.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    #[error("Cannot create a torrent without input files")]
    NoInputFiles,

    #[error("Invalid input file {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Invalid piece length {piece_length}")]
    InvalidPieceLength { piece_length: u32 },

    #[error("Bencode encoding failed: {reason}")]
    Encoding { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TorrentError {
    pub(crate) fn invalid_input(path: &Path, reason: impl Into<String>) -> Self {
        TorrentError::InvalidInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
