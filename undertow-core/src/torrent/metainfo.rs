//! Bencoded `.torrent` document model

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::{InfoHash, TorrentError};

/// Top-level `.torrent` dictionary.
///
/// `serde_bencode` writes dictionary keys in sorted order, so field order
/// here does not affect the encoded bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub announce: String,
    #[serde(rename = "announce-list")]
    pub announce_list: Vec<Vec<String>>,
    #[serde(rename = "created by")]
    pub created_by: String,
    #[serde(rename = "creation date")]
    pub creation_date: i64,
    pub info: Info,
    /// BEP 19 web seeds
    #[serde(rename = "url-list")]
    pub url_list: Vec<String>,
}

/// Info dictionary; its bencoded form is what the info hash covers.
///
/// Exactly one of `length` (single file) or `files` (multi-file) is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    pub name: String,
    #[serde(rename = "piece length")]
    pub piece_length: u64,
    /// Concatenated 20-byte SHA-1 piece hashes
    #[serde(with = "serde_bytes")]
    pub pieces: Vec<u8>,
}

/// One file of a multi-file torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub length: u64,
    pub path: Vec<String>,
}

impl MetaInfo {
    /// Encodes the document as bencode.
    ///
    /// # Errors
    /// - `TorrentError::Encoding` - Serializer rejected a value
    pub fn to_bytes(&self) -> Result<Vec<u8>, TorrentError> {
        serde_bencode::to_bytes(self).map_err(|e| TorrentError::Encoding {
            reason: e.to_string(),
        })
    }

    /// Decodes a bencoded `.torrent` document.
    ///
    /// # Errors
    /// - `TorrentError::Encoding` - Bytes are not a valid torrent dictionary
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TorrentError> {
        serde_bencode::from_bytes(bytes).map_err(|e| TorrentError::Encoding {
            reason: e.to_string(),
        })
    }

    /// Calculates the SHA-1 of the bencoded info dictionary.
    ///
    /// # Errors
    /// - `TorrentError::Encoding` - Info dictionary could not be encoded
    pub fn info_hash(&self) -> Result<InfoHash, TorrentError> {
        let encoded = serde_bencode::to_bytes(&self.info).map_err(|e| TorrentError::Encoding {
            reason: e.to_string(),
        })?;
        let digest = Sha1::digest(&encoded);
        Ok(InfoHash::new(digest.into()))
    }
}

impl Info {
    /// Number of pieces described by the `pieces` string.
    pub fn piece_count(&self) -> usize {
        self.pieces.len() / 20
    }

    /// Total payload size across all files.
    pub fn total_length(&self) -> u64 {
        match (&self.files, self.length) {
            (Some(files), _) => files.iter().map(|f| f.length).sum(),
            (None, Some(length)) => length,
            (None, None) => 0,
        }
    }
}
