//! Storage naming for uploaded assets and the segments derived from them.
//!
//! Every file under the managed storage directory is named after an
//! [`AssetId`]: the transient input is `<id>_input<ext>` and the segments are
//! `<id>_<seq><ext>` with a zero-padded sequence number. Grouping is purely by
//! name prefix; there is no index.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex characters taken from a random UUID for the id suffix.
const SUFFIX_LEN: usize = 8;

/// Longest extension accepted from a client-supplied file name.
const MAX_EXTENSION_LEN: usize = 10;

/// Identifier shared by an uploaded input and all of its segments.
///
/// Built from a second-resolution UTC timestamp plus a random hex suffix, so
/// ids sort by upload time and concurrent uploads in the same second still
/// get distinct names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Generate a new id stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generate a new id stamped with the given time.
    #[must_use]
    pub fn generate_at(now: DateTime<Utc>) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}_{}",
            now.format("%Y%m%d%H%M%S"),
            &random[..SUFFIX_LEN]
        ))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix carried by every file that belongs to this asset.
    pub fn file_prefix(&self) -> String {
        format!("{}_", self.0)
    }

    /// File name of the transient uploaded input.
    pub fn input_name(&self, ext: &Extension) -> String {
        format!("{}_input{}", self.0, ext.as_str())
    }

    /// Segmenter output pattern with a `%03d` sequence placeholder.
    pub fn output_pattern(&self, ext: &Extension) -> String {
        format!("{}_%03d{}", self.0, ext.as_str())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File extension (with leading dot) taken from a client file name.
///
/// Empty when the name has no extension or the extension is not a short
/// ASCII alphanumeric token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension(String);

impl Extension {
    /// Extract a safe extension from an untrusted file name.
    pub fn from_file_name(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| {
                !e.is_empty()
                    && e.len() <= MAX_EXTENSION_LEN
                    && e.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|e| Self(format!(".{}", e.to_ascii_lowercase())))
            .unwrap_or_default()
    }

    /// The extension including its leading dot, or `""`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An uploaded input persisted to storage for the duration of one request.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub id: AssetId,
    pub extension: Extension,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl MediaAsset {
    /// Describe a new asset that will live in `storage_dir`.
    pub fn new(storage_dir: &Path, file_name: &str) -> Self {
        let created_at = Utc::now();
        let id = AssetId::generate_at(created_at);
        let extension = Extension::from_file_name(file_name);
        let path = storage_dir.join(id.input_name(&extension));
        Self {
            id,
            extension,
            path,
            created_at,
        }
    }

    /// File name of the input inside the storage directory.
    pub fn input_name(&self) -> String {
        self.id.input_name(&self.extension)
    }

    /// Full segmenter output pattern inside the storage directory.
    pub fn output_pattern(&self) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(self.id.output_pattern(&self.extension))
    }
}

/// One chunk written by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    /// Bare file name, e.g. `20250101120000_ab12cd34_002.mp4`.
    pub file_name: String,
    /// Full path inside the storage directory.
    pub path: PathBuf,
    /// Asset this segment was split from.
    pub asset_id: AssetId,
}
