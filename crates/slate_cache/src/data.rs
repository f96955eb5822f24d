//! The persisted cache mapping.
//!
//! Stored as `data.gz` in the cache directory: a bincode-encoded [`CacheData`]
//! wrapped in gzip. This file is the only durable record of which elements are
//! cached; blobs it does not reference are never read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use serde::{Deserialize, Serialize};

use crate::blob::{compress, decompress, CACHE_EXT};
use crate::element::OutputKind;
use crate::error::CacheError;
use crate::fingerprint::Fingerprint;

/// Stem of the data file within the cache directory.
pub const DATA_FILE_STEM: &str = "data";

/// Returns the path of the data file inside `cache_dir`.
pub fn data_file_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(format!("{DATA_FILE_STEM}.{CACHE_EXT}"))
}

/// Modification time of a source file, as signed seconds since the Unix epoch.
///
/// Files dated before 1970 have negative `secs`; `nanos` is always the
/// non-negative offset past `secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceStamp {
    /// Whole seconds relative to the Unix epoch.
    pub secs: i64,
    /// Nanoseconds past `secs`.
    pub nanos: u32,
}

impl SourceStamp {
    /// Reads the modification time of `path`, or `None` if it cannot be read.
    pub fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(FileTime::from_last_modification_time(&meta).into())
    }
}

impl From<FileTime> for SourceStamp {
    fn from(t: FileTime) -> Self {
        Self {
            secs: t.unix_seconds(),
            nanos: t.nanoseconds(),
        }
    }
}

/// Everything the cache persists besides the blobs themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    /// Toolchain version that produced this cache. Invalidate on change.
    pub format_version: String,

    /// Optimize-SVG flag in effect when the cache was produced. Invalidate on change.
    pub optimize: bool,

    /// Cached elements by fingerprint.
    pub entries: BTreeMap<Fingerprint, CacheEntry>,

    /// Glyph definitions shared by all cached SVG output.
    pub glyphs: Option<Vec<u8>>,
}

/// Cached state for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Laid-out width.
    pub width: f64,

    /// Laid-out height.
    pub height: f64,

    /// Blob name holding each recorded output.
    pub outputs: BTreeMap<OutputKind, String>,

    /// Modification time of the source file the content names, if any.
    pub source_mtime: Option<SourceStamp>,
}

impl CacheEntry {
    /// Creates an entry with no outputs and no source tracking.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            outputs: BTreeMap::new(),
            source_mtime: None,
        }
    }

    /// Returns `true` if the entry may be reused given the source file's
    /// current modification time.
    ///
    /// Entries without a recorded time are always fresh.
    pub fn is_fresh(&self, current_mtime: Option<SourceStamp>) -> bool {
        match self.source_mtime {
            None => true,
            Some(recorded) => current_mtime == Some(recorded),
        }
    }
}

impl CacheData {
    /// Creates an empty mapping stamped with the given identity.
    pub fn new(format_version: &str, optimize: bool) -> Self {
        Self {
            format_version: format_version.to_string(),
            optimize,
            entries: BTreeMap::new(),
            glyphs: None,
        }
    }

    /// Loads the data file from `cache_dir`.
    ///
    /// Returns `Ok(None)` if there is no data file. A file that exists but
    /// cannot be decompressed or decoded is [`CacheError::Corrupt`].
    pub fn load(cache_dir: &Path) -> Result<Option<Self>, CacheError> {
        let path = data_file_path(cache_dir);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        let bytes = decompress(&raw, &path)?;
        let (data, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| CacheError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(data))
    }

    /// Writes the data file to `cache_dir`, replacing any previous one.
    ///
    /// Creates the cache directory if it doesn't exist.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = data_file_path(cache_dir);
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(
            |e| CacheError::Serialization {
                reason: e.to_string(),
            },
        )?;
        let compressed = compress(&bytes, &path)?;
        std::fs::write(&path, compressed).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if this mapping was produced under the given identity.
    pub fn is_compatible(&self, format_version: &str, optimize: bool) -> bool {
        self.format_version == format_version && self.optimize == optimize
    }
}
