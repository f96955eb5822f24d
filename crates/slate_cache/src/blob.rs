//! Compressed blob storage.
//!
//! Every rendered output is stored as its own gzip file at
//! `<cache_dir>/<name>.gz`. Blobs are written once when an element is
//! recorded and read back verbatim on a cache hit.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::CacheError;

/// Extension shared by the data file and every blob.
pub const CACHE_EXT: &str = "gz";

/// Gzip-compresses a byte slice.
pub(crate) fn compress(data: &[u8], path: &Path) -> Result<Vec<u8>, CacheError> {
    let io_err = |e: std::io::Error| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(io_err)?;
    encoder.finish().map_err(io_err)
}

/// Decompresses a gzip stream read from `path`.
pub(crate) fn decompress(raw: &[u8], path: &Path) -> Result<Vec<u8>, CacheError> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(out)
}

/// Store for compressed blobs inside a cache directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Creates a blob store rooted at the given cache directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Returns the file path for a blob name.
    pub fn blob_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{CACHE_EXT}"))
    }

    /// Compresses `bytes` into the blob called `name`, replacing any previous one.
    pub fn write_blob(&self, name: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.blob_path(name);
        let compressed = compress(bytes, &path)?;
        std::fs::write(&path, compressed).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Reads and decompresses the blob called `name`.
    ///
    /// A missing file is an [`CacheError::Io`]; a file that is not a valid
    /// gzip stream is [`CacheError::Corrupt`].
    pub fn read_blob(&self, name: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.blob_path(name);
        let raw = std::fs::read(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        decompress(&raw, &path)
    }

    /// Deletes every `*.gz` file in the directory, data file included.
    ///
    /// Files with that extension are removed even if the cache did not write
    /// them; anything else is left in place.
    ///
    /// Returns the number of files removed. A missing directory counts as empty.
    pub fn purge(&self) -> Result<usize, CacheError> {
        self.remove_matching(|_| true)
    }

    /// Deletes cache files whose stem is not in `live`.
    ///
    /// Cleans up blobs orphaned by a run that stopped between recording an
    /// element and flushing the data file. Returns the number of files removed.
    pub fn gc(&self, live: &HashSet<&str>) -> Result<usize, CacheError> {
        self.remove_matching(|stem| !live.contains(stem))
    }

    fn remove_matching(&self, doomed: impl Fn(&str) -> bool) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if doomed(stem) {
                std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}
