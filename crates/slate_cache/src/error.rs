//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Version or optimize-flag mismatches are not errors: they reset the cache
/// when it is opened. Missing source files and unreadable fingerprint
/// attributes are likewise handled in place. What remains here is either
/// filesystem trouble, persisted state that cannot be decoded, or an identity
/// violation the host has to act on.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A data file or blob could not be decompressed or decoded.
    #[error("corrupt cache file {path}: {reason}")]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// Description of the decoding failure.
        reason: String,
    },

    /// A serialization error occurred while encoding the data file.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A generated fingerprint is already registered as an element id on the slide.
    ///
    /// Fatal: substituting another id would break the cache's identity
    /// guarantees, so the host is expected to abort the run.
    #[error("element id {fingerprint} already exists on slide {slide}")]
    FingerprintCollision {
        /// The colliding fingerprint, in hex.
        fingerprint: String,
        /// The slide on which the id was already registered.
        slide: String,
    },
}

impl CacheError {
    /// Returns `true` for errors the host must treat as fatal for the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CacheError::FingerprintCollision { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/data.gz"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("data.gz"));
    }

    #[test]
    fn corrupt_display() {
        let err = CacheError::Corrupt {
            path: PathBuf::from("abc_svg.gz"),
            reason: "invalid gzip header".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("corrupt cache file"));
        assert!(msg.contains("invalid gzip header"));
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "invalid bincode data".to_string(),
        };
        assert!(err.to_string().contains("invalid bincode data"));
    }

    #[test]
    fn collision_display_and_fatality() {
        let err = CacheError::FingerprintCollision {
            fingerprint: "aabb".to_string(),
            slide: "slide_1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aabb"));
        assert!(msg.contains("slide_1"));
        assert!(err.is_fatal());
    }

    #[test]
    fn io_is_not_fatal() {
        let err = CacheError::Io {
            path: PathBuf::from("x"),
            source: std::io::Error::other("boom"),
        };
        assert!(!err.is_fatal());
    }
}
