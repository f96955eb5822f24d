//! Configuration types deserialized from `slate.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".slate-cache";

/// The top-level project configuration parsed from `slate.toml`.
///
/// Every section is optional; a missing file or an empty file yields the
/// same configuration as [`SlateConfig::default`].
#[derive(Debug, Default, Deserialize)]
pub struct SlateConfig {
    /// Render cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Render settings that influence cached output.
    #[serde(default)]
    pub render: RenderConfig,
}

/// Settings for the on-disk render cache.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Whether element output is cached between runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory. Relative paths are resolved against the project root.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
        }
    }
}

impl CacheConfig {
    /// Resolves the cache directory against a project root.
    pub fn resolve_dir(&self, project_root: &Path) -> PathBuf {
        if self.dir.is_absolute() {
            self.dir.clone()
        } else {
            project_root.join(&self.dir)
        }
    }
}

/// Render settings.
///
/// `optimize_svg` changes every SVG the renderer emits, so a cache written
/// under one value is discarded when opened under the other.
#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    /// Run SVG output through the optimizer.
    #[serde(default = "default_true")]
    pub optimize_svg: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { optimize_svg: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}
