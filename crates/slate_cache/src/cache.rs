//! High-level render cache.
//!
//! [`RenderCache`] ties the persisted [`CacheData`], the blob store and the
//! fingerprint generator into the interface the rendering pipeline uses: ask
//! whether an element is cached (restoring its output on a hit), record an
//! element after rendering it, and flush at the end of the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use slate_config::CacheConfig;

use crate::blob::BlobStore;
use crate::data::{CacheData, CacheEntry, SourceStamp, DATA_FILE_STEM};
use crate::document::{Document, GLYPHS_KEY};
use crate::element::{OutputKind, Renderable};
use crate::error::CacheError;
use crate::fingerprint::{fingerprint, Fingerprint, FingerprintOptions};

/// Name of the blob holding one output of one element.
///
/// Derived from the fingerprint, so re-recording an element overwrites its
/// previous blobs instead of leaving them behind.
pub fn blob_name(fp: &Fingerprint, kind: OutputKind) -> String {
    format!("{fp}_{}", kind.suffix())
}

/// Per-element output cache for one rendering run.
///
/// Owns its directory exclusively for the duration of the run; concurrent
/// use of the same directory from two processes is not supported.
pub struct RenderCache {
    /// Root directory for all cache files.
    cache_dir: PathBuf,

    /// In-memory mapping, persisted by [`RenderCache::write_cache`].
    data: CacheData,

    /// Compressed blob storage.
    blobs: BlobStore,
}

impl RenderCache {
    /// Opens the cache in `cache_dir` for the given document.
    ///
    /// Creates the directory if needed. A cache written by another toolchain
    /// version or under a different optimize-SVG setting is discarded along
    /// with every file in the directory. Otherwise, stored glyph definitions
    /// are restored into the document's global store.
    pub fn open(cache_dir: &Path, doc: &mut Document) -> Result<Self, CacheError> {
        let blobs = BlobStore::new(cache_dir);

        let loaded = if cache_dir.is_dir() {
            CacheData::load(cache_dir)?
        } else {
            std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
                path: cache_dir.to_path_buf(),
                source: e,
            })?;
            None
        };

        let mut data = match loaded {
            Some(data) if !data.is_compatible(&doc.version, doc.optimize_svg) => {
                if data.format_version != doc.version {
                    tracing::info!(
                        cached = %data.format_version,
                        current = %doc.version,
                        "cache written by another version, resetting"
                    );
                } else {
                    tracing::info!(
                        optimize_svg = doc.optimize_svg,
                        "optimize setting changed, resetting cache"
                    );
                }
                blobs.purge()?;
                CacheData::new(&doc.version, doc.optimize_svg)
            }
            Some(data) => {
                if let Some(glyphs) = &data.glyphs {
                    doc.global_store
                        .insert(GLYPHS_KEY.to_string(), glyphs.clone());
                }
                tracing::debug!(entries = data.entries.len(), "loaded render cache");
                data
            }
            None => {
                // A directory with blobs but no data file only holds orphans.
                blobs.purge()?;
                CacheData::new(&doc.version, doc.optimize_svg)
            }
        };

        data.format_version = doc.version.clone();
        data.optimize = doc.optimize_svg;

        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            data,
            blobs,
        })
    }

    /// Opens the cache described by a project's configuration.
    ///
    /// Returns `Ok(None)` when caching is disabled.
    pub fn from_config(
        project_root: &Path,
        config: &CacheConfig,
        doc: &mut Document,
    ) -> Result<Option<Self>, CacheError> {
        if !config.enabled {
            tracing::debug!("render cache disabled");
            return Ok(None);
        }
        Self::open(&config.resolve_dir(project_root), doc).map(Some)
    }

    /// Checks whether `element` is cached and still valid.
    ///
    /// On a hit the element's outputs are replaced by the cached blobs and
    /// its size by the cached size. Group elements are never cached. An entry
    /// that tracks a source file is stale once the file's modification time
    /// differs from the recorded one, or the file is gone.
    pub fn is_cached<R: Renderable + ?Sized>(
        &self,
        doc: &Document,
        slide_id: &str,
        element: &mut R,
    ) -> Result<bool, CacheError> {
        if element.kind().is_group() {
            return Ok(false);
        }

        let Some(fp) = fingerprint(doc, slide_id, &*element, FingerprintOptions::ELEMENT_EQUALITY)?
        else {
            return Ok(false);
        };

        let Some(entry) = self.data.entries.get(&fp) else {
            tracing::debug!(fingerprint = %fp, "cache miss");
            return Ok(false);
        };

        if entry.source_mtime.is_some() {
            let current = element.source_path().and_then(SourceStamp::of);
            if !entry.is_fresh(current) {
                tracing::debug!(fingerprint = %fp, "source file changed, cache miss");
                return Ok(false);
            }
        }

        // Read everything before touching the element, so a failed read
        // leaves it exactly as it was.
        let mut restored = Vec::with_capacity(entry.outputs.len());
        for (kind, name) in &entry.outputs {
            restored.push((*kind, self.blobs.read_blob(name)?));
        }

        for (kind, bytes) in restored {
            element.set_output(kind, bytes);
        }
        element.update_size(entry.width, entry.height);

        tracing::debug!(fingerprint = %fp, "cache hit");
        Ok(true)
    }

    /// Records the rendered output of `element`.
    ///
    /// Does nothing for group elements, elements that have not been rendered,
    /// and elements with no fingerprint material. Blobs are written
    /// immediately; the entry itself only reaches disk on the next
    /// [`RenderCache::write_cache`].
    pub fn record_element<R: Renderable + ?Sized>(
        &mut self,
        doc: &Document,
        slide_id: &str,
        element: &R,
    ) -> Result<(), CacheError> {
        if element.kind().is_group() || !element.is_rendered() {
            return Ok(());
        }

        let Some(fp) = fingerprint(doc, slide_id, element, FingerprintOptions::ELEMENT_EQUALITY)?
        else {
            return Ok(());
        };

        let (width, height) = element.layout_size();
        let mut entry = CacheEntry::new(width, height);

        for kind in OutputKind::ALL {
            if let Some(bytes) = element.output(kind) {
                let name = blob_name(&fp, kind);
                self.blobs.write_blob(&name, bytes)?;
                entry.outputs.insert(kind, name);
            }
        }

        entry.source_mtime = element.source_path().and_then(SourceStamp::of);

        tracing::debug!(
            fingerprint = %fp,
            outputs = entry.outputs.len(),
            tracks_source = entry.source_mtime.is_some(),
            "recorded element"
        );
        self.data.entries.insert(fp, entry);
        Ok(())
    }

    /// Persists the mapping to the data file.
    ///
    /// Glyph definitions currently in the document's global store are saved
    /// alongside the entries.
    pub fn write_cache(&mut self, doc: &Document) -> Result<(), CacheError> {
        if let Some(glyphs) = doc.global_store.get(GLYPHS_KEY) {
            self.data.glyphs = Some(glyphs.clone());
        }
        self.data.save(&self.cache_dir)?;
        tracing::info!(
            entries = self.data.entries.len(),
            dir = %self.cache_dir.display(),
            "wrote render cache"
        );
        Ok(())
    }

    /// Removes the cache directory and empties the mapping.
    ///
    /// Only an empty directory is removed; anything left inside it is an
    /// error and the mapping is kept.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        if self.cache_dir.is_dir() {
            std::fs::remove_dir(&self.cache_dir).map_err(|e| CacheError::Io {
                path: self.cache_dir.clone(),
                source: e,
            })?;
        }
        self.data = CacheData::new(&self.data.format_version, self.data.optimize);
        Ok(())
    }

    /// Deletes blob files no entry references.
    ///
    /// Returns the number of files removed. The data file is kept.
    pub fn gc(&self) -> Result<usize, CacheError> {
        let mut live: HashSet<&str> = self
            .data
            .entries
            .values()
            .flat_map(|e| e.outputs.values().map(String::as_str))
            .collect();
        live.insert(DATA_FILE_STEM);
        self.blobs.gc(&live)
    }

    /// Returns the cached entry for a fingerprint.
    pub fn entry(&self, fp: &Fingerprint) -> Option<&CacheEntry> {
        self.data.entries.get(fp)
    }

    /// Returns the in-memory mapping.
    pub fn data(&self) -> &CacheData {
        &self.data
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Number of cached elements.
    pub fn len(&self) -> usize {
        self.data.entries.len()
    }

    /// Returns `true` if no element is cached.
    pub fn is_empty(&self) -> bool {
        self.data.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_file_path;
    use crate::element::{Element, ElementKind};
    use filetime::FileTime;

    const VERSION: &str = "0.9.0";

    fn rendered_text(content: &str) -> Element {
        let mut el = Element::new(ElementKind::Text).with_content(content);
        el.render(
            [
                (OutputKind::Svg, format!("<g>{content}</g>").into_bytes()),
                (OutputKind::Html, b"<div/>".to_vec()),
            ],
            64.0,
            12.5,
        );
        el
    }

    fn make_cache() -> (tempfile::TempDir, Document, RenderCache) {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new(VERSION, true);
        let cache = RenderCache::open(&dir.path().join("cache"), &mut doc).unwrap();
        (dir, doc, cache)
    }

    fn blob_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "gz"))
            .count()
    }

    #[test]
    fn open_creates_directory() {
        let (dir, _doc, cache) = make_cache();
        assert!(dir.path().join("cache").is_dir());
        assert!(cache.is_empty());
        assert_eq!(cache.data().format_version, VERSION);
        assert!(cache.data().optimize);
    }

    #[test]
    fn record_then_lookup_restores_output() {
        let (_dir, doc, mut cache) = make_cache();
        let original = rendered_text("hello");
        cache.record_element(&doc, "slide_0", &original).unwrap();
        assert_eq!(cache.len(), 1);

        let mut fresh = Element::new(ElementKind::Text).with_content("hello");
        assert!(cache.is_cached(&doc, "slide_4", &mut fresh).unwrap());
        assert_eq!(fresh.output(OutputKind::Svg), original.output(OutputKind::Svg));
        assert_eq!(fresh.output(OutputKind::Html), Some(&b"<div/>"[..]));
        assert!(fresh.output(OutputKind::Js).is_none());
        assert_eq!(fresh.layout_size(), (64.0, 12.5));
    }

    #[test]
    fn unknown_element_is_a_miss() {
        let (_dir, doc, cache) = make_cache();
        let mut el = Element::new(ElementKind::Text).with_content("never seen");
        assert!(!cache.is_cached(&doc, "slide_0", &mut el).unwrap());
        assert!(el.output(OutputKind::Svg).is_none());
    }

    #[test]
    fn blob_names_are_deterministic() {
        let (dir, doc, mut cache) = make_cache();
        let el = rendered_text("stable");
        cache.record_element(&doc, "slide_0", &el).unwrap();
        let fp = fingerprint(&doc, "slide_0", &el, FingerprintOptions::ELEMENT_EQUALITY)
            .unwrap()
            .unwrap();
        let entry = cache.entry(&fp).unwrap();
        assert_eq!(entry.outputs[&OutputKind::Svg], format!("{fp}_svg"));
        assert!(dir.path().join("cache").join(format!("{fp}_svg.gz")).exists());
    }

    #[test]
    fn unrendered_element_is_not_recorded() {
        let (_dir, doc, mut cache) = make_cache();
        let el = Element::new(ElementKind::Text).with_content("draft");
        cache.record_element(&doc, "slide_0", &el).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn group_is_never_cached() {
        let (_dir, doc, mut cache) = make_cache();
        let mut group = Element::new(ElementKind::Group).with_content("children");
        group.render([(OutputKind::Svg, b"<g/>".to_vec())], 10.0, 10.0);
        cache.record_element(&doc, "slide_0", &group).unwrap();
        assert!(cache.is_empty());

        // Even with a matching entry planted under its fingerprint.
        let fp = fingerprint(&doc, "slide_0", &group, FingerprintOptions::ELEMENT_EQUALITY)
            .unwrap()
            .unwrap();
        cache.data.entries.insert(fp, CacheEntry::new(1.0, 1.0));
        assert!(!cache.is_cached(&doc, "slide_0", &mut group).unwrap());
    }

    #[test]
    fn element_without_material_is_skipped() {
        let (_dir, doc, mut cache) = make_cache();
        let mut el = Element::new(ElementKind::Svg).with_name(None);
        el.render([(OutputKind::Svg, b"<svg/>".to_vec())], 1.0, 1.0);
        cache.record_element(&doc, "slide_0", &el).unwrap();
        assert!(cache.is_empty());
        assert!(!cache.is_cached(&doc, "slide_0", &mut el).unwrap());
    }

    #[test]
    fn inline_content_has_no_source_tracking() {
        let (_dir, doc, mut cache) = make_cache();
        let el = rendered_text("\\frac{a}{b}");
        cache.record_element(&doc, "slide_0", &el).unwrap();
        let entry = cache.data().entries.values().next().unwrap();
        assert!(entry.source_mtime.is_none());
    }

    #[test]
    fn source_file_staleness() {
        let (dir, doc, mut cache) = make_cache();
        let src = dir.path().join("plot.svg");
        std::fs::write(&src, "<svg/>").unwrap();
        let t0 = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, t0).unwrap();

        let mut el = Element::new(ElementKind::Svg).with_content(src.to_string_lossy());
        el.render([(OutputKind::Svg, b"<svg/>".to_vec())], 100.0, 50.0);
        cache.record_element(&doc, "slide_0", &el).unwrap();
        assert!(cache.data().entries.values().next().unwrap().source_mtime.is_some());

        let mut lookup = Element::new(ElementKind::Svg).with_content(src.to_string_lossy());
        assert!(cache.is_cached(&doc, "slide_0", &mut lookup).unwrap());

        filetime::set_file_mtime(&src, FileTime::from_unix_time(1_600_000_100, 0)).unwrap();
        let mut lookup = Element::new(ElementKind::Svg).with_content(src.to_string_lossy());
        assert!(!cache.is_cached(&doc, "slide_0", &mut lookup).unwrap());
        assert!(lookup.output(OutputKind::Svg).is_none());

        filetime::set_file_mtime(&src, t0).unwrap();
        let mut lookup = Element::new(ElementKind::Svg).with_content(src.to_string_lossy());
        assert!(cache.is_cached(&doc, "slide_0", &mut lookup).unwrap());
    }

    #[test]
    fn deleted_source_file_is_a_miss() {
        let (dir, doc, mut cache) = make_cache();
        let src = dir.path().join("photo.png");
        std::fs::write(&src, [0u8; 8]).unwrap();

        let mut el = Element::new(ElementKind::Image).with_content(src.to_string_lossy());
        el.render([(OutputKind::Html, b"<img/>".to_vec())], 10.0, 10.0);
        cache.record_element(&doc, "slide_0", &el).unwrap();

        std::fs::remove_file(&src).unwrap();
        let mut lookup = Element::new(ElementKind::Image).with_content(src.to_string_lossy());
        assert!(!cache.is_cached(&doc, "slide_0", &mut lookup).unwrap());
    }

    #[test]
    fn persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        {
            let mut doc = Document::new(VERSION, true);
            let mut cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
            cache
                .record_element(&doc, "slide_0", &rendered_text("persist me"))
                .unwrap();
            cache.write_cache(&doc).unwrap();
        }

        let mut doc = Document::new(VERSION, true);
        let cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert_eq!(cache.len(), 1);
        let mut el = Element::new(ElementKind::Text).with_content("persist me");
        assert!(cache.is_cached(&doc, "slide_0", &mut el).unwrap());
        assert_eq!(el.output(OutputKind::Svg), Some(&b"<g>persist me</g>"[..]));
    }

    #[test]
    fn unflushed_records_are_lost() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        {
            let mut doc = Document::new(VERSION, true);
            let mut cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
            cache.write_cache(&doc).unwrap();
            cache
                .record_element(&doc, "slide_0", &rendered_text("lost"))
                .unwrap();
        }

        let mut doc = Document::new(VERSION, true);
        let cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn version_change_resets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        {
            let mut doc = Document::new(VERSION, true);
            let mut cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
            cache
                .record_element(&doc, "slide_0", &rendered_text("old"))
                .unwrap();
            cache.write_cache(&doc).unwrap();
        }
        assert!(blob_files(&cache_dir) > 0);

        let mut doc = Document::new("1.0.0", true);
        let cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.data().format_version, "1.0.0");
        assert_eq!(blob_files(&cache_dir), 0);
    }

    #[test]
    fn optimize_change_resets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        {
            let mut doc = Document::new(VERSION, true);
            doc.global_store
                .insert(GLYPHS_KEY.to_string(), b"<defs/>".to_vec());
            let mut cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
            cache
                .record_element(&doc, "slide_0", &rendered_text("old"))
                .unwrap();
            cache.write_cache(&doc).unwrap();
        }

        let mut doc = Document::new(VERSION, false);
        let cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert!(cache.is_empty());
        assert!(!cache.data().optimize);
        assert!(!doc.global_store.contains_key(GLYPHS_KEY));
        assert_eq!(blob_files(&cache_dir), 0);
    }

    #[test]
    fn glyphs_survive_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        {
            let mut doc = Document::new(VERSION, true);
            let mut cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
            doc.global_store
                .insert(GLYPHS_KEY.to_string(), b"<symbol id='g1'/>".to_vec());
            cache.write_cache(&doc).unwrap();
        }

        let mut doc = Document::new(VERSION, true);
        RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert_eq!(
            doc.global_store.get(GLYPHS_KEY).map(Vec::as_slice),
            Some(&b"<symbol id='g1'/>"[..])
        );
    }

    #[test]
    fn flush_is_idempotent() {
        let (_dir, doc, mut cache) = make_cache();
        cache
            .record_element(&doc, "slide_0", &rendered_text("twice"))
            .unwrap();

        cache.write_cache(&doc).unwrap();
        let first = CacheData::load(cache.dir()).unwrap().unwrap();
        let first_bytes = std::fs::read(data_file_path(cache.dir())).unwrap();

        cache.write_cache(&doc).unwrap();
        let second = CacheData::load(cache.dir()).unwrap().unwrap();
        let second_bytes = std::fs::read(data_file_path(cache.dir())).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn collision_surfaces_as_fatal_error() {
        let (_dir, mut doc, mut cache) = make_cache();
        let el = rendered_text("clash");
        let fp = fingerprint(&doc, "slide_0", &el, FingerprintOptions::ELEMENT_EQUALITY)
            .unwrap()
            .unwrap();
        doc.register_element("slide_0", fp.to_string());

        let err = cache.record_element(&doc, "slide_0", &el).unwrap_err();
        assert!(err.is_fatal());
        assert!(cache.is_empty());

        let mut lookup = Element::new(ElementKind::Text).with_content("clash");
        let err = cache.is_cached(&doc, "slide_0", &mut lookup).unwrap_err();
        assert!(matches!(err, CacheError::FingerprintCollision { .. }));
    }

    #[test]
    fn missing_blob_is_an_error() {
        let (_dir, doc, mut cache) = make_cache();
        let el = rendered_text("vanishing");
        cache.record_element(&doc, "slide_0", &el).unwrap();
        let name = cache
            .data()
            .entries
            .values()
            .next()
            .unwrap()
            .outputs[&OutputKind::Svg]
            .clone();
        std::fs::remove_file(cache.blobs.blob_path(&name)).unwrap();

        let mut lookup = Element::new(ElementKind::Text).with_content("vanishing");
        let err = cache.is_cached(&doc, "slide_0", &mut lookup).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
    }

    #[test]
    fn failed_blob_read_leaves_element_untouched() {
        let (_dir, doc, mut cache) = make_cache();
        let el = rendered_text("half gone");
        cache.record_element(&doc, "slide_0", &el).unwrap();
        let name = cache.data().entries.values().next().unwrap().outputs[&OutputKind::Html]
            .clone();
        std::fs::remove_file(cache.blobs.blob_path(&name)).unwrap();

        let mut lookup = Element::new(ElementKind::Text).with_content("half gone");
        assert!(cache.is_cached(&doc, "slide_0", &mut lookup).is_err());
        assert!(lookup.output(OutputKind::Svg).is_none());
        assert!(lookup.output(OutputKind::Html).is_none());
        assert_eq!(lookup.layout_size(), (0.0, 0.0));
    }

    #[test]
    fn pre_epoch_source_file_survives_flush() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let src = dir.path().join("ancient.svg");
        std::fs::write(&src, "<svg/>").unwrap();
        filetime::set_file_mtime(&src, FileTime::from_unix_time(-100, 0)).unwrap();

        {
            let mut doc = Document::new(VERSION, true);
            let mut cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
            cache
                .record_element(&doc, "slide_0", &rendered_text("inline"))
                .unwrap();
            let mut el = Element::new(ElementKind::Svg).with_content(src.to_string_lossy());
            el.render([(OutputKind::Svg, b"<svg/>".to_vec())], 5.0, 5.0);
            cache.record_element(&doc, "slide_0", &el).unwrap();
            cache.write_cache(&doc).unwrap();
        }

        let mut doc = Document::new(VERSION, true);
        let cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert_eq!(cache.len(), 2);
        let mut lookup = Element::new(ElementKind::Svg).with_content(src.to_string_lossy());
        assert!(cache.is_cached(&doc, "slide_0", &mut lookup).unwrap());
        assert_eq!(lookup.layout_size(), (5.0, 5.0));
    }

    #[test]
    fn stray_blobs_without_data_file_are_purged() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        BlobStore::new(&cache_dir)
            .write_blob("leftover_svg", b"<g/>")
            .unwrap();
        assert_eq!(blob_files(&cache_dir), 1);

        let mut doc = Document::new(VERSION, true);
        let cache = RenderCache::open(&cache_dir, &mut doc).unwrap();
        assert!(cache.is_empty());
        assert_eq!(blob_files(&cache_dir), 0);
        assert!(cache_dir.is_dir());
    }

    #[test]
    fn corrupt_data_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(data_file_path(&cache_dir), b"definitely not gzip").unwrap();

        let mut doc = Document::new(VERSION, true);
        let err = RenderCache::open(&cache_dir, &mut doc).err().unwrap();
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[test]
    fn clear_removes_empty_directory() {
        let (dir, _doc, mut cache) = make_cache();
        cache.clear().unwrap();
        assert!(!dir.path().join("cache").exists());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_refuses_non_empty_directory() {
        let (dir, doc, mut cache) = make_cache();
        cache
            .record_element(&doc, "slide_0", &rendered_text("kept"))
            .unwrap();
        let err = cache.clear().unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
        assert!(dir.path().join("cache").is_dir());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn gc_removes_orphaned_blobs() {
        let (_dir, doc, mut cache) = make_cache();
        cache
            .record_element(&doc, "slide_0", &rendered_text("live"))
            .unwrap();
        cache.write_cache(&doc).unwrap();
        cache.blobs.write_blob("orphan_svg", b"stale").unwrap();

        assert_eq!(cache.gc().unwrap(), 1);
        assert!(data_file_path(cache.dir()).exists());
        let mut el = Element::new(ElementKind::Text).with_content("live");
        assert!(cache.is_cached(&doc, "slide_0", &mut el).unwrap());
    }

    #[test]
    fn from_config_respects_enabled_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new(VERSION, true);

        let disabled = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        assert!(RenderCache::from_config(dir.path(), &disabled, &mut doc)
            .unwrap()
            .is_none());

        let cache = RenderCache::from_config(dir.path(), &CacheConfig::default(), &mut doc)
            .unwrap()
            .unwrap();
        assert_eq!(cache.dir(), dir.path().join(".slate-cache").as_path());
    }

    #[test]
    fn toggling_optimize_in_config_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let config = slate_config::SlateConfig::default();
        {
            let mut doc = Document::from_config(VERSION, &config);
            let mut cache = RenderCache::from_config(dir.path(), &config.cache, &mut doc)
                .unwrap()
                .unwrap();
            cache
                .record_element(&doc, "slide_0", &rendered_text("x"))
                .unwrap();
            cache.write_cache(&doc).unwrap();
        }

        let config =
            slate_config::load_config_from_str("[render]\noptimize_svg = false\n").unwrap();
        let mut doc = Document::from_config(VERSION, &config);
        let cache = RenderCache::from_config(dir.path(), &config.cache, &mut doc)
            .unwrap()
            .unwrap();
        assert!(cache.is_empty());
        assert!(!cache.data().optimize);
    }
}
