//! Artifact manifest
//!
//! Stages hand pages to each other through a typed manifest keyed by
//! (source, band, stage). Entries also land on disk under the run's naming
//! convention: strips always, panels and thumbnails only when intermediates
//! are kept. A persisted entry whose file has since disappeared counts as
//! missing.

use crate::error::{RenderError, Result};
use crate::page::Page;
use dashmap::DashMap;
use montage_core::BandIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Panel,
    Thumbnail,
    Strip,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    /// File-safe source identifier.
    pub source: String,
    pub band: Option<BandIndex>,
    pub stage: Stage,
}

impl ArtifactKey {
    pub fn panel(source: &str, band: BandIndex) -> Self {
        Self { source: source.to_string(), band: Some(band), stage: Stage::Panel }
    }

    pub fn thumbnail(source: &str, band: BandIndex) -> Self {
        Self { source: source.to_string(), band: Some(band), stage: Stage::Thumbnail }
    }

    pub fn strip(source: &str) -> Self {
        Self { source: source.to_string(), band: None, stage: Stage::Strip }
    }

    pub fn file_name(&self) -> String {
        let band = self.band.unwrap_or_default();
        match self.stage {
            Stage::Panel => format!("montage_{}_{}.pdf", self.source, band),
            Stage::Thumbnail => format!("montage_{}_{}_cropped.pdf", self.source, band),
            Stage::Strip => format!("montage_{}_combination.pdf", self.source),
        }
    }
}

pub fn report_page_name(number: usize) -> String {
    format!("montage_{}.pdf", number)
}

pub fn cutout_name(source: &str, band: BandIndex) -> String {
    format!("montage_{}_{}_cutout.fits", source, band)
}

pub struct ArtifactStore {
    dir: PathBuf,
    keep_intermediates: bool,
    entries: DashMap<ArtifactKey, Arc<Page>>,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P, keep_intermediates: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            keep_intermediates,
            entries: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn persists(&self, stage: Stage) -> bool {
        stage == Stage::Strip || self.keep_intermediates
    }

    /// Record a page, writing its PDF when the stage is persisted.
    pub fn put(&self, key: ArtifactKey, page: Page) -> Result<PathBuf> {
        let path = self.path_for(&key);
        if self.persists(key.stage) {
            page.write_pdf(&path, &key.file_name())?;
            log::debug!("wrote {}", path.display());
        }
        self.entries.insert(key, Arc::new(page));
        Ok(path)
    }

    pub fn fetch(&self, key: &ArtifactKey) -> Result<Arc<Page>> {
        let path = self.path_for(key);
        let page = self
            .entries
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RenderError::MissingArtifact { path: path.clone() })?;
        if self.persists(key.stage) && !path.exists() {
            return Err(RenderError::MissingArtifact { path });
        }
        Ok(page)
    }

    /// Fetch and drop the manifest entry; each intermediate is consumed once.
    pub fn take(&self, key: &ArtifactKey) -> Result<Arc<Page>> {
        let page = self.fetch(key);
        self.entries.remove(key);
        page
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
