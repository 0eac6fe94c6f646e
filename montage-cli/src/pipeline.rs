//! Run supervisor
//!
//! The pipeline runs in three stages. Each (source, band) unit renders its
//! panel and crops it into a thumbnail in one task, so a panel is released
//! as soon as its thumbnail exists. Strips wait for every unit, and report
//! pages wait for every strip. A failure inside one unit is recorded in that
//! unit's [`UnitReport`] and never stops the rest of the catalog. Only
//! configuration faults that would repeat for every unit abort the run.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use montage_core::{
    BandIndex, BandSet, Catalog, ContrastNormalizer, CoordinateCutoutExtractor, CutoutError,
    EllipseOverlayCalculator, FitsError, ImageBand, PixelScaleResolver, SourceEllipse,
    SourceRecord, RADIO_BAND_INDEX,
};
use montage_render::{
    cutout_name, report_page_name, ArtifactKey, ArtifactStore, Page, PageCropResizeLabeler,
    PageGridPaginator, PanelRenderer, PdfWriter, RenderError, RowCompositor, Stage,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::error::CliError;

#[derive(Debug, Error)]
enum UnitError {
    #[error(transparent)]
    Cutout(#[from] CutoutError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("cutout export failed: {0}")]
    Fits(#[from] FitsError),
}

impl UnitError {
    fn into_outcome(self) -> UnitOutcome {
        let fatal = matches!(
            self,
            UnitError::Render(RenderError::InvalidColor(_) | RenderError::InvalidStyle(_))
        );
        let reason = self.to_string();
        if fatal {
            UnitOutcome::Fatal { reason }
        } else {
            UnitOutcome::Skipped { reason }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Done,
    Skipped { reason: String },
    Fatal { reason: String },
}

impl UnitOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, UnitOutcome::Done)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    /// Catalog ID as written in the catalog
    pub source: String,
    pub band: Option<BandIndex>,
    pub stage: Stage,
    pub outcome: UnitOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub units_done: usize,
    pub units_skipped: usize,
    pub strips: usize,
    pub pages: Vec<PathBuf>,
    pub combined_report: Option<PathBuf>,
    /// Every non-done unit report, in stage then catalog order
    pub skipped: Vec<UnitReport>,
}

impl RunSummary {
    fn record(&mut self, reports: &[UnitReport]) {
        for report in reports {
            if report.outcome.is_done() {
                self.units_done += 1;
            } else {
                self.units_skipped += 1;
                self.skipped.push(report.clone());
            }
        }
    }

    pub fn log(&self) {
        log::info!(
            "Run finished: {} units done, {} skipped, {} strips, {} report pages",
            self.units_done,
            self.units_skipped,
            self.strips,
            self.pages.len()
        );
        for report in &self.skipped {
            if let UnitOutcome::Skipped { reason } | UnitOutcome::Fatal { reason } = &report.outcome {
                match report.band {
                    Some(band) => {
                        log::debug!("  {:?} {}#{}: {}", report.stage, report.source, band, reason)
                    }
                    None => log::debug!("  {:?} {}: {}", report.stage, report.source, reason),
                }
            }
        }
    }
}

/// Open the catalog and every band. Both are fatal when they fail.
pub fn load_inputs(config: &Config) -> Result<(Catalog, BandSet)> {
    let files = &config.files;
    for path in std::iter::once(&files.catalog)
        .chain(std::iter::once(&files.radio))
        .chain(files.optical.iter())
        .chain(files.infrared.iter())
    {
        if !path.exists() {
            return Err(CliError::file_not_found(path.clone()).into());
        }
    }

    let catalog = Catalog::from_path(&files.catalog)
        .map_err(|e| CliError::catalog(files.catalog.clone(), e.to_string()))?;
    log::info!("Loaded {} sources from {}", catalog.len(), files.catalog.display());

    let resolver = PixelScaleResolver::default();
    let bands = BandSet::load(&files.radio, &files.optical, &files.infrared, &resolver)
        .map_err(|e| CliError::band(e.to_string()))?;

    Ok((catalog, bands))
}

pub struct Pipeline<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
    bands: &'a BandSet,
    store: ArtifactStore,
    extractor: CoordinateCutoutExtractor,
    renderer: PanelRenderer,
    labeler: PageCropResizeLabeler,
    compositor: RowCompositor,
    paginator: PageGridPaginator,
    progress: ProgressBar,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, catalog: &'a Catalog, bands: &'a BandSet) -> Result<Self> {
        config.validate()?;
        let style = &config.render;
        let dir = &config.output.directory;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let extractor = CoordinateCutoutExtractor::for_bands(bands, config.parameters.size_arcsec);
        log::info!(
            "Cutout size {} px for {}\" over {} bands",
            extractor.size(),
            config.parameters.size_arcsec,
            bands.len()
        );

        Ok(Self {
            config,
            catalog,
            bands,
            store: ArtifactStore::new(dir, config.output.keep_intermediates),
            extractor,
            renderer: PanelRenderer::new(style)?,
            labeler: PageCropResizeLabeler::new(config.crop_box(), config.target_size(), style)?,
            compositor: RowCompositor::new(style)?,
            paginator: PageGridPaginator::new(config.parameters.number_figures_per_page, style)?,
            progress: ProgressBar::hidden(),
        })
    }

    /// Track unit completion on a progress bar.
    pub fn with_progress(mut self) -> Result<Self> {
        let units = self.catalog.len() * (2 * self.bands.len() + 1);
        let progress = ProgressBar::new(units as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        self.progress = progress;
        Ok(self)
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        self.progress.set_message("Panels");
        let units = self.render_units();
        summary.record(&units);
        check_fatal(&units)?;

        self.progress.set_message("Strips");
        let strips = self.compose_strips(&units);
        summary.record(&strips);
        check_fatal(&strips)?;
        summary.strips = strips
            .iter()
            .filter(|r| r.stage == Stage::Strip && r.outcome.is_done())
            .count();

        self.progress.set_message("Pages");
        let (pages, combined) = self.write_report(&strips)?;
        summary.pages = pages;
        summary.combined_report = combined;

        self.progress.finish_with_message("Done");
        Ok(summary)
    }

    fn units(&self) -> impl ParallelIterator<Item = (&'a SourceRecord, &'a ImageBand)> + '_ {
        let bands = self.bands;
        self.catalog
            .records()
            .par_iter()
            .flat_map(move |record| bands.as_slice().par_iter().map(move |band| (record, band)))
    }

    /// Panel then thumbnail for every (source, band) unit. A unit reports its
    /// panel, and its thumbnail when the panel was rendered.
    pub fn render_units(&self) -> Vec<UnitReport> {
        self.units()
            .map(|(record, band)| {
                let index = band.index();
                let panel = self.panel_unit(record, band);
                let panel = self.finish_unit(record, Some(index), Stage::Panel, panel);
                if !panel.outcome.is_done() {
                    self.progress.inc(1);
                    return vec![panel];
                }
                let thumbnail = self.thumbnail_unit(record, index);
                let thumbnail = self.finish_unit(record, Some(index), Stage::Thumbnail, thumbnail);
                vec![panel, thumbnail]
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    fn panel_unit(&self, record: &SourceRecord, band: &ImageBand) -> Result<(), UnitError> {
        let stem = record.file_stem();
        let cutout = self.extractor.extract(band, record.sky_coord())?;
        if self.config.output.write_cutouts {
            let path = self.store.dir().join(cutout_name(&stem, band.index()));
            cutout.to_fits(band).save(&path)?;
        }

        let normalized = ContrastNormalizer::for_band(band.kind()).normalize(&cutout.data);
        let overlay = EllipseOverlayCalculator::overlay(
            &SourceEllipse::from_record(record),
            &band.scale,
            self.extractor.size(),
        );
        let page = self.renderer.render(&cutout, &normalized, &overlay);
        self.store.put(ArtifactKey::panel(&stem, band.index()), page)?;
        Ok(())
    }

    fn thumbnail_unit(&self, record: &SourceRecord, band: BandIndex) -> Result<(), UnitError> {
        let stem = record.file_stem();
        let panel = self.store.take(&ArtifactKey::panel(&stem, band))?;
        let label = (band == RADIO_BAND_INDEX).then_some(record.id.as_str());
        let thumb = self.labeler.apply(&panel, label)?;
        self.store.put(ArtifactKey::thumbnail(&stem, band), thumb)?;
        Ok(())
    }

    /// Join each source's thumbnails into a strip. Bands whose thumbnail
    /// went missing since [`Pipeline::render_units`] are reported and left
    /// out of the strip.
    pub fn compose_strips(&self, units: &[UnitReport]) -> Vec<UnitReport> {
        let ready: HashSet<(&str, Option<BandIndex>)> = units
            .iter()
            .filter(|r| r.stage == Stage::Thumbnail && r.outcome.is_done())
            .map(|r| (r.source.as_str(), r.band))
            .collect();

        self.catalog
            .records()
            .par_iter()
            .map(|record| {
                let mut reports = Vec::new();
                let mut pages: Vec<Arc<Page>> = Vec::new();
                let stem = record.file_stem();
                for band in self.bands.iter().map(ImageBand::index) {
                    if !ready.contains(&(record.id.as_str(), Some(band))) {
                        continue;
                    }
                    match self.store.take(&ArtifactKey::thumbnail(&stem, band)) {
                        Ok(page) => pages.push(page),
                        Err(e) => reports.push(self.unit_report(
                            record,
                            Some(band),
                            Stage::Thumbnail,
                            Err(e.into()),
                        )),
                    }
                }

                let refs: Vec<&Page> = pages.iter().map(|p| p.as_ref()).collect();
                let outcome = self
                    .compositor
                    .compose(&record.id, &refs)
                    .and_then(|strip| self.store.put(ArtifactKey::strip(&stem), strip))
                    .map(|_| ())
                    .map_err(UnitError::from);
                reports.push(self.finish_unit(record, None, Stage::Strip, outcome));
                reports
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    /// Paginate the composed strips in catalog order and write each report
    /// page, plus the combined report when one is configured.
    pub fn write_report(&self, strips: &[UnitReport]) -> Result<(Vec<PathBuf>, Option<PathBuf>)> {
        let done: HashSet<&str> = strips
            .iter()
            .filter(|r| r.stage == Stage::Strip && r.outcome.is_done())
            .map(|r| r.source.as_str())
            .collect();

        let mut strips: Vec<Arc<Page>> = Vec::new();
        for record in self.catalog.iter().filter(|r| done.contains(r.id.as_str())) {
            match self.store.take(&ArtifactKey::strip(&record.file_stem())) {
                Ok(strip) => strips.push(strip),
                Err(e) => log::warn!("Leaving {} out of the report: {}", record.id, e),
            }
        }

        let refs: Vec<&Page> = strips.iter().map(|p| p.as_ref()).collect();
        let pages = self.paginator.paginate(&refs);
        log::info!(
            "{} strips on {} pages of up to {}",
            refs.len(),
            pages.len(),
            self.paginator.per_page()
        );

        let dir = self.store.dir();
        let mut written = Vec::with_capacity(pages.len());
        for report in &pages {
            let name = report_page_name(report.number);
            let path = dir.join(&name);
            match report.page.write_pdf(&path, &name) {
                Ok(()) => {
                    log::info!("Wrote {} ({} strips)", path.display(), report.rows);
                    written.push(path);
                }
                Err(e) => log::warn!("Skipping report page {}: {}", report.number, e),
            }
        }

        let combined = match &self.config.output.combined_report {
            Some(target) if !pages.is_empty() => {
                let path = if target.is_absolute() { target.clone() } else { dir.join(target) };
                let mut writer = PdfWriter::new("montage report")?;
                for report in &pages {
                    writer.add_page(&report.page);
                }
                writer
                    .write_to_file(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Wrote combined report {}", path.display());
                Some(path)
            }
            _ => None,
        };

        Ok((written, combined))
    }

    fn finish_unit(
        &self,
        record: &SourceRecord,
        band: Option<BandIndex>,
        stage: Stage,
        result: Result<(), UnitError>,
    ) -> UnitReport {
        self.progress.inc(1);
        self.unit_report(record, band, stage, result)
    }

    fn unit_report(
        &self,
        record: &SourceRecord,
        band: Option<BandIndex>,
        stage: Stage,
        result: Result<(), UnitError>,
    ) -> UnitReport {
        let outcome = match result {
            Ok(()) => UnitOutcome::Done,
            Err(e) => e.into_outcome(),
        };
        match (&outcome, band) {
            (UnitOutcome::Done, _) => {
                log::debug!("{:?} {} band {:?} done", stage, record.id, band)
            }
            (UnitOutcome::Skipped { reason } | UnitOutcome::Fatal { reason }, Some(b)) => {
                log::warn!("Skipping {:?} for {} band {}: {}", stage, record.id, b, reason)
            }
            (UnitOutcome::Skipped { reason } | UnitOutcome::Fatal { reason }, None) => {
                log::warn!("Skipping {:?} for {}: {}", stage, record.id, reason)
            }
        }
        UnitReport { source: record.id.clone(), band, stage, outcome }
    }
}

fn check_fatal(reports: &[UnitReport]) -> Result<()> {
    match reports.iter().find_map(|r| match &r.outcome {
        UnitOutcome::Fatal { reason } => Some(reason),
        _ => None,
    }) {
        Some(reason) => Err(CliError::rendering(reason.clone()).into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: UnitOutcome) -> UnitReport {
        UnitReport { source: "S".into(), band: Some(1), stage: Stage::Panel, outcome }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(&[
            report(UnitOutcome::Done),
            report(UnitOutcome::Skipped { reason: "no overlap".into() }),
            report(UnitOutcome::Done),
        ]);
        assert_eq!(summary.units_done, 2);
        assert_eq!(summary.units_skipped, 1);
        assert_eq!(summary.skipped[0].band, Some(1));
    }

    #[test]
    fn test_error_classification() {
        let missing = UnitError::from(RenderError::MissingArtifact { path: "x.pdf".into() });
        assert!(matches!(missing.into_outcome(), UnitOutcome::Skipped { .. }));
        let style = UnitError::from(RenderError::InvalidColor("red".into()));
        assert!(matches!(style.into_outcome(), UnitOutcome::Fatal { .. }));
        assert!(check_fatal(&[report(UnitOutcome::Fatal { reason: "bad".into() })]).is_err());
        assert!(check_fatal(&[report(UnitOutcome::Done)]).is_ok());
    }
}
