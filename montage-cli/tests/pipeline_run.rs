// Full runs over a synthetic catalog and two small bands written to a
// scratch directory.

use montage_cli::commands;
use montage_cli::{load_inputs, CliError, Config, Pipeline, UnitOutcome};
use montage_core::{FitsHeader, FitsImage, HeaderValue};
use montage_render::{ArtifactKey, Stage};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RA: f64 = 150.0;
const DEC: f64 = 2.0;

fn write_band(dir: &Path, name: &str, size: usize, arcsec_per_px: f64) -> PathBuf {
    let mut h = FitsHeader::new();
    h.set("CTYPE1", HeaderValue::String("RA---TAN".into()));
    h.set("CTYPE2", HeaderValue::String("DEC--TAN".into()));
    h.set("CRVAL1", HeaderValue::Float(RA));
    h.set("CRVAL2", HeaderValue::Float(DEC));
    let center = size as f64 / 2.0 + 0.5;
    h.set("CRPIX1", HeaderValue::Float(center));
    h.set("CRPIX2", HeaderValue::Float(center));
    h.set("CDELT1", HeaderValue::Float(-arcsec_per_px / 3600.0));
    h.set("CDELT2", HeaderValue::Float(arcsec_per_px / 3600.0));

    let c = center - 1.0;
    let data = Array2::from_shape_fn((size, size), |(r, col)| {
        let d2 = (r as f64 - c).powi(2) + (col as f64 - c).powi(2);
        50.0 * (-d2 / 20.0).exp() + ((r * 13 + col * 7) % 11) as f64 * 0.1
    });

    let path = dir.join(format!("{}.fits", name));
    FitsImage::new(h, data).save(&path).unwrap();
    path
}

/// Radio covers +/-20", optical only +/-15".
fn setup(sources: &[(&str, f64, f64)]) -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    let radio = write_band(dir.path(), "vla", 40, 1.0);
    let optical = write_band(dir.path(), "hst", 60, 0.5);

    let mut csv = String::from("ID,RA,DEC,Major,Minor,PA\n");
    for (id, dra, ddec) in sources {
        csv.push_str(&format!(
            "{},{},{},0.002,0.001,30\n",
            id,
            RA + dra / 3600.0,
            DEC + ddec / 3600.0
        ));
    }
    let catalog = dir.path().join("catalog.csv");
    std::fs::write(&catalog, csv).unwrap();

    let mut config = Config::default();
    config.files.catalog = catalog;
    config.files.radio = radio;
    config.files.optical = vec![optical];
    config.output.directory = dir.path().join("out");
    config.general.progress = false;
    (dir, config)
}

fn seven_sources() -> Vec<(String, f64, f64)> {
    (0..7).map(|i| (format!("J{:02}", i), i as f64 - 3.0, 0.5 * i as f64)).collect()
}

#[test]
fn test_seven_sources_three_per_page() {
    let sources = seven_sources();
    let refs: Vec<(&str, f64, f64)> = sources.iter().map(|(s, a, b)| (s.as_str(), *a, *b)).collect();
    let (_dir, mut config) = setup(&refs);
    config.parameters.number_figures_per_page = 3;

    let summary = commands::run::execute(&config, true).unwrap();
    assert_eq!(summary.strips, 7);
    assert_eq!(summary.units_skipped, 0);
    // panels and thumbnails per (source, band), plus one strip per source
    assert_eq!(summary.units_done, 7 * 2 * 2 + 7);

    let out = &config.output.directory;
    let names: Vec<String> = summary
        .pages
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["montage_1.pdf", "montage_2.pdf", "montage_3.pdf"]);
    assert!(!out.join("montage_4.pdf").exists());

    for (id, _, _) in &sources {
        assert!(out.join(format!("montage_{}_combination.pdf", id)).exists());
        assert!(out.join(format!("montage_{}_0.pdf", id)).exists());
        assert!(out.join(format!("montage_{}_1_cropped.pdf", id)).exists());
    }
    let bytes = std::fs::read(out.join("montage_3.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_band_without_overlap_is_skipped_but_strip_survives() {
    // 25" north is inside the radio image but clear of the optical one
    let (_dir, config) = setup(&[("NEAR", 0.0, 0.0), ("EDGE", 0.0, 25.0)]);

    let summary = commands::run::execute(&config, true).unwrap();
    assert_eq!(summary.strips, 2);
    assert_eq!(summary.pages.len(), 1);
    assert_eq!(summary.skipped.len(), 1);

    let skip = &summary.skipped[0];
    assert_eq!(skip.source, "EDGE");
    assert_eq!(skip.band, Some(1));
    assert_eq!(skip.stage, Stage::Panel);
    assert!(matches!(skip.outcome, UnitOutcome::Skipped { .. }));

    let out = &config.output.directory;
    assert!(out.join("montage_EDGE_0_cropped.pdf").exists());
    assert!(!out.join("montage_EDGE_1.pdf").exists());
    assert!(out.join("montage_EDGE_combination.pdf").exists());
}

#[test]
fn test_source_off_every_band_has_no_strip() {
    let (_dir, config) = setup(&[("A", 0.0, 0.0), ("GONE", 0.0, 120.0), ("B", 1.0, 1.0)]);
    let summary = commands::run::execute(&config, true).unwrap();
    assert_eq!(summary.strips, 2);

    let gone: Vec<_> = summary.skipped.iter().filter(|r| r.source == "GONE").collect();
    // both panels, then the empty strip
    assert_eq!(gone.len(), 3);
    assert_eq!(gone[2].stage, Stage::Strip);
    assert!(!config.output.directory.join("montage_GONE_combination.pdf").exists());
}

#[test]
fn test_memory_only_intermediates_and_extras() {
    let (_dir, mut config) = setup(&[("S1", 0.0, 0.0), ("S2", -2.0, 2.0)]);
    config.output.keep_intermediates = false;
    config.output.write_cutouts = true;
    config.output.combined_report = Some("report.pdf".into());

    let summary = commands::run::execute(&config, true).unwrap();
    let out = &config.output.directory;
    assert!(!out.join("montage_S1_0.pdf").exists());
    assert!(!out.join("montage_S1_0_cropped.pdf").exists());
    assert!(out.join("montage_S1_combination.pdf").exists());
    assert!(out.join("montage_1.pdf").exists());
    assert_eq!(summary.combined_report, Some(out.join("report.pdf")));
    assert!(std::fs::read(out.join("report.pdf")).unwrap().starts_with(b"%PDF"));

    // size 10" at 0.5"/px on the reference band
    let cutout = FitsImage::open(out.join("montage_S1_1_cutout.fits")).unwrap();
    assert_eq!((cutout.width(), cutout.height()), (20, 20));
    assert_eq!(cutout.header.get_str("BAND").map(str::trim), Some("hst"));
}

#[test]
fn test_clean_removes_intermediates_only() {
    let (_dir, config) = setup(&[("C1", 0.0, 0.0), ("C2", 1.0, -1.0)]);
    commands::run::execute(&config, true).unwrap();
    let out = &config.output.directory;

    // One file already gone must not stop the cleanup
    std::fs::remove_file(out.join("montage_C1_1.pdf")).unwrap();
    let removed = commands::clean::execute(&config).unwrap();
    assert_eq!(removed, 7);
    assert!(!out.join("montage_C2_0_cropped.pdf").exists());
    assert!(out.join("montage_C1_combination.pdf").exists());
    assert!(out.join("montage_1.pdf").exists());

    assert_eq!(commands::clean::execute(&config).unwrap(), 0);
}

#[test]
fn test_missing_input_is_fatal() {
    let (_dir, mut config) = setup(&[("A", 0.0, 0.0)]);
    config.files.optical.push("/nonexistent/jwst.fits".into());
    let err = load_inputs(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CliError>(),
        Some(CliError::FileNotFound { .. })
    ));
}

#[test]
fn test_catalog_without_columns_is_fatal() {
    let (dir, mut config) = setup(&[("A", 0.0, 0.0)]);
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "ID,RA,DEC\nA,150,2\n").unwrap();
    config.files.catalog = bad;
    let err = load_inputs(&config).unwrap_err();
    assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Catalog { .. })));
}

#[test]
fn test_pipeline_store_is_drained() {
    let (_dir, config) = setup(&[("D1", 0.0, 0.0)]);
    let (catalog, bands) = load_inputs(&config).unwrap();
    let pipeline = Pipeline::new(&config, &catalog, &bands).unwrap();
    let summary = pipeline.run().unwrap();
    assert_eq!(summary.pages.len(), 1);
    assert!(pipeline.store().is_empty());
}

#[test]
fn test_panels_released_as_thumbnails_finish() {
    let (_dir, mut config) = setup(&[("P1", 0.0, 0.0), ("P2", 1.0, 1.0), ("P3", -1.0, 2.0)]);
    config.output.keep_intermediates = false;
    let (catalog, bands) = load_inputs(&config).unwrap();
    let pipeline = Pipeline::new(&config, &catalog, &bands).unwrap();

    let units = pipeline.render_units();
    assert_eq!(units.len(), 3 * 2 * 2);
    assert!(units.iter().all(|r| r.outcome.is_done()));

    let store = pipeline.store();
    for id in ["P1", "P2", "P3"] {
        for band in 0..2 {
            assert!(!store.contains(&ArtifactKey::panel(id, band)));
            assert!(store.contains(&ArtifactKey::thumbnail(id, band)));
        }
    }
    assert_eq!(store.len(), 6);
}

#[test]
fn test_missing_thumbnail_skips_band_but_strip_survives() {
    let (_dir, config) = setup(&[("SRC", 0.0, 0.0)]);
    let (catalog, bands) = load_inputs(&config).unwrap();
    let pipeline = Pipeline::new(&config, &catalog, &bands).unwrap();

    let units = pipeline.render_units();
    assert_eq!(units.len(), 4);
    let out = &config.output.directory;
    std::fs::remove_file(out.join("montage_SRC_1_cropped.pdf")).unwrap();

    let strips = pipeline.compose_strips(&units);
    assert_eq!(strips.len(), 2);
    assert_eq!(strips[0].stage, Stage::Thumbnail);
    assert_eq!(strips[0].band, Some(1));
    assert!(matches!(strips[0].outcome, UnitOutcome::Skipped { .. }));
    assert_eq!(strips[1].stage, Stage::Strip);
    assert!(strips[1].outcome.is_done());
    assert!(out.join("montage_SRC_combination.pdf").exists());

    let (pages, combined) = pipeline.write_report(&strips).unwrap();
    assert_eq!(pages, vec![out.join("montage_1.pdf")]);
    assert!(combined.is_none());
    assert!(pipeline.store().is_empty());
}
