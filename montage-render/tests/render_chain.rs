// End-to-end render chain on synthetic cutouts: panel, thumbnail, strip and
// report page, plus the artifact manifest between stages.

use image::Rgb;
use montage_core::{
    ContrastNormalizer, Cutout, EllipseOverlayCalculator, PixelScale, SourceEllipse, BandKind,
};
use montage_render::{
    ArtifactKey, ArtifactStore, CropBox, Page, PageCropResizeLabeler, PageGridPaginator,
    PanelRenderer, RenderStyle, RowCompositor,
};
use ndarray::Array2;

const SIZE: usize = 40;

fn cutout(band: usize, seed: f64) -> Cutout {
    let data = Array2::from_shape_fn((SIZE, SIZE), |(r, c)| {
        let d2 = (r as f64 - 20.0).powi(2) + (c as f64 - 20.0).powi(2);
        seed * (-d2 / 30.0).exp() + 0.01 * ((r * 7 + c * 3) % 5) as f64
    });
    Cutout { band, size: SIZE, data, offset: (0, 0), origin: (0, 0) }
}

fn panel(renderer: &PanelRenderer, band: usize, kind: BandKind) -> Page {
    let cutout = cutout(band, 10.0 + band as f64);
    let normalized = ContrastNormalizer::for_band(kind).normalize(&cutout.data);
    let ellipse = SourceEllipse { major_arcsec: 2.0, minor_arcsec: 1.0, pa_deg: 30.0 };
    let overlay = EllipseOverlayCalculator::overlay(&ellipse, &PixelScale::uniform(0.25), SIZE);
    renderer.render(&cutout, &normalized, &overlay)
}

#[test]
fn test_rendering_is_deterministic() {
    let renderer = PanelRenderer::new(&RenderStyle::default()).unwrap();
    let a = panel(&renderer, 0, BandKind::Radio);
    let b = panel(&renderer, 0, BandKind::Radio);
    assert_eq!(a, b);

    let labeler = PageCropResizeLabeler::new(
        CropBox::new(46.0, 40.0, 323.0, 317.0),
        (300, 300),
        &RenderStyle::default(),
    )
    .unwrap();
    let ta = labeler.apply(&a, Some("SRC")).unwrap();
    let tb = labeler.apply(&b, Some("SRC")).unwrap();
    assert_eq!(ta.raster.as_raw(), tb.raster.as_raw());
}

#[test]
fn test_oversized_crop_on_large_panel_gives_target_size() {
    // A 6 inch panel is 432 pt, so a 400 pt crop box fits
    let style = RenderStyle { panel_size_in: 6.0, ..RenderStyle::default() };
    let renderer = PanelRenderer::new(&style).unwrap();
    let labeler =
        PageCropResizeLabeler::new(CropBox::new(0.0, 0.0, 400.0, 400.0), (300, 300), &style)
            .unwrap();
    for band in 0..4 {
        let kind = if band == 0 { BandKind::Radio } else { BandKind::Optical };
        let label = (band == 0).then_some("SRC");
        let thumb = labeler.apply(&panel(&renderer, band, kind), label).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (300, 300));
        assert_eq!(thumb.annotations.len(), usize::from(band == 0));
    }
}

#[test]
fn test_chain_through_manifest_writes_strip() {
    let style = RenderStyle::default();
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path(), true);
    let renderer = PanelRenderer::new(&style).unwrap();
    let labeler =
        PageCropResizeLabeler::new(CropBox::new(46.0, 40.0, 323.0, 317.0), (300, 300), &style)
            .unwrap();

    let mut thumbs = Vec::new();
    for band in 0..3 {
        let kind = if band == 0 { BandKind::Radio } else { BandKind::Infrared };
        store.put(ArtifactKey::panel("SRC", band), panel(&renderer, band, kind)).unwrap();
        let panel = store.take(&ArtifactKey::panel("SRC", band)).unwrap();
        let thumb = labeler.apply(&panel, (band == 0).then_some("SRC")).unwrap();
        store.put(ArtifactKey::thumbnail("SRC", band), thumb).unwrap();
        thumbs.push(store.take(&ArtifactKey::thumbnail("SRC", band)).unwrap());
    }
    assert!(dir.path().join("montage_SRC_2_cropped.pdf").exists());
    assert!(store.is_empty());

    let refs: Vec<&Page> = thumbs.iter().map(|p| p.as_ref()).collect();
    let strip = RowCompositor::new(&style).unwrap().compose("SRC", &refs).unwrap();
    assert_eq!((strip.width(), strip.height()), (910, 300));

    let path = store.put(ArtifactKey::strip("SRC"), strip).unwrap();
    assert!(path.ends_with("montage_SRC_combination.pdf"));
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
}

#[test]
fn test_report_pages_hold_strips_in_order() {
    let style = RenderStyle::default();
    let compositor = RowCompositor::new(&style).unwrap();
    let shades = [0u8, 60, 120, 180];
    let strips: Vec<Page> = shades
        .iter()
        .map(|&s| {
            let thumb = Page::blank(300, 300, 72.0, Rgb([s, s, s]));
            compositor.compose("x", &[&thumb, &thumb]).unwrap()
        })
        .collect();
    let refs: Vec<&Page> = strips.iter().collect();
    let pages = PageGridPaginator::new(3, &style).unwrap().paginate(&refs);
    assert_eq!(pages.len(), 2);

    // Row centres of the first page carry the strips' shades top to bottom
    let page = &pages[0].page;
    let row_h = page.height() / 3;
    for (i, &s) in shades[..3].iter().enumerate() {
        let y = row_h * i as u32 + row_h / 2;
        assert_eq!(*page.raster.get_pixel(page.width() / 4, y), Rgb([s, s, s]));
    }

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("montage_1.pdf");
    pages[0].page.write_pdf(&out, "montage_1").unwrap();
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
}
