//! Integration tests for document export (verse-renderer).
//!
//! Decodes exported PNGs and checks dimensions, background handling and that
//! text lands where the layout engine placed it.

use std::sync::Arc;

use verse_core::layout::{self, TextMeasure};
use verse_core::{Background, Color, Document, ElementPatch, Language};
use verse_renderer::{ExportConfig, ExportMode, Exporter, FontRegistry, RenderError};

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).expect("decode png").to_rgba8()
}

/// Bytes of an installed `.ttf` face that draws Latin text and is (or is
/// not) monospaced.
fn installed_ttf(monospaced: bool) -> Option<Vec<u8>> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let mut paths: Vec<_> = db
        .faces()
        .filter(|face| face.monospaced == monospaced && face.index == 0)
        .filter_map(|face| match &face.source {
            usvg::fontdb::Source::File(path) => Some(path.clone()),
            _ => None,
        })
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
        })
        .collect();
    paths.sort();
    paths
        .into_iter()
        .filter_map(|path| std::fs::read(path).ok())
        .find(|bytes| has_latin_glyphs(bytes))
}

fn has_latin_glyphs(bytes: &[u8]) -> bool {
    ttf_parser::Face::parse(bytes, 0)
        .is_ok_and(|face| "VerseComposer".chars().all(|c| face.glyph_index(c).is_some()))
}

/// Width of `text` from the face's own advance table.
fn advances(bytes: &[u8], text: &str, size: f32) -> f32 {
    let face = ttf_parser::Face::parse(bytes, 0).expect("face");
    let per_em = f32::from(face.units_per_em());
    text.chars()
        .map(|c| {
            let glyph = face.glyph_index(c).expect("glyph");
            f32::from(face.glyph_hor_advance(glyph).expect("advance")) * size / per_em
        })
        .sum()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn painted_inside(pixels: &image::RgbaImage, rect: verse_core::Rect, background: [u8; 4]) -> bool {
    let (w, h) = pixels.dimensions();
    let x0 = rect.x.max(0.0) as u32;
    let y0 = rect.y.max(0.0) as u32;
    let x1 = (rect.right() as u32).min(w - 1);
    let y1 = (rect.bottom() as u32).min(h - 1);
    (y0..=y1).any(|y| (x0..=x1).any(|x| pixels.get_pixel(x, y).0 != background))
}

// ==========================================================================
// Dimensions and background
// ==========================================================================

#[test]
fn test_full_surface_export_at_scale_two() {
    let mut doc = Document::new(800.0, 600.0);
    doc.add(Language::Arabic);
    doc.set_background(Background::Color(Color::rgb(0x20, 0x40, 0x60)));

    let exporter = Exporter::new(ExportConfig::default(), Arc::new(FontRegistry::new()));
    let image = exporter.render(&doc).expect("export");
    let pixels = decode(&image.png);

    assert_eq!(pixels.dimensions(), (1600, 1200));
    assert_eq!(pixels.get_pixel(0, 0).0, [0x20, 0x40, 0x60, 0xff]);
    assert_eq!(pixels.get_pixel(1599, 1199).0, [0x20, 0x40, 0x60, 0xff]);
}

#[test]
fn test_transparent_background_exports_alpha() {
    let mut doc = Document::new(120.0, 80.0);
    doc.add(Language::English);

    let exporter = Exporter::new(
        ExportConfig {
            user_scale: 1,
            ..ExportConfig::default()
        },
        Arc::new(FontRegistry::new()),
    );
    let pixels = decode(&exporter.render(&doc).expect("export").png);
    assert_eq!(pixels.dimensions(), (120, 80));
    assert_eq!(pixels.get_pixel(0, 0).0[3], 0);
}

#[test]
fn test_fractional_surface_rounds_up() {
    let mut doc = Document::new(100.4, 50.6);
    doc.add(Language::Russian);
    let exporter = Exporter::new(
        ExportConfig {
            user_scale: 3,
            ..ExportConfig::default()
        },
        Arc::new(FontRegistry::new()),
    );
    let image = exporter.render(&doc).expect("export");
    assert_eq!((image.width, image.height), (303, 153));
}

#[test]
fn test_content_mode_uses_padded_floor() {
    let mut doc = Document::new(800.0, 600.0);
    doc.add(Language::English);
    doc.export_full_surface = false;

    let exporter = Exporter::new(
        ExportConfig {
            user_scale: 1,
            ..ExportConfig::default()
        },
        Arc::new(FontRegistry::new()),
    );
    let image = exporter.render(&doc).expect("export");
    assert_eq!((image.width, image.height), (800, 600));

    let forced = Exporter::new(
        ExportConfig {
            mode: Some(ExportMode::FullSurface),
            user_scale: 1,
            ..ExportConfig::default()
        },
        Arc::new(FontRegistry::new()),
    );
    assert_eq!(forced.render(&doc).expect("export").width, 800);
}

#[test]
fn test_zero_elements_is_an_error() {
    let doc = Document::new(800.0, 600.0);
    let exporter = Exporter::new(ExportConfig::default(), Arc::new(FontRegistry::new()));
    assert!(matches!(
        exporter.render(&doc),
        Err(RenderError::NothingToExport)
    ));
}

// ==========================================================================
// Custom fonts
// ==========================================================================

#[tokio::test]
async fn test_custom_font_drives_layout_and_paint() {
    let (Some(mono), Some(proportional)) = (installed_ttf(true), installed_ttf(false)) else {
        return;
    };
    let fonts = Arc::new(FontRegistry::new());
    // The language default for English is "Georgia, serif".
    fonts
        .register_bytes("Georgia", proportional)
        .expect("register default");
    fonts
        .register(
            "CustomSerif",
            verse_renderer::FontSource::DataUrl(verse_renderer::fonts::encode_data_url(&mono)),
        )
        .await
        .expect("register");
    assert!(fonts.is_available("CustomSerif"));

    let mut doc = Document::new(800.0, 600.0);
    let id = doc.add(Language::English);
    doc.update(
        id,
        &ElementPatch {
            text: Some("Verse\nComposer".to_string()),
            font_family: Some(Some("CustomSerif".to_string())),
            font_size: Some(40.0),
            ..ElementPatch::default()
        },
    );
    doc.set_background(Background::Color(Color::BLACK));
    doc.settle_layout(&*fonts);

    let el = doc.get(id).expect("element").clone();
    let block = layout::measure_element(&el, &*fonts);
    assert_eq!(block.resolved_family.as_deref(), Some("CustomSerif"));
    assert!((block.line_widths[1] - advances(&mono, "Composer", 40.0)).abs() < 1e-3);

    let default_block = layout::measure_element(
        &verse_core::TextElement {
            font_family: None,
            ..el.clone()
        },
        &*fonts,
    );
    assert_eq!(default_block.resolved_family.as_deref(), Some("Georgia"));
    assert!((block.block_width - default_block.block_width).abs() > 1.0);

    assert!((el.x + block.block_width / 2.0 - 400.0).abs() < 0.01);
    assert!((el.y + block.block_height / 2.0 - 300.0).abs() < 0.01);

    let exporter = Exporter::new(
        ExportConfig {
            user_scale: 1,
            ..ExportConfig::default()
        },
        Arc::clone(&fonts),
    );
    let image = exporter.render(&doc).expect("export");
    assert!(image.unpainted.is_empty());
    let pixels = decode(&image.png);

    let black = [0, 0, 0, 255];
    assert!(
        painted_inside(&pixels, block.rect_at(el.x, el.y), black),
        "text should be painted inside its measured block"
    );
    // Nothing is painted far outside the block.
    assert_eq!(pixels.get_pixel(5, 5).0, black);
}

// ==========================================================================
// Fallback fonts
// ==========================================================================

#[test]
fn test_default_element_paints_with_system_fonts() {
    let fonts = Arc::new(FontRegistry::with_system_fonts());
    if fonts
        .resolve_family(Language::English.default_family(), Language::English)
        .is_none()
    {
        return;
    }
    let mut doc = Document::new(400.0, 200.0);
    let id = doc.add(Language::English);
    doc.set_background(Background::Color(Color::BLACK));
    doc.settle_layout(&*fonts);

    let exporter = Exporter::new(
        ExportConfig {
            user_scale: 1,
            ..ExportConfig::default()
        },
        Arc::clone(&fonts),
    );
    let image = exporter.render(&doc).expect("export");
    assert!(image.unpainted.is_empty());

    let el = doc.get(id).expect("element");
    let rect = layout::measure_element(el, &*fonts).rect_at(el.x, el.y);
    assert!(painted_inside(&decode(&image.png), rect, [0, 0, 0, 255]));
}

#[test]
fn test_fontless_export_reports_unpainted_elements() {
    let mut doc = Document::new(200.0, 100.0);
    let id = doc.add(Language::Arabic);
    let exporter = Exporter::new(ExportConfig::default(), Arc::new(FontRegistry::new()));
    let image = exporter.render(&doc).expect("export");
    assert_eq!(image.unpainted, vec![id]);
}
