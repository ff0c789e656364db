//! SVG scene writer shared by export and preview, plus rasterization.
//!
//! Both paths build an SVG document in surface coordinates, parse it with
//! usvg against the font registry's database and paint it with resvg.

use std::fmt::Write;
use std::sync::Arc;

use usvg::fontdb;
use verse_core::layout::{self, Rect, TextMeasure};
use verse_core::{Color, TextElement};

use crate::error::{RenderError, RenderResult};

/// An SVG document under construction.
///
/// `bounds` is the region of the surface that becomes the image; `scale`
/// maps one surface unit to that many pixels.
#[derive(Debug)]
pub struct SvgCanvas {
    svg: String,
    bounds: Rect,
    pixel_width: u32,
    pixel_height: u32,
}

impl SvgCanvas {
    /// Start a document showing `bounds` at `scale`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn new(bounds: Rect, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let pixel_width = ((bounds.width * scale).ceil() as u32).max(1);
        let pixel_height = ((bounds.height * scale).ceil() as u32).max(1);
        let view_w = pixel_width as f32 / scale;
        let view_h = pixel_height as f32 / scale;

        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{pixel_width}\" height=\"{pixel_height}\" viewBox=\"{} {} {view_w} {view_h}\">",
            bounds.x, bounds.y,
        );
        Self {
            svg,
            bounds,
            pixel_width,
            pixel_height,
        }
    }

    /// Output size in pixels.
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixel_width, self.pixel_height)
    }

    /// Paint the whole visible region.
    pub fn fill(&mut self, color: Color) {
        let b = self.bounds;
        let _ = write!(
            self.svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>",
            b.x,
            b.y,
            b.width,
            b.height,
            paint_attrs("fill", color),
        );
    }

    /// Grid lines every `spacing` units across the visible region.
    #[allow(clippy::cast_possible_truncation)]
    pub fn grid(&mut self, spacing: f32, color: Color) {
        if spacing <= 0.0 {
            return;
        }
        let b = self.bounds;
        let mut path = String::new();
        let mut x = (b.x / spacing).ceil() * spacing;
        while x <= b.right() {
            let _ = write!(path, "M{x} {}V{}", b.y, b.bottom());
            x += spacing;
        }
        let mut y = (b.y / spacing).ceil() * spacing;
        while y <= b.bottom() {
            let _ = write!(path, "M{} {y}H{}", b.x, b.right());
            y += spacing;
        }
        let _ = write!(
            self.svg,
            "<path d=\"{path}\" fill=\"none\" stroke-width=\"1\" {}/>",
            paint_attrs("stroke", color),
        );
    }

    /// Paint an element's text with its top-left corner at (`x`, `y`).
    ///
    /// Each line is placed at `y + i * pitch`, starting at `x` regardless of
    /// script direction; the baseline sits at the font's ascent below the
    /// line top.
    pub fn text_block(&mut self, element: &TextElement, x: f32, y: f32, measurer: &dyn TextMeasure) {
        let block = layout::measure_element(element, measurer);
        let family = block
            .resolved_family
            .clone()
            .unwrap_or_else(|| element.requested_family().to_string());
        let ascent = measurer.ascent_ratio(block.resolved_family.as_deref()) * element.font_size;

        for (i, line) in layout::split_lines(&element.text).enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let baseline = y + i as f32 * block.pitch + ascent;
            let _ = write!(
                self.svg,
                "<text x=\"{x}\" y=\"{baseline}\" font-family=\"{}\" font-size=\"{}\" {} xml:space=\"preserve\">{}</text>",
                escape_xml(&quote_family(&family)),
                element.font_size,
                paint_attrs("fill", element.color),
                escape_xml(line),
            );
        }
    }

    /// Rectangle outline.
    pub fn outline(&mut self, rect: Rect, color: Color, width: f32, dashed: bool) {
        let dash = if dashed {
            format!(" stroke-dasharray=\"{} {}\"", width * 4.0, width * 3.0)
        } else {
            String::new()
        };
        let _ = write!(
            self.svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke-width=\"{width}\"{dash} {}/>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            paint_attrs("stroke", color),
        );
    }

    /// Straight line.
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Color, width: f32) {
        let _ = write!(
            self.svg,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke-width=\"{width}\" {}/>",
            from.0,
            from.1,
            to.0,
            to.1,
            paint_attrs("stroke", color),
        );
    }

    /// Close the document.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>");
        self.svg
    }
}

/// Rasterize an SVG document using the given font database.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or the pixmap cannot be
/// allocated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rasterize(svg: &str, fonts: Arc<fontdb::Database>) -> RenderResult<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb = fonts;
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let px_w = tree.size().width().ceil() as u32;
    let px_h = tree.size().height().ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Raster(format!("Cannot allocate {px_w}x{px_h} pixmap")))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Encode a pixmap as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] if encoding fails.
pub fn encode_png(pixmap: &tiny_skia::Pixmap) -> RenderResult<Vec<u8>> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

fn paint_attrs(kind: &str, color: Color) -> String {
    let hex = Color { a: 255, ..color }.to_hex();
    if color.a == 255 {
        format!("{kind}=\"{hex}\"")
    } else {
        format!("{kind}=\"{hex}\" {kind}-opacity=\"{}\"", color.opacity())
    }
}

/// Quote a single family name unless it is a generic keyword.
fn quote_family(family: &str) -> String {
    if family.contains(',') {
        return family.to_string();
    }
    match family {
        "serif" | "sans-serif" | "monospace" | "cursive" | "fantasy" => family.to_string(),
        _ => format!("'{}'", family.replace('\'', "")),
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
