//! Document export to PNG.
//!
//! Renders a [`Document`] through the shared SVG scene writer and the
//! resvg/tiny-skia rasterization pipeline. Positions come from the same
//! layout functions the editor uses, so the image matches the surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use verse_core::config::{clamp_export_scale, EditorConfig};
use verse_core::layout::{self, Rect, TextMeasure};
use verse_core::{Background, Document, ElementId};

use crate::error::{RenderError, RenderResult};
use crate::fonts::FontRegistry;
use crate::svg::{self, SvgCanvas};

/// Padding around the content in [`ExportMode::Content`].
pub const CONTENT_PADDING: f32 = 50.0;

/// Smallest image, in surface units, for [`ExportMode::Content`].
pub const MIN_CONTENT_SIZE: (f32, f32) = (800.0, 600.0);

/// Which region of the surface becomes the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// The whole working surface, no padding.
    FullSurface,
    /// The union of all text blocks, padded.
    Content,
}

/// Configuration for export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Region to export; `None` follows the document's own setting.
    pub mode: Option<ExportMode>,
    /// User scale, clamped to 1..=6.
    pub user_scale: u8,
    /// Device pixel ratio.
    pub device_scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: None,
            user_scale: 2,
            device_scale: 1.0,
        }
    }
}

impl From<&EditorConfig> for ExportConfig {
    fn from(config: &EditorConfig) -> Self {
        Self {
            mode: None,
            user_scale: config.export_scale,
            device_scale: config.device_scale,
        }
    }
}

impl ExportConfig {
    /// Total raster scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        let device = if self.device_scale.is_finite() && self.device_scale > 0.0 {
            self.device_scale
        } else {
            1.0
        };
        device * f32::from(clamp_export_scale(self.user_scale))
    }
}

/// An encoded export.
#[derive(Debug, Clone)]
pub struct ExportImage {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Suggested file name, `quran-verse-<unix-millis>.png`.
    pub filename: String,
    /// Elements no available font can draw. Their text is missing from the
    /// image.
    pub unpainted: Vec<ElementId>,
}

impl ExportImage {
    /// Write the PNG into `dir` under [`Self::filename`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save_to(&self, dir: &Path) -> RenderResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.png)?;
        tracing::info!("Saved export to {}", path.display());
        Ok(path)
    }
}

/// Renders documents to PNG.
#[derive(Debug, Clone)]
pub struct Exporter {
    config: ExportConfig,
    fonts: Arc<FontRegistry>,
}

impl Exporter {
    /// Create an exporter drawing text with `fonts`.
    #[must_use]
    pub fn new(config: ExportConfig, fonts: Arc<FontRegistry>) -> Self {
        Self { config, fonts }
    }

    /// Export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Render the document to an encoded PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NothingToExport`] for an empty document, or an
    /// error if rasterization or encoding fails.
    pub fn render(&self, doc: &Document) -> RenderResult<ExportImage> {
        let (svg, unpainted) = self.scene(doc)?;
        let pixmap = svg::rasterize(&svg, self.fonts.database())?;
        let png = svg::encode_png(&pixmap)?;
        tracing::info!(
            "Exported {} element(s) at {}x{}",
            doc.element_count(),
            pixmap.width(),
            pixmap.height()
        );
        Ok(ExportImage {
            png,
            width: pixmap.width(),
            height: pixmap.height(),
            filename: export_filename(current_timestamp_ms()),
            unpainted,
        })
    }

    /// The SVG scene that [`Self::render`] rasterizes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NothingToExport`] for an empty document.
    pub fn render_svg(&self, doc: &Document) -> RenderResult<String> {
        self.scene(doc).map(|(svg, _)| svg)
    }

    fn scene(&self, doc: &Document) -> RenderResult<(String, Vec<ElementId>)> {
        if doc.is_empty() {
            return Err(RenderError::NothingToExport);
        }
        let unpainted = self.check_fonts(doc);

        let measurer: &dyn TextMeasure = &*self.fonts;
        let bounds = self.bounds(doc, measurer);
        let mut canvas = SvgCanvas::new(bounds, self.config.scale());
        if let Background::Color(color) = doc.background() {
            canvas.fill(color);
        }
        for element in doc.elements() {
            canvas.text_block(element, element.x, element.y, measurer);
        }
        Ok((canvas.finish(), unpainted))
    }

    /// Region of the surface to export.
    #[must_use]
    pub fn bounds(&self, doc: &Document, measurer: &dyn TextMeasure) -> Rect {
        let mode = self.config.mode.unwrap_or(if doc.export_full_surface {
            ExportMode::FullSurface
        } else {
            ExportMode::Content
        });
        match mode {
            ExportMode::FullSurface => {
                let surface = doc.surface();
                Rect {
                    x: 0.0,
                    y: 0.0,
                    width: surface.width.ceil().max(1.0),
                    height: surface.height.ceil().max(1.0),
                }
            }
            ExportMode::Content => {
                let content = layout::content_bounds(doc.elements(), measurer).unwrap_or(Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 0.0,
                    height: 0.0,
                });
                Rect {
                    x: content.x - CONTENT_PADDING,
                    y: content.y - CONTENT_PADDING,
                    width: (content.width + CONTENT_PADDING * 2.0).max(MIN_CONTENT_SIZE.0),
                    height: (content.height + CONTENT_PADDING * 2.0).max(MIN_CONTENT_SIZE.1),
                }
            }
        }
    }

    /// Log font fallbacks; returns the elements left without any font.
    fn check_fonts(&self, doc: &Document) -> Vec<ElementId> {
        let mut unpainted = Vec::new();
        for element in doc.elements() {
            let requested = element.requested_family();
            let first = layout::first_family(requested).unwrap_or(requested);
            if self.fonts.is_available(first) {
                continue;
            }
            match self.fonts.resolve_family(requested, element.language) {
                Some(fallback) => {
                    tracing::debug!("Font {first:?} unavailable for {}, using {fallback}", element.id);
                }
                None => {
                    tracing::warn!(
                        "No font can draw {} element {} ({requested:?}); its text is left out",
                        element.language,
                        element.id
                    );
                    unpainted.push(element.id);
                }
            }
        }
        unpainted
    }
}

/// File name for an export made at `timestamp_ms`.
#[must_use]
pub fn export_filename(timestamp_ms: u64) -> String {
    format!("quran-verse-{timestamp_ms}.png")
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}
