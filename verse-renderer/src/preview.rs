//! Rasterized view of the editing surface.
//!
//! Unlike export, the preview shows editing affordances: the grid behind a
//! transparent background, the dragged element at its overlay position, the
//! selection ring and the red center guides.

use std::sync::Arc;

use verse_core::layout::{self, Rect, TextMeasure};
use verse_core::{Color, Document, EditorSession, Guides, Overlay};

use crate::error::RenderResult;
use crate::fonts::FontRegistry;
use crate::svg::{self, SvgCanvas};

/// Grid spacing behind a transparent background.
pub const GRID_SPACING: f32 = 24.0;

const GRID_COLOR: Color = Color {
    r: 255,
    g: 255,
    b: 255,
    a: 15,
};
const SELECTION_COLOR: Color = Color::rgb(0x3b, 0x82, 0xf6);
const GUIDE_COLOR: Color = Color::rgb(0xff, 0x00, 0x00);

/// What the preview shows besides committed document state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreviewState {
    /// Render-only drag position.
    pub overlay: Option<Overlay>,
    /// Active center guides.
    pub guides: Guides,
}

/// Renders the editing surface to pixels.
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    fonts: Arc<FontRegistry>,
    scale: f32,
}

impl PreviewRenderer {
    /// Create a renderer at the given pixel scale.
    #[must_use]
    pub fn new(fonts: Arc<FontRegistry>, scale: f32) -> Self {
        Self { fonts, scale }
    }

    /// Render a session's document with its live drag state.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization fails.
    pub fn render_session(&self, session: &EditorSession) -> RenderResult<tiny_skia::Pixmap> {
        self.render(
            session.document(),
            PreviewState {
                overlay: session.overlay(),
                guides: session.guides(),
            },
        )
    }

    /// Render a document with the given interaction state.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization fails.
    pub fn render(&self, doc: &Document, state: PreviewState) -> RenderResult<tiny_skia::Pixmap> {
        let svg = self.render_svg(doc, state);
        svg::rasterize(&svg, self.fonts.database())
    }

    /// Render to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    pub fn render_png(&self, doc: &Document, state: PreviewState) -> RenderResult<Vec<u8>> {
        svg::encode_png(&self.render(doc, state)?)
    }

    /// The SVG scene for the preview.
    #[must_use]
    pub fn render_svg(&self, doc: &Document, state: PreviewState) -> String {
        let measurer: &dyn TextMeasure = &*self.fonts;
        let surface = doc.surface();
        let bounds = Rect {
            x: 0.0,
            y: 0.0,
            width: surface.width,
            height: surface.height,
        };
        let mut canvas = SvgCanvas::new(bounds, self.scale);

        canvas.fill(doc.background().editor_fill());
        if doc.background().is_transparent() {
            canvas.grid(GRID_SPACING, GRID_COLOR);
        }

        for element in doc.elements() {
            let (x, y) = match state.overlay {
                Some(overlay) if overlay.element == element.id => (overlay.x, overlay.y),
                _ => (element.x, element.y),
            };
            canvas.text_block(element, x, y, measurer);
            if doc.selected() == Some(element.id) {
                let rect = layout::measure_element(element, measurer).rect_at(x, y);
                canvas.outline(rect, SELECTION_COLOR, 2.0, doc.editing() == Some(element.id));
            }
        }

        if state.guides.vertical {
            canvas.line(
                (surface.center_x(), 0.0),
                (surface.center_x(), surface.height),
                GUIDE_COLOR,
                1.0,
            );
        }
        if state.guides.horizontal {
            canvas.line(
                (0.0, surface.center_y()),
                (surface.width, surface.center_y()),
                GUIDE_COLOR,
                1.0,
            );
        }
        canvas.finish()
    }
}
