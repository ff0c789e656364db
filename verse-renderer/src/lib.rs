//! # Verse Composer Renderer
//!
//! Fonts, export and preview for Verse Composer documents.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────┐   ┌─────────┐
//! │   Document   │──▶│ SVG scene      │──▶│ usvg + resvg │──▶│   PNG   │
//! │ (verse-core) │   │(svg::SvgCanvas)│   │ (tiny-skia)  │   │         │
//! └──────────────┘   └────────────────┘   └──────────────┘   └─────────┘
//!                            ▲                    ▲
//!                            └─── FontRegistry ───┘
//!                           (metrics)        (fontdb faces)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod fonts;
pub mod preview;
pub mod svg;

pub use error::{FontError, FontResult, RenderError, RenderResult};
pub use export::{export_filename, ExportConfig, ExportImage, ExportMode, Exporter};
pub use fonts::{FontRegistry, FontSource};
pub use preview::{PreviewRenderer, PreviewState};
pub use svg::SvgCanvas;
