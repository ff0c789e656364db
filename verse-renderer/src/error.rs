//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for font registration.
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document has no elements.
    #[error("Nothing to export: the document has no text elements")]
    NothingToExport,

    /// The generated scene could not be parsed.
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    /// Pixel buffer allocation or painting failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    /// Writing the exported file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A font problem surfaced during rendering.
    #[error("Font error: {0}")]
    Font(#[from] FontError),
}

/// Errors from font registration.
#[derive(Debug, Error)]
pub enum FontError {
    /// Fonts need a non-empty family name.
    #[error("Font name must not be empty")]
    EmptyName,

    /// The bytes are not a usable TrueType/OpenType font.
    #[error("Invalid font data: {0}")]
    InvalidData(String),

    /// Downloading the font failed.
    #[error("Failed to fetch font: {0}")]
    Fetch(String),

    /// The `data:` URL is malformed.
    #[error("Invalid data URL: {0}")]
    DataUrl(String),

    /// Reading a local font file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The URL scheme is not `http`, `https`, `file` or `data`.
    #[error("Unsupported font URL scheme: {0}")]
    UnsupportedScheme(String),
}
