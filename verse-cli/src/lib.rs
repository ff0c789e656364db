//! # Verse Composer CLI
//!
//! Native command-line host for Verse Composer. Every command works on a
//! saved editor snapshot (`--state FILE`): it loads the document, restores
//! the embedded fonts, applies the command and writes the snapshot back.
//!
//! ## Usage
//!
//! ```bash
//! verse-composer add --state verse.json --language arabic
//! verse-composer update --state verse.json --id <uuid> --x 40 --y 60
//! verse-composer add-font --state verse.json --name Amiri --source ./Amiri-Regular.ttf --apply-to <uuid>
//! verse-composer background --state verse.json --value "#101820"
//! verse-composer export --state verse.json --out ./out --scale 3
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `EditorConfig` - Built from the arguments (surface size, export scale)
//! - `Workspace` - Snapshot file, font registry and editing session
//! - `run` - Dispatches a parsed command and returns its report

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;
mod workspace;

pub use commands::run;
pub use workspace::Workspace;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use verse_core::element::ColorParseError;
use verse_core::{EditorConfig, EditorError};
use verse_renderer::{FontError, RenderError};

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Unknown language name.
    #[error("{0}")]
    InvalidLanguage(String),

    /// Element id is not a UUID.
    #[error("Invalid element id {0:?}")]
    InvalidId(String),

    /// Color or background value could not be parsed.
    #[error(transparent)]
    InvalidColor(#[from] ColorParseError),

    /// The snapshot file could not be written.
    #[error("Failed to save state to {0}")]
    StateNotSaved(PathBuf),

    /// Document or storage error.
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Export error.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Font registration error.
    #[error(transparent)]
    Font(#[from] FontError),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command-line arguments for verse-composer.
#[derive(Debug, Clone, Parser)]
#[command(name = "verse-composer")]
#[command(about = "Compose Quran verses with translations and export them as images")]
#[command(version)]
pub struct CliArgs {
    /// Working surface width
    #[arg(long, global = true, env = "VERSE_SURFACE_WIDTH", default_value = "800")]
    pub width: f32,

    /// Working surface height
    #[arg(long, global = true, env = "VERSE_SURFACE_HEIGHT", default_value = "600")]
    pub height: f32,

    /// Use only fonts embedded in the state file, not installed ones
    #[arg(long, global = true)]
    pub no_system_fonts: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render the composition to a PNG
    Export(ExportArgs),
    /// Add a text element, centered on the surface
    Add(AddArgs),
    /// Change attributes of an existing element
    Update(UpdateArgs),
    /// Remove an element
    Delete(DeleteArgs),
    /// Register a custom font and embed it in the state file
    AddFont(AddFontArgs),
    /// Print elements with their measured blocks as JSON
    Inspect(StateArgs),
    /// Set the canvas background
    Background(BackgroundArgs),
}

impl Command {
    /// Snapshot file the command works on.
    #[must_use]
    pub fn state(&self) -> &Path {
        match self {
            Self::Export(args) => &args.state.state,
            Self::Add(args) => &args.state.state,
            Self::Update(args) => &args.state.state,
            Self::Delete(args) => &args.state.state,
            Self::AddFont(args) => &args.state.state,
            Self::Inspect(args) => &args.state,
            Self::Background(args) => &args.state.state,
        }
    }
}

/// The snapshot file argument shared by every command.
#[derive(Debug, Clone, Args)]
pub struct StateArgs {
    /// Path of the editor state file
    #[arg(long)]
    pub state: PathBuf,
}

/// Arguments for `export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Snapshot file
    #[command(flatten)]
    pub state: StateArgs,

    /// Directory the PNG is written to
    #[arg(long)]
    pub out: PathBuf,

    /// Export scale (clamped to 1..=6)
    #[arg(long, env = "VERSE_EXPORT_SCALE", default_value = "2")]
    pub scale: u8,

    /// Device pixel ratio multiplied into the scale
    #[arg(long, default_value = "1.0")]
    pub device_scale: f32,

    /// Export the padded text bounds instead of the whole surface
    #[arg(long)]
    pub content_bounds: bool,
}

/// Arguments for `add`.
#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    /// Snapshot file
    #[command(flatten)]
    pub state: StateArgs,

    /// arabic, english or russian
    #[arg(long)]
    pub language: String,

    /// Text instead of the language template
    #[arg(long)]
    pub text: Option<String>,

    /// Font size (clamped to 6..=120)
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Fill color, e.g. `#ffcc00`
    #[arg(long)]
    pub color: Option<String>,

    /// Font family list, e.g. `"Amiri, serif"`
    #[arg(long)]
    pub font_family: Option<String>,
}

/// Arguments for `update`.
#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    /// Snapshot file
    #[command(flatten)]
    pub state: StateArgs,

    /// Element id (UUID)
    #[arg(long)]
    pub id: String,

    /// New text
    #[arg(long)]
    pub text: Option<String>,

    /// New left edge
    #[arg(long, allow_negative_numbers = true)]
    pub x: Option<f32>,

    /// New top edge
    #[arg(long, allow_negative_numbers = true)]
    pub y: Option<f32>,

    /// New font size (clamped to 6..=120)
    #[arg(long)]
    pub font_size: Option<f32>,

    /// New font family list; an empty value restores the language default
    #[arg(long)]
    pub font_family: Option<String>,

    /// New fill color
    #[arg(long)]
    pub color: Option<String>,
}

/// Arguments for `delete`.
#[derive(Debug, Clone, Args)]
pub struct DeleteArgs {
    /// Snapshot file
    #[command(flatten)]
    pub state: StateArgs,

    /// Element id (UUID)
    #[arg(long)]
    pub id: String,
}

/// Arguments for `add-font`.
#[derive(Debug, Clone, Args)]
pub struct AddFontArgs {
    /// Snapshot file
    #[command(flatten)]
    pub state: StateArgs,

    /// Name to register the font under
    #[arg(long)]
    pub name: String,

    /// Font file path or `http(s)://`, `file://` or `data:` URL
    #[arg(long)]
    pub source: String,

    /// Element (UUID) to switch to the new font
    #[arg(long)]
    pub apply_to: Option<String>,
}

/// Arguments for `background`.
#[derive(Debug, Clone, Args)]
pub struct BackgroundArgs {
    /// Snapshot file
    #[command(flatten)]
    pub state: StateArgs,

    /// A color such as `#000000`, or `transparent`
    #[arg(long)]
    pub value: String,
}

impl From<&CliArgs> for EditorConfig {
    fn from(args: &CliArgs) -> Self {
        let config = EditorConfig::default().with_surface(args.width, args.height);
        match &args.command {
            Command::Export(export) => config
                .with_export_scale(export.scale)
                .with_device_scale(export.device_scale),
            _ => config,
        }
    }
}
