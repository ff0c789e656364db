//! Text layout shared by the editor and the exporter.
//!
//! Every footprint the editor uses (centering, guides, hit-testing) and every
//! position the exporter paints comes from [`measure`].

use serde::{Deserialize, Serialize};

use crate::element::{Language, TextElement};

/// Ascent (em-box top to baseline) as a fraction of the font size, used when
/// no real font metrics are available.
pub const DEFAULT_ASCENT_RATIO: f32 = 0.8;

/// Source of font metrics.
///
/// Implemented by the font registry in the renderer; [`HeuristicMeasure`]
/// stands in when no fonts are loaded.
pub trait TextMeasure {
    /// Resolve a CSS-like family list (`"Amiri, serif"`) to the concrete
    /// family used for measuring and painting.
    ///
    /// Returns `None` when nothing in the list (nor the language default) is
    /// available, in which case heuristic metrics apply.
    fn resolve_family(&self, requested: &str, language: Language) -> Option<String>;

    /// Advance width of a single line in pixels.
    fn line_width(&self, line: &str, family: Option<&str>, font_size: f32) -> f32;

    /// Distance from the em-box top to the baseline, as a fraction of the
    /// font size.
    fn ascent_ratio(&self, family: Option<&str>) -> f32 {
        let _ = family;
        DEFAULT_ASCENT_RATIO
    }
}

/// Dimensions of the working surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Width in logical pixels.
    pub width: f32,
    /// Height in logical pixels.
    pub height: f32,
}

impl Surface {
    /// Create a surface.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Horizontal center.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }

    /// Vertical center.
    #[must_use]
    pub fn center_y(&self) -> f32 {
        self.height / 2.0
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Whether the point lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

/// Measured footprint of a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMetrics {
    /// Width of every line, in order.
    pub line_widths: Vec<f32>,
    /// Widest line.
    pub block_width: f32,
    /// `line_count * pitch`.
    pub block_height: f32,
    /// Number of lines (at least 1).
    pub line_count: usize,
    /// Distance between consecutive line tops.
    pub pitch: f32,
    /// Family actually used, `None` for heuristic metrics.
    pub resolved_family: Option<String>,
}

impl BlockMetrics {
    /// Footprint placed at `(x, y)`.
    #[must_use]
    pub fn rect_at(&self, x: f32, y: f32) -> Rect {
        Rect {
            x,
            y,
            width: self.block_width,
            height: self.block_height,
        }
    }
}

/// Line pitch multiplier for a language.
#[must_use]
pub fn line_factor(language: Language) -> f32 {
    language.line_factor()
}

/// Split text on explicit line breaks. Always yields at least one line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Measure a text block.
///
/// `font_family` of `None` (or blank) uses the language default.
#[must_use]
pub fn measure(
    text: &str,
    font_family: Option<&str>,
    font_size: f32,
    language: Language,
    measurer: &dyn TextMeasure,
) -> BlockMetrics {
    let requested = match font_family {
        Some(f) if !f.trim().is_empty() => f,
        _ => language.default_family(),
    };
    let resolved_family = measurer.resolve_family(requested, language);

    let line_widths: Vec<f32> = split_lines(text)
        .map(|line| measurer.line_width(line, resolved_family.as_deref(), font_size))
        .collect();
    let line_count = line_widths.len().max(1);
    let block_width = line_widths.iter().copied().fold(0.0_f32, f32::max);
    let pitch = font_size * line_factor(language);

    #[allow(clippy::cast_precision_loss)]
    let block_height = line_count as f32 * pitch;

    BlockMetrics {
        line_widths,
        block_width,
        block_height,
        line_count,
        pitch,
        resolved_family,
    }
}

/// Measure an element with its own attributes.
#[must_use]
pub fn measure_element(element: &TextElement, measurer: &dyn TextMeasure) -> BlockMetrics {
    measure(
        &element.text,
        element.font_family.as_deref(),
        element.font_size,
        element.language,
        measurer,
    )
}

/// Top-left position that centers `block` on `surface`.
#[must_use]
pub fn center_in(surface: Surface, block: &BlockMetrics) -> (f32, f32) {
    (
        surface.center_x() - block.block_width / 2.0,
        surface.center_y() - block.block_height / 2.0,
    )
}

/// Union of the measured blocks of all elements, `None` when empty.
#[must_use]
pub fn content_bounds<'a>(
    elements: impl IntoIterator<Item = &'a TextElement>,
    measurer: &dyn TextMeasure,
) -> Option<Rect> {
    elements
        .into_iter()
        .map(|el| measure_element(el, measurer).rect_at(el.x, el.y))
        .reduce(|acc, rect| acc.union(&rect))
}

/// First family name of a CSS-like list, unquoted.
#[must_use]
pub fn first_family(list: &str) -> Option<&str> {
    family_names(list).next()
}

/// Family names of a CSS-like list, trimmed and unquoted, blanks skipped.
pub fn family_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|name| !name.is_empty())
}

/// Deterministic per-character width estimates.
///
/// Used when a family resolves to no installed font, so that centering and
/// guides still behave sensibly.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasure;

impl HeuristicMeasure {
    /// Estimated advance of one character, as a fraction of the font size.
    #[must_use]
    pub fn char_ratio(c: char) -> f32 {
        if is_combining_mark(c) {
            0.0
        } else if is_fullwidth(c) {
            0.9
        } else if c.is_ascii_alphanumeric() {
            0.52
        } else if c.is_ascii_punctuation() || c == ' ' {
            0.3
        } else {
            0.6
        }
    }
}

impl TextMeasure for HeuristicMeasure {
    fn resolve_family(&self, requested: &str, language: Language) -> Option<String> {
        first_family(requested)
            .or_else(|| first_family(language.default_family()))
            .map(str::to_string)
    }

    fn line_width(&self, line: &str, _family: Option<&str>, font_size: f32) -> f32 {
        line.chars().map(Self::char_ratio).sum::<f32>() * font_size
    }
}

/// Arabic harakat and Quranic annotation marks, which take no advance.
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E4}'
        | '\u{06E7}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}'
        | '\u{0300}'..='\u{036F}')
}

fn is_fullwidth(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}')
}
