//! Text elements - the blocks placed on the working surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest font size an element may take, in pixels.
pub const MIN_FONT_SIZE: f32 = 6.0;

/// Largest font size an element may take, in pixels.
pub const MAX_FONT_SIZE: f32 = 120.0;

/// Arabic tatweel (kashida) used to stretch joined letters.
pub const KASHIDA: char = '\u{0640}';

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Script of an element. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Arabic scripture, right-to-left.
    Arabic,
    /// English translation.
    English,
    /// Russian translation.
    Russian,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Self; 3] = [Self::Arabic, Self::English, Self::Russian];

    /// Template text for a freshly added element.
    #[must_use]
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::Arabic => "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ",
            Self::English => {
                "In the name of Allah, the Entirely Merciful, the Especially Merciful."
            }
            Self::Russian => "Во имя Аллаха, Милостивого, Милосердного.",
        }
    }

    /// Family list used when an element has no family or it cannot be resolved.
    #[must_use]
    pub const fn default_family(self) -> &'static str {
        match self {
            Self::Arabic => "Amiri, serif",
            Self::English | Self::Russian => "Georgia, serif",
        }
    }

    /// Font size of a freshly added element.
    #[must_use]
    pub const fn default_font_size(self) -> f32 {
        match self {
            Self::Arabic => 32.0,
            Self::English | Self::Russian => 18.0,
        }
    }

    /// Line pitch multiplier. Arabic gets wider leading for diacritics.
    #[must_use]
    pub const fn line_factor(self) -> f32 {
        match self {
            Self::Arabic => 1.8,
            Self::English | Self::Russian => 1.6,
        }
    }

    /// Whether text in this language runs right-to-left.
    #[must_use]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Arabic)
    }

    /// Lowercase name as used in snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arabic => "arabic",
            Self::English => "english",
            Self::Russian => "russian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arabic" | "ar" => Ok(Self::Arabic),
            "english" | "en" => Ok(Self::English),
            "russian" | "ru" => Ok(Self::Russian),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color: {0}")]
pub struct ColorParseError(pub String);

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Create an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    ///
    /// # Errors
    ///
    /// Returns an error for any other shape or non-hex digits.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(input.to_string());
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, digit) in out.iter_mut().zip(hex.chars()) {
                    let v = digit.to_digit(16).ok_or_else(err)?;
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        *slot = (v * 17) as u8;
                    }
                }
                Ok(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Ok(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Ok(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: channel(&hex[6..8])?,
            }),
            _ => Err(err()),
        }
    }

    /// Hex form: `#rrggbb` when opaque, `#rrggbbaa` otherwise.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Alpha as a 0.0–1.0 opacity.
    #[must_use]
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Clamp a font size into the supported range.
#[must_use]
pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_nan() {
        return MIN_FONT_SIZE;
    }
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// One positioned, styled block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Text content; `\n` separates lines.
    pub text: String,
    /// Left edge in surface coordinates.
    pub x: f32,
    /// Top edge in surface coordinates.
    pub y: f32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Requested font family list; `None` uses the language default.
    pub font_family: Option<String>,
    /// Fill color.
    pub color: Color,
    /// Script, fixed at creation.
    pub language: Language,
}

impl TextElement {
    /// Create an element with the defaults for `language` at the origin.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            id: ElementId::new(),
            text: language.default_text().to_string(),
            x: 0.0,
            y: 0.0,
            font_size: language.default_font_size(),
            font_family: None,
            color: Color::default(),
            language,
        }
    }

    /// Set the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the font size (clamped).
    #[must_use]
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = clamp_font_size(size);
        self
    }

    /// Set the font family.
    #[must_use]
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    /// Set the color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Family list to resolve: the element's own, or the language default.
    #[must_use]
    pub fn requested_family(&self) -> &str {
        match self.font_family.as_deref() {
            Some(f) if !f.trim().is_empty() => f,
            _ => self.language.default_family(),
        }
    }

    /// Apply a partial update. Unlisted fields are untouched.
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(ref text) = patch.text {
            self.text.clone_from(text);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(size) = patch.font_size {
            self.font_size = clamp_font_size(size);
        }
        if let Some(ref family) = patch.font_family {
            self.font_family.clone_from(family);
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

/// Partial attribute update for a [`TextElement`].
///
/// `language` and `id` are absent: they never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    /// New text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New left edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// New top edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// New font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// New font family; `Some(None)` resets to the language default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<Option<String>>,
    /// New color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl ElementPatch {
    /// Patch that only moves the element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that only replaces the text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Patch that only changes the font family.
    #[must_use]
    pub fn font_family(family: Option<String>) -> Self {
        Self {
            font_family: Some(family),
            ..Self::default()
        }
    }

    /// Whether the patch lists no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_forms() {
        assert_eq!(Color::parse("#fff").expect("short"), Color::WHITE);
        assert_eq!(
            Color::parse("#1a2B3c").expect("long"),
            Color::rgb(0x1a, 0x2b, 0x3c)
        );
        let translucent = Color::parse("#00000080").expect("alpha");
        assert_eq!(translucent.a, 0x80);
        assert_eq!(translucent.to_hex(), "#00000080");
        assert!(Color::parse("red").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#ggg").is_err());
    }

    #[test]
    fn test_color_serde_as_string() {
        let json = serde_json::to_string(&Color::rgb(255, 0, 0)).expect("serialize");
        assert_eq!(json, "\"#ff0000\"");
        let back: Color = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Color::rgb(255, 0, 0));
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn test_language_defaults() {
        assert!((Language::Arabic.line_factor() - 1.8).abs() < f32::EPSILON);
        assert!((Language::English.line_factor() - 1.6).abs() < f32::EPSILON);
        assert!((Language::Russian.line_factor() - 1.6).abs() < f32::EPSILON);
        assert!(Language::Arabic.is_rtl());
        assert!(!Language::Russian.is_rtl());
        assert!(Language::Arabic.default_text().starts_with("بِسْمِ اللَّهِ"));
        assert_eq!("Arabic".parse::<Language>(), Ok(Language::Arabic));
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_apply_patch_only_touches_listed_fields() {
        let mut element = TextElement::new(Language::English).with_position(10.0, 20.0);
        let before = element.clone();

        element.apply(&ElementPatch::default());
        assert_eq!(element, before);

        element.apply(&ElementPatch::position(5.0, 6.0));
        assert!((element.x - 5.0).abs() < f32::EPSILON);
        assert!((element.y - 6.0).abs() < f32::EPSILON);
        assert_eq!(element.text, before.text);
        assert_eq!(element.color, before.color);
    }

    #[test]
    fn test_font_size_is_clamped() {
        let mut element = TextElement::new(Language::Arabic);
        element.apply(&ElementPatch {
            font_size: Some(500.0),
            ..ElementPatch::default()
        });
        assert!((element.font_size - MAX_FONT_SIZE).abs() < f32::EPSILON);
        element.apply(&ElementPatch {
            font_size: Some(1.0),
            ..ElementPatch::default()
        });
        assert!((element.font_size - MIN_FONT_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_requested_family_falls_back_to_language_default() {
        let mut element = TextElement::new(Language::Arabic);
        assert_eq!(element.requested_family(), "Amiri, serif");
        element.font_family = Some("   ".to_string());
        assert_eq!(element.requested_family(), "Amiri, serif");
        element.font_family = Some("CustomSerif".to_string());
        assert_eq!(element.requested_family(), "CustomSerif");
    }
}
