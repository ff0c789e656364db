//! Serialized editor state.
//!
//! The JSON shape matches the `editor_state_v1` payload:
//!
//! ```json
//! {
//!   "textElements": [{ "id": "…", "text": "…", "x": 0, "y": 0,
//!                      "fontSize": 18, "color": "#ffffff",
//!                      "language": "english", "fontFamily": "Georgia, serif" }],
//!   "canvasBackground": "transparent",
//!   "exportFullCanvas": true,
//!   "fonts": [{ "name": "CustomSerif", "dataUrl": "data:font/ttf;base64,…" }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Background, Document};
use crate::element::{clamp_font_size, Color, ElementId, Language, TextElement};
use crate::error::EditorResult;
use crate::layout::Surface;

/// Storage key of the snapshot format.
pub const STORAGE_KEY: &str = "editor_state_v1";

/// A registered custom font, embedded as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRecord {
    /// Family name the font is registered under.
    pub name: String,
    /// Self-contained `data:` URL with the font bytes.
    pub data_url: String,
}

/// One serialized text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    /// Element id (UUID).
    pub id: String,
    /// Text content.
    pub text: String,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Font size in pixels.
    pub font_size: f32,
    /// Fill color.
    pub color: Color,
    /// Script.
    pub language: Language,
    /// Requested family list, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl From<&TextElement> for ElementRecord {
    fn from(element: &TextElement) -> Self {
        Self {
            id: element.id.to_string(),
            text: element.text.clone(),
            x: element.x,
            y: element.y,
            font_size: element.font_size,
            color: element.color,
            language: element.language,
            font_family: element.font_family.clone(),
        }
    }
}

impl ElementRecord {
    /// Convert to a runtime element. Unparsable ids are regenerated.
    #[must_use]
    pub fn into_element(self) -> TextElement {
        let id = ElementId::parse(&self.id).unwrap_or_else(|e| {
            tracing::debug!("Regenerating invalid element id {:?}: {e}", self.id);
            ElementId::new()
        });
        TextElement {
            id,
            text: self.text,
            x: self.x,
            y: self.y,
            font_size: clamp_font_size(self.font_size),
            font_family: self.font_family.filter(|f| !f.trim().is_empty()),
            color: self.color,
            language: self.language,
        }
    }

    /// Recover a record from loosely typed JSON.
    ///
    /// Returns `None` only when the language is missing or unknown; every
    /// other field falls back to the language default.
    fn from_value(value: &Value) -> Option<Self> {
        let language: Language = value.get("language")?.as_str()?.parse().ok()?;
        let number = |key: &str| value.get(key).and_then(Value::as_f64);
        #[allow(clippy::cast_possible_truncation)]
        let float = |key: &str, fallback: f32| number(key).map_or(fallback, |v| v as f32);

        Some(Self {
            id: value
                .get("id")
                .and_then(Value::as_str)
                .map_or_else(String::new, str::to_string),
            text: value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or(language.default_text())
                .to_string(),
            x: float("x", 0.0),
            y: float("y", 0.0),
            font_size: float("fontSize", language.default_font_size()),
            color: value
                .get("color")
                .and_then(Value::as_str)
                .and_then(|c| Color::parse(c).ok())
                .unwrap_or_default(),
            language,
            font_family: value
                .get("fontFamily")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Complete persisted editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Elements in paint order.
    pub text_elements: Vec<ElementRecord>,
    /// Background color or `"transparent"`.
    pub canvas_background: Background,
    /// Export the full surface rather than the content bounds.
    pub export_full_canvas: bool,
    /// Registered custom fonts.
    #[serde(default)]
    pub fonts: Vec<FontRecord>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            text_elements: Vec::new(),
            canvas_background: Background::default(),
            export_full_canvas: true,
            fonts: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Capture a document and its registered fonts.
    #[must_use]
    pub fn from_document(doc: &Document, fonts: Vec<FontRecord>) -> Self {
        Self {
            text_elements: doc.elements().map(ElementRecord::from).collect(),
            canvas_background: doc.background(),
            export_full_canvas: doc.export_full_surface,
            fonts,
        }
    }

    /// Rebuild a document on a surface of the given size.
    ///
    /// Selection and edit state are not persisted; the result has neither.
    #[must_use]
    pub fn into_document(self, surface: Surface) -> Document {
        let mut doc = Document::new(surface.width, surface.height);
        for record in self.text_elements {
            let element = record.into_element();
            if doc.contains(element.id) {
                tracing::warn!("Duplicate element id {} in snapshot, regenerating", element.id);
                doc.insert(TextElement {
                    id: ElementId::new(),
                    ..element
                });
            } else {
                doc.insert(element);
            }
        }
        doc.set_background(self.canvas_background);
        doc.export_full_surface = self.export_full_canvas;
        doc
    }

    /// Strict JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Strict JSON decoding.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` does not match the snapshot shape.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Field-by-field recovery of a possibly damaged snapshot. Never fails.
    ///
    /// Malformed fields fall back to defaults, elements with an unknown
    /// language are dropped, and unparsable input gives an empty snapshot.
    #[must_use]
    pub fn parse_lenient(json: &str) -> Self {
        let value: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Discarding unreadable snapshot: {e}");
                return Self::default();
            }
        };
        let mut snapshot = Self::default();

        if let Some(elements) = value.get("textElements").and_then(Value::as_array) {
            snapshot.text_elements = elements
                .iter()
                .filter_map(|v| {
                    let record = ElementRecord::from_value(v);
                    if record.is_none() {
                        tracing::debug!("Skipping snapshot element without a known language");
                    }
                    record
                })
                .collect();
        }
        if let Some(background) = value
            .get("canvasBackground")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Background>().ok())
        {
            snapshot.canvas_background = background;
        }
        if let Some(full) = value.get("exportFullCanvas").and_then(Value::as_bool) {
            snapshot.export_full_canvas = full;
        }
        if let Some(fonts) = value.get("fonts").and_then(Value::as_array) {
            snapshot.fonts = fonts
                .iter()
                .filter_map(|f| serde_json::from_value::<FontRecord>(f.clone()).ok())
                .collect();
        }
        snapshot
    }
}
