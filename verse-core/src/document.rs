//! The document: every text element on the surface plus global settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::{Color, ElementId, ElementPatch, Language, TextElement, KASHIDA};
use crate::error::{EditorError, EditorResult};
use crate::layout::{self, Surface, TextMeasure};

/// Sentinel used for a transparent background in snapshots.
pub const TRANSPARENT: &str = "transparent";

/// Color the editor shows behind a transparent background.
pub const TRANSPARENT_PREVIEW: Color = Color::rgb(0x0b, 0x0d, 0x0f);

/// Canvas background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    /// Solid fill.
    Color(Color),
    /// No fill; exported with an alpha channel.
    #[default]
    Transparent,
}

impl Background {
    /// Whether this is the transparent sentinel.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }

    /// Fill shown on the editing surface.
    #[must_use]
    pub fn editor_fill(&self) -> Color {
        match self {
            Self::Color(c) => *c,
            Self::Transparent => TRANSPARENT_PREVIEW,
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(c) => write!(f, "{c}"),
            Self::Transparent => f.write_str(TRANSPARENT),
        }
    }
}

impl FromStr for Background {
    type Err = crate::element::ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(TRANSPARENT) {
            Ok(Self::Transparent)
        } else {
            Color::parse(s).map(Self::Color)
        }
    }
}

impl TryFrom<String> for Background {
    type Error = crate::element::ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Background> for String {
    fn from(bg: Background) -> Self {
        bg.to_string()
    }
}

/// All text elements, selection state and canvas settings.
///
/// The document is the only place committed state lives. Elements are kept in
/// insertion order, which is also paint order.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<TextElement>,
    selected: Option<ElementId>,
    editing: Option<ElementId>,
    /// Elements added but not yet centered on their measured size.
    pending_center: Vec<ElementId>,
    background: Background,
    surface: Surface,
    /// Export the whole surface rather than the content bounds.
    pub export_full_surface: bool,
}

impl Default for Document {
    fn default() -> Self {
        let surface = Surface::default();
        Self::new(surface.width, surface.height)
    }
}

impl Document {
    /// Create an empty document for a surface of the given size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            elements: Vec::new(),
            selected: None,
            editing: None,
            pending_center: Vec::new(),
            background: Background::default(),
            surface: Surface::new(width, height),
            export_full_surface: true,
        }
    }

    /// Add an element with the defaults for `language` and select it.
    ///
    /// The element starts at the surface center point; [`Self::settle_layout`]
    /// moves it so that its measured block is centered.
    pub fn add(&mut self, language: Language) -> ElementId {
        let element = TextElement::new(language)
            .with_position(self.surface.center_x(), self.surface.center_y());
        let id = self.insert(element);
        self.pending_center.push(id);
        self.select(Some(id));
        tracing::debug!("Added {language} element {id}");
        id
    }

    /// Insert a fully formed element without touching the selection.
    pub fn insert(&mut self, element: TextElement) -> ElementId {
        let id = element.id;
        self.elements.push(element);
        id
    }

    /// Center every newly added element on its measured block.
    ///
    /// Returns the number of elements moved.
    pub fn settle_layout(&mut self, measurer: &dyn TextMeasure) -> usize {
        let pending = std::mem::take(&mut self.pending_center);
        let surface = self.surface;
        let mut moved = 0;
        for id in pending {
            if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
                let block = layout::measure_element(element, measurer);
                let (x, y) = layout::center_in(surface, &block);
                element.x = x;
                element.y = y;
                moved += 1;
            }
        }
        moved
    }

    /// Whether elements are waiting for [`Self::settle_layout`].
    #[must_use]
    pub fn has_pending_layout(&self) -> bool {
        !self.pending_center.is_empty()
    }

    /// Merge the listed attributes into an element.
    ///
    /// Returns `false` (and changes nothing) if the element does not exist.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            tracing::debug!("Ignoring update for unknown element {id}");
            return false;
        };
        element.apply(patch);
        if patch.x.is_some() || patch.y.is_some() {
            self.pending_center.retain(|p| *p != id);
        }
        true
    }

    /// Remove an element. Selection and editing are cleared only if they
    /// pointed at it.
    pub fn delete(&mut self, id: ElementId) -> Option<TextElement> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        self.pending_center.retain(|p| *p != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
        Some(self.elements.remove(index))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.pending_center.clear();
        self.selected = None;
        self.editing = None;
    }

    /// Change the selection. Unknown ids are ignored.
    ///
    /// Selecting nothing or a different element closes the inline editor.
    pub fn select(&mut self, id: Option<ElementId>) {
        if let Some(id) = id {
            if !self.contains(id) {
                tracing::debug!("Ignoring selection of unknown element {id}");
                return;
            }
        }
        if self.editing.is_some() && self.editing != id {
            self.editing = None;
        }
        self.selected = id;
    }

    /// Open the inline editor on an element, selecting it.
    ///
    /// Returns `false` if the element does not exist.
    pub fn begin_edit(&mut self, id: ElementId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selected = Some(id);
        self.editing = Some(id);
        true
    }

    /// Close the inline editor. Selection stays.
    pub fn end_edit(&mut self) {
        self.editing = None;
    }

    /// Insert a kashida into an Arabic element at a character cursor.
    ///
    /// Returns the cursor position after the inserted character.
    ///
    /// # Errors
    ///
    /// Returns an error if the element does not exist or is not Arabic.
    pub fn insert_kashida(&mut self, id: ElementId, cursor: usize) -> EditorResult<usize> {
        let element = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
        if element.language != Language::Arabic {
            return Err(EditorError::InvalidOperation(format!(
                "kashida applies to arabic text, element {id} is {}",
                element.language
            )));
        }
        let byte_index = element
            .text
            .char_indices()
            .nth(cursor)
            .map_or(element.text.len(), |(i, _)| i);
        element.text.insert(byte_index, KASHIDA);
        let chars_before = element.text[..byte_index].chars().count();
        Ok(chars_before + 1)
    }

    /// Topmost element whose measured block contains the point.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32, measurer: &dyn TextMeasure) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| {
                layout::measure_element(e, measurer)
                    .rect_at(e.x, e.y)
                    .contains(x, y)
            })
            .map(|e| e.id)
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&TextElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Whether an element exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    /// All elements in paint order.
    pub fn elements(&self) -> impl Iterator<Item = &TextElement> {
        self.elements.iter()
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Currently selected element ID.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Currently selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&TextElement> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Element with the inline editor open.
    #[must_use]
    pub fn editing(&self) -> Option<ElementId> {
        self.editing
    }

    /// Current background.
    #[must_use]
    pub fn background(&self) -> Background {
        self.background
    }

    /// Change the background.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Working surface dimensions.
    #[must_use]
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Resize the working surface.
    pub fn set_surface(&mut self, width: f32, height: f32) {
        self.surface = Surface::new(width, height);
    }
}
