//! Editor session: the document plus live interaction state.

use std::sync::Arc;

use crate::config::EditorConfig;
use crate::document::Document;
use crate::drag::{DragController, DragOutcome, FrameUpdate, Guides, Overlay};
use crate::element::{ElementId, Language};
use crate::event::{InputEvent, PointerEvent, PointerPhase};
use crate::layout::{HeuristicMeasure, TextMeasure};

/// Shared metrics source.
pub type SharedMeasure = Arc<dyn TextMeasure + Send + Sync>;

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// The drag controller handled it.
    Drag(DragOutcome),
    /// The inline editor opened on this element.
    EditStarted(ElementId),
    /// Nothing happened.
    None,
}

impl Response {
    /// Whether the host should schedule a frame callback.
    #[must_use]
    pub fn wants_frame(&self) -> bool {
        matches!(
            self,
            Self::Drag(DragOutcome::Moved {
                request_frame: true,
                ..
            })
        )
    }
}

/// Everything one editing surface needs.
pub struct EditorSession {
    document: Document,
    drag: DragController,
    config: EditorConfig,
    measurer: SharedMeasure,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("document", &self.document)
            .field("drag", &self.drag)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Arc::new(HeuristicMeasure))
    }
}

impl EditorSession {
    /// Create a session with an empty document.
    #[must_use]
    pub fn new(config: EditorConfig, measurer: SharedMeasure) -> Self {
        let document = Document::new(config.surface.width, config.surface.height);
        Self::with_document(document, config, measurer)
    }

    /// Create a session around an existing document.
    #[must_use]
    pub fn with_document(document: Document, config: EditorConfig, measurer: SharedMeasure) -> Self {
        Self {
            document,
            drag: DragController::new(config.guide_tolerance),
            config,
            measurer,
        }
    }

    /// Add a text element for `language`; it is centered on the next frame.
    pub fn add_text(&mut self, language: Language) -> ElementId {
        self.document.add(language)
    }

    /// Route an input event to the document and drag controller.
    pub fn process_event(&mut self, event: &InputEvent) -> Response {
        match event {
            InputEvent::Pointer(pointer) => self.process_pointer(*pointer),
            InputEvent::Touch(touch) => touch
                .as_pointer()
                .map_or(Response::None, |pointer| self.process_pointer(pointer)),
            InputEvent::DoubleClick { x, y } => {
                match self.document.element_at(*x, *y, self.measurer.as_ref()) {
                    Some(id) if self.document.begin_edit(id) => {
                        tracing::debug!("Editing {id}");
                        Response::EditStarted(id)
                    }
                    _ => Response::None,
                }
            }
            InputEvent::FocusLost => Response::Drag(self.drag.focus_lost(&mut self.document)),
        }
    }

    fn process_pointer(&mut self, pointer: PointerEvent) -> Response {
        let outcome = match pointer.phase {
            PointerPhase::Down => {
                let target =
                    self.document
                        .element_at(pointer.x, pointer.y, self.measurer.as_ref());
                // The open editor owns pointer input on its own element.
                if target.is_some() && target == self.document.editing() {
                    return Response::None;
                }
                self.drag.pointer_down(&mut self.document, target, pointer)
            }
            PointerPhase::Move => self.drag.pointer_move(pointer),
            PointerPhase::Up => self.drag.pointer_up(&mut self.document, pointer),
            PointerPhase::Cancel => self.drag.pointer_cancel(&mut self.document, pointer),
        };
        Response::Drag(outcome)
    }

    /// Frame tick: centers newly added elements and flushes the drag frame.
    pub fn on_frame(&mut self) -> Option<FrameUpdate> {
        if self.document.has_pending_layout() {
            let moved = self.document.settle_layout(self.measurer.as_ref());
            tracing::debug!("Centered {moved} new element(s)");
        }
        self.drag.on_frame(&self.document, self.measurer.as_ref())
    }

    /// Committed document state.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable document access for attribute edits.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Replace the document, ending any drag in progress without commit.
    pub fn replace_document(&mut self, document: Document) {
        self.drag = DragController::new(self.config.guide_tolerance);
        self.document = document;
    }

    /// Drag overlay, if a drag is in progress.
    #[must_use]
    pub fn overlay(&self) -> Option<Overlay> {
        self.drag.overlay()
    }

    /// Current guide visibility.
    #[must_use]
    pub fn guides(&self) -> Guides {
        self.drag.guides()
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Metrics source used for layout.
    #[must_use]
    pub fn measurer(&self) -> &SharedMeasure {
        &self.measurer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{TouchEvent, TouchPhase, TouchPoint};
    use crate::layout;

    #[test]
    fn test_add_centers_on_frame() {
        let mut session = EditorSession::default();
        let id = session.add_text(Language::English);
        assert!(session.document().has_pending_layout());

        assert!(session.on_frame().is_none());
        let el = session.document().get(id).expect("element");
        let block = layout::measure_element(el, &HeuristicMeasure);
        assert!((el.x + block.block_width / 2.0 - 400.0).abs() < 0.01);
        assert!((el.y + block.block_height / 2.0 - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_pointer_drag_round_trip() {
        let mut session = EditorSession::default();
        let id = session.add_text(Language::Russian);
        session.on_frame();
        let el = session.document().get(id).expect("element").clone();
        let (px, py) = (el.x + 2.0, el.y + 2.0);

        let down = session.process_event(&InputEvent::Pointer(PointerEvent::down(1, px, py)));
        assert_eq!(down, Response::Drag(DragOutcome::Started(id)));

        let moved =
            session.process_event(&InputEvent::Pointer(PointerEvent::moved(1, px + 40.0, py)));
        assert!(moved.wants_frame());
        let frame = session.on_frame().expect("frame");
        assert!(frame.guides.horizontal);
        assert!(!frame.guides.vertical);

        session.process_event(&InputEvent::Pointer(PointerEvent::up(1, px + 40.0, py)));
        let after = session.document().get(id).expect("element");
        assert!((after.x - (el.x + 40.0)).abs() < 1e-3);
        assert!(!session.is_dragging());
    }

    #[test]
    fn test_touch_drives_drag() {
        let mut session = EditorSession::default();
        let id = session.add_text(Language::English);
        session.on_frame();
        let el = session.document().get(id).expect("element").clone();
        let touch = |phase, x, y| {
            InputEvent::Touch(TouchEvent::new(phase, vec![TouchPoint { id: 0, x, y }]))
        };

        session.process_event(&touch(TouchPhase::Start, el.x + 1.0, el.y + 1.0));
        session.process_event(&touch(TouchPhase::Move, el.x + 1.0, el.y + 21.0));
        session.process_event(&touch(TouchPhase::End, el.x + 1.0, el.y + 21.0));
        let after = session.document().get(id).expect("element");
        assert!((after.y - (el.y + 20.0)).abs() < 1e-3);
    }

    #[test]
    fn test_double_click_opens_editor_and_blocks_drag() {
        let mut session = EditorSession::default();
        let id = session.add_text(Language::Arabic);
        session.on_frame();
        let el = session.document().get(id).expect("element").clone();

        let response = session.process_event(&InputEvent::DoubleClick {
            x: el.x + 1.0,
            y: el.y + 1.0,
        });
        assert_eq!(response, Response::EditStarted(id));
        assert_eq!(session.document().editing(), Some(id));

        let down = session.process_event(&InputEvent::Pointer(PointerEvent::down(
            1,
            el.x + 1.0,
            el.y + 1.0,
        )));
        assert_eq!(down, Response::None);
        assert!(!session.is_dragging());
    }

    #[test]
    fn test_focus_lost_commits_drag() {
        let mut session = EditorSession::default();
        let id = session.add_text(Language::English);
        session.on_frame();
        let el = session.document().get(id).expect("element").clone();

        session.process_event(&InputEvent::Pointer(PointerEvent::down(1, el.x + 1.0, el.y + 1.0)));
        session.process_event(&InputEvent::Pointer(PointerEvent::moved(1, el.x + 11.0, el.y + 1.0)));
        let response = session.process_event(&InputEvent::FocusLost);
        assert!(matches!(response, Response::Drag(DragOutcome::Committed(_))));
        assert!((session.document().get(id).expect("element").x - (el.x + 10.0)).abs() < 1e-3);
    }
}
