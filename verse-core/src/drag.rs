//! Pointer-driven repositioning of one element at a time.
//!
//! ```text
//!   Idle ──pointer down on element──▶ Dragging ──pointer up / cancel──▶ Idle
//!                                       │  ▲
//!                                       └──┘ pointer move (overlay only)
//! ```
//!
//! While dragging, the position lives only in the overlay: the document is
//! written once, on release. Guides are recomputed on the coalesced frame.

use crate::document::Document;
use crate::element::{ElementId, ElementPatch};
use crate::event::PointerEvent;
use crate::layout::{self, TextMeasure};
use crate::scheduler::FrameScheduler;

/// Default distance within which an element snaps a guide on.
pub const DEFAULT_GUIDE_TOLERANCE: f32 = 5.0;

/// Visibility of the center guides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guides {
    /// Vertical line through the surface's horizontal center.
    pub vertical: bool,
    /// Horizontal line through the surface's vertical center.
    pub horizontal: bool,
}

impl Guides {
    /// Whether either guide is shown.
    #[must_use]
    pub fn any(&self) -> bool {
        self.vertical || self.horizontal
    }
}

/// Render-only position of the element being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    /// Dragged element.
    pub element: ElementId,
    /// Left edge shown on screen.
    pub x: f32,
    /// Top edge shown on screen.
    pub y: f32,
}

/// Result of feeding an event to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// A drag started on this element, which is now selected.
    Started(ElementId),
    /// Pointer down on empty surface cleared the selection.
    Deselected,
    /// The overlay moved; `request_frame` asks the host for a frame callback.
    Moved {
        /// New overlay position.
        overlay: Overlay,
        /// Whether a new frame must be requested.
        request_frame: bool,
    },
    /// The final position was written to the document.
    Committed(Overlay),
    /// The event did not apply to the current state.
    Ignored,
}

/// Batched result of one display frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    /// Overlay position at this frame.
    pub overlay: Overlay,
    /// Guide visibility at this frame.
    pub guides: Guides,
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    element: ElementId,
    pointer_id: u32,
    start_pointer: (f32, f32),
    start_position: (f32, f32),
    latest: (f32, f32),
}

impl DragSession {
    fn overlay(&self) -> Overlay {
        Overlay {
            element: self.element,
            x: self.latest.0,
            y: self.latest.1,
        }
    }
}

/// The drag state machine.
#[derive(Debug, Clone)]
pub struct DragController {
    session: Option<DragSession>,
    scheduler: FrameScheduler<Overlay>,
    guides: Guides,
    tolerance: f32,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_GUIDE_TOLERANCE)
    }
}

impl DragController {
    /// Create an idle controller with the given guide tolerance.
    #[must_use]
    pub fn new(tolerance: f32) -> Self {
        Self {
            session: None,
            scheduler: FrameScheduler::new(),
            guides: Guides::default(),
            tolerance,
        }
    }

    /// Pointer pressed. `target` is the element under the pointer, if any.
    ///
    /// Ignored while another drag is in progress.
    pub fn pointer_down(
        &mut self,
        doc: &mut Document,
        target: Option<ElementId>,
        event: PointerEvent,
    ) -> DragOutcome {
        if self.session.is_some() {
            tracing::debug!("Pointer {} down ignored: drag in progress", event.pointer_id);
            return DragOutcome::Ignored;
        }
        let Some(element) = target.and_then(|id| doc.get(id)) else {
            doc.select(None);
            return DragOutcome::Deselected;
        };

        let id = element.id;
        let start_position = (element.x, element.y);
        self.session = Some(DragSession {
            element: id,
            pointer_id: event.pointer_id,
            start_pointer: (event.x, event.y),
            start_position,
            latest: start_position,
        });
        doc.select(Some(id));
        tracing::debug!("Drag started on {id} with pointer {}", event.pointer_id);
        DragOutcome::Started(id)
    }

    /// Pointer moved. Only the captured pointer moves the overlay.
    pub fn pointer_move(&mut self, event: PointerEvent) -> DragOutcome {
        let Some(session) = self.session.as_mut() else {
            return DragOutcome::Ignored;
        };
        if session.pointer_id != event.pointer_id {
            return DragOutcome::Ignored;
        }
        let dx = event.x - session.start_pointer.0;
        let dy = event.y - session.start_pointer.1;
        session.latest = (session.start_position.0 + dx, session.start_position.1 + dy);

        let overlay = session.overlay();
        let request_frame = self.scheduler.schedule(overlay);
        DragOutcome::Moved {
            overlay,
            request_frame,
        }
    }

    /// Frame tick: applies the batched position and recomputes guides.
    ///
    /// Returns `None` when nothing was scheduled since the last frame.
    pub fn on_frame(&mut self, doc: &Document, measurer: &dyn TextMeasure) -> Option<FrameUpdate> {
        let overlay = self.scheduler.take()?;
        if self.session.is_none() {
            return None;
        }
        self.guides = compute_guides(doc, overlay, measurer, self.tolerance);
        Some(FrameUpdate {
            overlay,
            guides: self.guides,
        })
    }

    /// Pointer released: commit the last computed position.
    pub fn pointer_up(&mut self, doc: &mut Document, event: PointerEvent) -> DragOutcome {
        match self.session {
            Some(session) if session.pointer_id == event.pointer_id => self.commit(doc),
            _ => DragOutcome::Ignored,
        }
    }

    /// The platform cancelled the captured pointer: safety commit.
    pub fn pointer_cancel(&mut self, doc: &mut Document, event: PointerEvent) -> DragOutcome {
        match self.session {
            Some(session) if session.pointer_id == event.pointer_id => self.focus_lost(doc),
            _ => DragOutcome::Ignored,
        }
    }

    /// The window lost focus mid-drag.
    ///
    /// Commits the last computed position so the document never lags behind
    /// what the user saw.
    pub fn focus_lost(&mut self, doc: &mut Document) -> DragOutcome {
        if self.session.is_none() {
            return DragOutcome::Ignored;
        }
        tracing::warn!("Drag interrupted without release, committing last position");
        self.commit(doc)
    }

    fn commit(&mut self, doc: &mut Document) -> DragOutcome {
        let Some(session) = self.session.take() else {
            return DragOutcome::Ignored;
        };
        self.scheduler.cancel();
        self.guides = Guides::default();

        let overlay = session.overlay();
        if !doc.update(session.element, &ElementPatch::position(overlay.x, overlay.y)) {
            tracing::debug!("Dragged element {} vanished before commit", session.element);
            return DragOutcome::Ignored;
        }
        tracing::debug!(
            "Drag committed {} at ({:.1}, {:.1})",
            overlay.element,
            overlay.x,
            overlay.y
        );
        DragOutcome::Committed(overlay)
    }

    /// Render-only position of the dragged element.
    #[must_use]
    pub fn overlay(&self) -> Option<Overlay> {
        self.session.as_ref().map(DragSession::overlay)
    }

    /// Current guide visibility.
    #[must_use]
    pub fn guides(&self) -> Guides {
        self.guides
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a frame is waiting to run.
    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Guide tolerance in surface units.
    #[must_use]
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }
}

/// Guide visibility for an element shown at the overlay position.
#[must_use]
pub fn compute_guides(
    doc: &Document,
    overlay: Overlay,
    measurer: &dyn TextMeasure,
    tolerance: f32,
) -> Guides {
    let Some(element) = doc.get(overlay.element) else {
        return Guides::default();
    };
    let block = layout::measure_element(element, measurer);
    let surface = doc.surface();
    let center_x = overlay.x + block.block_width / 2.0;
    let center_y = overlay.y + block.block_height / 2.0;
    Guides {
        vertical: (center_x - surface.center_x()).abs() < tolerance,
        horizontal: (center_y - surface.center_y()).abs() < tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Language, TextElement};
    use crate::layout::HeuristicMeasure;

    fn doc_with_element(x: f32, y: f32) -> (Document, ElementId) {
        let mut doc = Document::new(800.0, 600.0);
        let id = doc.insert(
            TextElement::new(Language::English)
                .with_text("drag me")
                .with_position(x, y),
        );
        (doc, id)
    }

    #[test]
    fn test_drag_moves_overlay_not_document() {
        let (mut doc, id) = doc_with_element(100.0, 100.0);
        let mut drag = DragController::default();

        assert_eq!(
            drag.pointer_down(&mut doc, Some(id), PointerEvent::down(1, 110.0, 105.0)),
            DragOutcome::Started(id)
        );
        assert_eq!(doc.selected(), Some(id));

        let outcome = drag.pointer_move(PointerEvent::moved(1, 140.0, 125.0));
        assert!(matches!(
            outcome,
            DragOutcome::Moved {
                request_frame: true,
                ..
            }
        ));
        let overlay = drag.overlay().expect("overlay");
        assert!((overlay.x - 130.0).abs() < f32::EPSILON);
        assert!((overlay.y - 120.0).abs() < f32::EPSILON);

        let committed = doc.get(id).expect("element");
        assert!((committed.x - 100.0).abs() < f32::EPSILON);
        assert!((committed.y - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_release_commits_last_position() {
        let (mut doc, id) = doc_with_element(0.0, 0.0);
        let mut drag = DragController::default();
        drag.pointer_down(&mut doc, Some(id), PointerEvent::down(7, 10.0, 10.0));
        drag.pointer_move(PointerEvent::moved(7, 20.0, 30.0));
        drag.pointer_move(PointerEvent::moved(7, 25.0, 40.0));

        let outcome = drag.pointer_up(&mut doc, PointerEvent::up(7, 999.0, 999.0));
        assert!(matches!(outcome, DragOutcome::Committed(_)));
        let el = doc.get(id).expect("element");
        assert!((el.x - 15.0).abs() < f32::EPSILON);
        assert!((el.y - 30.0).abs() < f32::EPSILON);
        assert!(!drag.is_dragging());
        assert!(drag.overlay().is_none());
        assert!(!drag.frame_pending());
    }

    #[test]
    fn test_moves_coalesce_into_one_frame() {
        let (mut doc, id) = doc_with_element(0.0, 0.0);
        let mut drag = DragController::default();
        drag.pointer_down(&mut doc, Some(id), PointerEvent::down(1, 0.0, 0.0));

        let mut frame_requests = 0;
        for step in 1..=10 {
            #[allow(clippy::cast_precision_loss)]
            let v = step as f32;
            if let DragOutcome::Moved {
                request_frame: true,
                ..
            } = drag.pointer_move(PointerEvent::moved(1, v, v))
            {
                frame_requests += 1;
            }
        }
        assert_eq!(frame_requests, 1);

        let frame = drag.on_frame(&doc, &HeuristicMeasure).expect("frame");
        assert!((frame.overlay.x - 10.0).abs() < f32::EPSILON);
        assert!(drag.on_frame(&doc, &HeuristicMeasure).is_none());
    }

    #[test]
    fn test_second_pointer_down_ignored_while_dragging() {
        let (mut doc, first) = doc_with_element(0.0, 0.0);
        let second = doc.insert(TextElement::new(Language::Arabic).with_position(300.0, 300.0));
        let mut drag = DragController::default();

        drag.pointer_down(&mut doc, Some(first), PointerEvent::down(1, 0.0, 0.0));
        assert_eq!(
            drag.pointer_down(&mut doc, Some(second), PointerEvent::down(2, 300.0, 300.0)),
            DragOutcome::Ignored
        );
        assert_eq!(doc.selected(), Some(first));
        assert_eq!(
            drag.pointer_move(PointerEvent::moved(2, 50.0, 50.0)),
            DragOutcome::Ignored
        );
        assert_eq!(
            drag.pointer_up(&mut doc, PointerEvent::up(2, 50.0, 50.0)),
            DragOutcome::Ignored
        );
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_pointer_down_on_empty_surface_deselects() {
        let (mut doc, id) = doc_with_element(0.0, 0.0);
        doc.select(Some(id));
        let mut drag = DragController::default();
        assert_eq!(
            drag.pointer_down(&mut doc, None, PointerEvent::down(1, 700.0, 500.0)),
            DragOutcome::Deselected
        );
        assert_eq!(doc.selected(), None);
    }

    #[test]
    fn test_guides_toggle_with_tolerance() {
        let (mut doc, id) = doc_with_element(0.0, 0.0);
        let block = layout::measure_element(doc.get(id).expect("element"), &HeuristicMeasure);
        let centered_x = 400.0 - block.block_width / 2.0;
        let mut drag = DragController::default();

        drag.pointer_down(&mut doc, Some(id), PointerEvent::down(1, 0.0, 0.0));

        drag.pointer_move(PointerEvent::moved(1, centered_x + 3.0, 0.0));
        let frame = drag.on_frame(&doc, &HeuristicMeasure).expect("frame");
        assert!(frame.guides.vertical);
        assert!(!frame.guides.horizontal);

        drag.pointer_move(PointerEvent::moved(1, centered_x + 6.0, 0.0));
        let frame = drag.on_frame(&doc, &HeuristicMeasure).expect("frame");
        assert!(!frame.guides.vertical);

        drag.pointer_up(&mut doc, PointerEvent::up(1, 0.0, 0.0));
        assert!(!drag.guides().any());
    }

    #[test]
    fn test_focus_loss_commits() {
        let (mut doc, id) = doc_with_element(5.0, 5.0);
        let mut drag = DragController::default();
        drag.pointer_down(&mut doc, Some(id), PointerEvent::down(1, 0.0, 0.0));
        drag.pointer_move(PointerEvent::moved(1, 10.0, 0.0));

        assert!(matches!(drag.focus_lost(&mut doc), DragOutcome::Committed(_)));
        assert!((doc.get(id).expect("element").x - 15.0).abs() < f32::EPSILON);
        assert_eq!(drag.focus_lost(&mut doc), DragOutcome::Ignored);

        // A fresh pointer-down works after recovery.
        assert_eq!(
            drag.pointer_down(&mut doc, Some(id), PointerEvent::down(2, 0.0, 0.0)),
            DragOutcome::Started(id)
        );
    }

    #[test]
    fn test_cancel_of_other_pointer_ignored() {
        let (mut doc, id) = doc_with_element(0.0, 0.0);
        let mut drag = DragController::default();
        drag.pointer_down(&mut doc, Some(id), PointerEvent::down(1, 0.0, 0.0));
        drag.pointer_move(PointerEvent::moved(1, 4.0, 4.0));
        let stray = PointerEvent::new(2, 0.0, 0.0, crate::event::PointerPhase::Cancel);
        assert_eq!(drag.pointer_cancel(&mut doc, stray), DragOutcome::Ignored);
        let own = PointerEvent::new(1, 0.0, 0.0, crate::event::PointerPhase::Cancel);
        assert!(matches!(drag.pointer_cancel(&mut doc, own), DragOutcome::Committed(_)));
        assert!((doc.get(id).expect("element").y - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_commit_of_deleted_element_is_ignored() {
        let (mut doc, id) = doc_with_element(0.0, 0.0);
        let mut drag = DragController::default();
        drag.pointer_down(&mut doc, Some(id), PointerEvent::down(1, 0.0, 0.0));
        doc.delete(id);
        assert_eq!(
            drag.pointer_up(&mut doc, PointerEvent::up(1, 0.0, 0.0)),
            DragOutcome::Ignored
        );
        assert!(!drag.is_dragging());
    }
}
