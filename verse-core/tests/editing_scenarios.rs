//! Editing Scenario Tests
//!
//! Exercises the document, drag protocol and persistence together:
//! - Adding, dragging and deleting elements
//! - Center guides during a drag
//! - Snapshot save/restore through the file store

use std::sync::Arc;

use verse_core::layout::{self, HeuristicMeasure};
use verse_core::{
    Background, Color, DragOutcome, EditorConfig, EditorSession, ElementPatch, InputEvent,
    Language, PointerEvent, Response, Snapshot, SnapshotStore, Surface,
};

fn new_session() -> EditorSession {
    EditorSession::new(EditorConfig::default(), Arc::new(HeuristicMeasure))
}

fn pointer(event: PointerEvent) -> InputEvent {
    InputEvent::Pointer(event)
}

// ============================================================================
// Document Lifecycle
// ============================================================================

#[test]
fn test_add_two_then_delete_first() {
    let mut session = new_session();
    let arabic = session.add_text(Language::Arabic);
    let english = session.add_text(Language::English);
    session.on_frame();

    let doc = session.document();
    assert_eq!(doc.element_count(), 2);
    assert_eq!(doc.selected(), Some(english));
    let en = doc.get(english).expect("english");
    assert_eq!(en.text, Language::English.default_text());
    assert!((en.font_size - 18.0).abs() < f32::EPSILON);
    assert_eq!(en.color, Color::WHITE);

    assert!(session.document_mut().delete(arabic).is_some());
    let doc = session.document();
    assert_eq!(doc.element_count(), 1);
    assert_eq!(doc.selected(), Some(english));
}

#[test]
fn test_update_unknown_and_empty_patch() {
    let mut session = new_session();
    let id = session.add_text(Language::Russian);
    session.on_frame();
    let before = session.document().get(id).expect("element").clone();

    assert!(session.document_mut().update(id, &ElementPatch::default()));
    assert_eq!(session.document().get(id), Some(&before));

    assert!(!session
        .document_mut()
        .update(verse_core::ElementId::new(), &ElementPatch::text("x")));
    assert_eq!(session.document().element_count(), 1);
}

#[test]
fn test_added_blocks_are_centered() {
    let mut session = new_session();
    for language in Language::ALL {
        let id = session.add_text(language);
        session.on_frame();
        let el = session.document().get(id).expect("element");
        let block = layout::measure_element(el, &HeuristicMeasure);
        assert!((el.x + block.block_width / 2.0 - 400.0).abs() < 0.01, "{language}");
        assert!((el.y + block.block_height / 2.0 - 300.0).abs() < 0.01, "{language}");
    }
}

// ============================================================================
// Drag Protocol
// ============================================================================

#[test]
fn test_drag_shows_guides_then_commits() {
    let mut session = new_session();
    let id = session.add_text(Language::English);
    session.on_frame();
    let start = session.document().get(id).expect("element").clone();
    let (px, py) = (start.x + 1.0, start.y + 1.0);

    session.process_event(&pointer(PointerEvent::down(1, px, py)));

    // 3 units off center: both guides on.
    session.process_event(&pointer(PointerEvent::moved(1, px + 3.0, py + 3.0)));
    let frame = session.on_frame().expect("frame");
    assert!(frame.guides.vertical && frame.guides.horizontal);

    // 6 units off center: both guides off.
    session.process_event(&pointer(PointerEvent::moved(1, px + 6.0, py - 6.0)));
    let frame = session.on_frame().expect("frame");
    assert!(!frame.guides.any());

    // Committed state has not moved during the drag.
    let during = session.document().get(id).expect("element");
    assert!((during.x - start.x).abs() < f32::EPSILON);

    let response = session.process_event(&pointer(PointerEvent::up(1, px + 6.0, py - 6.0)));
    assert!(matches!(response, Response::Drag(DragOutcome::Committed(_))));
    assert!(!session.guides().any());
    assert!(session.overlay().is_none());

    let end = session.document().get(id).expect("element");
    assert!((end.x - (start.x + 6.0)).abs() < 1e-3);
    assert!((end.y - (start.y - 6.0)).abs() < 1e-3);
}

#[test]
fn test_click_on_empty_surface_deselects() {
    let mut session = new_session();
    let id = session.add_text(Language::English);
    session.on_frame();
    assert_eq!(session.document().selected(), Some(id));

    session.process_event(&pointer(PointerEvent::down(1, 2.0, 2.0)));
    assert_eq!(session.document().selected(), None);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_session_survives_store_round_trip() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::new(tmp.path()).expect("store");

    let mut session = new_session();
    let id = session.add_text(Language::Arabic);
    session.on_frame();
    session
        .document_mut()
        .update(id, &ElementPatch::text("سطر أول\nسطر ثان"));
    session
        .document_mut()
        .set_background(Background::Color(Color::BLACK));
    assert!(store.save(&Snapshot::from_document(session.document(), Vec::new())));

    let restored = store
        .load()
        .expect("snapshot")
        .into_document(Surface::default());
    let el = restored.get(id).expect("same id");
    assert_eq!(el.text, "سطر أول\nسطر ثان");
    assert_eq!(restored.background(), Background::Color(Color::BLACK));

    let mut next = new_session();
    next.replace_document(restored);
    assert_eq!(next.document().element_count(), 1);
}
