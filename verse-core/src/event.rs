//! Input events for direct manipulation on the working surface.

use serde::{Deserialize, Serialize};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed / contact started.
    Down,
    /// Pointer moved.
    Move,
    /// Button released / contact ended.
    Up,
    /// The platform cancelled the pointer (capture lost, palm rejection).
    Cancel,
}

/// A pointer (mouse or pen) event in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Pointer identifier, used for capture.
    pub pointer_id: u32,
    /// X position in surface coordinates.
    pub x: f32,
    /// Y position in surface coordinates.
    pub y: f32,
    /// Phase of this event.
    pub phase: PointerPhase,
}

impl PointerEvent {
    /// Create a pointer event.
    #[must_use]
    pub const fn new(pointer_id: u32, x: f32, y: f32, phase: PointerPhase) -> Self {
        Self {
            pointer_id,
            x,
            y,
            phase,
        }
    }

    /// Pointer pressed.
    #[must_use]
    pub const fn down(pointer_id: u32, x: f32, y: f32) -> Self {
        Self::new(pointer_id, x, y, PointerPhase::Down)
    }

    /// Pointer moved.
    #[must_use]
    pub const fn moved(pointer_id: u32, x: f32, y: f32) -> Self {
        Self::new(pointer_id, x, y, PointerPhase::Move)
    }

    /// Pointer released.
    #[must_use]
    pub const fn up(pointer_id: u32, x: f32, y: f32) -> Self {
        Self::new(pointer_id, x, y, PointerPhase::Up)
    }
}

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// Touch started (finger down).
    Start,
    /// Touch moved (finger dragging).
    Move,
    /// Touch ended (finger up).
    End,
    /// Touch cancelled.
    Cancel,
}

/// A single touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in surface coordinates.
    pub x: f32,
    /// Y position in surface coordinates.
    pub y: f32,
}

/// A touch event with one or more touch points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Phase of this touch event.
    pub phase: TouchPhase,
    /// All current touch points.
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    /// Create a new touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }

    /// Get the primary (first) touch point.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.touches.first()
    }

    /// Equivalent pointer event for the primary touch.
    ///
    /// Touch ids are offset so they never collide with mouse pointer ids.
    #[must_use]
    pub fn as_pointer(&self) -> Option<PointerEvent> {
        let touch = self.primary_touch()?;
        let phase = match self.phase {
            TouchPhase::Start => PointerPhase::Down,
            TouchPhase::Move => PointerPhase::Move,
            TouchPhase::End => PointerPhase::Up,
            TouchPhase::Cancel => PointerPhase::Cancel,
        };
        Some(PointerEvent::new(
            TOUCH_POINTER_BASE.saturating_add(touch.id),
            touch.x,
            touch.y,
            phase,
        ))
    }
}

/// First pointer id used for touches.
pub const TOUCH_POINTER_BASE: u32 = 1 << 16;

/// All input events the editor reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Mouse or pen input.
    Pointer(PointerEvent),

    /// Touch input; the primary touch drives dragging.
    Touch(TouchEvent),

    /// Double click: opens the inline editor on the element under the point.
    DoubleClick {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// The window lost focus; an unreleased drag must not stay uncommitted.
    FocusLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_maps_to_pointer() {
        let touch = TouchEvent::new(
            TouchPhase::End,
            vec![
                TouchPoint {
                    id: 3,
                    x: 1.0,
                    y: 2.0,
                },
                TouchPoint {
                    id: 4,
                    x: 9.0,
                    y: 9.0,
                },
            ],
        );
        let pointer = touch.as_pointer().expect("primary touch");
        assert_eq!(pointer.phase, PointerPhase::Up);
        assert_eq!(pointer.pointer_id, TOUCH_POINTER_BASE + 3);
        assert!((pointer.x - 1.0).abs() < f32::EPSILON);

        let empty = TouchEvent::new(TouchPhase::Move, Vec::new());
        assert!(empty.as_pointer().is_none());
    }

    #[test]
    fn test_input_event_serde_tagging() {
        let json = serde_json::to_value(InputEvent::FocusLost).expect("serialize");
        assert_eq!(json["type"], "FocusLost");
        let ev: InputEvent = serde_json::from_value(serde_json::json!({
            "type": "Pointer",
            "data": { "pointer_id": 1, "x": 3.0, "y": 4.0, "phase": "down" }
        }))
        .expect("deserialize");
        assert_eq!(ev, InputEvent::Pointer(PointerEvent::down(1, 3.0, 4.0)));
    }
}
