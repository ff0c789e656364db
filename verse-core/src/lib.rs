//! # Verse Composer Core
//!
//! Editing logic for composing scripture and translation text on a surface.
//! Has no rendering dependencies; metrics come in through [`TextMeasure`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 verse-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Document        │  Drag Controller         │
//! │  - Elements      │  - Pointer capture       │
//! │  - Selection     │  - Overlay + guides      │
//! │  - Background    │  - Commit on release     │
//! ├─────────────────────────────────────────────┤
//! │  Layout Engine   │  Persistence             │
//! │  - Block metrics │  - Snapshot schema       │
//! │  - Centering     │  - File store            │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod document;
pub mod drag;
pub mod element;
pub mod error;
pub mod event;
pub mod layout;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod store;

pub use config::EditorConfig;
pub use document::{Background, Document};
pub use drag::{DragController, DragOutcome, FrameUpdate, Guides, Overlay};
pub use element::{Color, ElementId, ElementPatch, Language, TextElement};
pub use error::{EditorError, EditorResult};
pub use event::{InputEvent, PointerEvent, PointerPhase, TouchEvent, TouchPhase, TouchPoint};
pub use layout::{BlockMetrics, HeuristicMeasure, Rect, Surface, TextMeasure};
pub use scheduler::FrameScheduler;
pub use session::{EditorSession, Response, SharedMeasure};
pub use snapshot::{ElementRecord, FontRecord, Snapshot};
pub use store::{FileStore, SnapshotStore};

/// Verse core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
