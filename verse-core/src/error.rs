//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Element not found in the document.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Operation not permitted for this element or state.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// Snapshot serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot storage I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
