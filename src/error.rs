//! Error types for the layout engine.
//!
//! The engine is pure computation over caller-validated shapes, so the
//! taxonomy is narrow: malformed path ids, misuse of tree queries, and
//! malformed JSON at the boundary.

pub type Result<T> = std::result::Result<T, LayoutError>;

/// A path id that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("path id {id:?} does not start with the '{marker}' marker")]
    MissingMarker { id: String, marker: char },

    #[error("path id {id:?} has an unterminated multi-digit index")]
    UnterminatedIndex { id: String },

    #[error("path id {id:?} has an empty multi-digit index")]
    EmptyIndex { id: String },

    #[error("path id {id:?} has unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        id: String,
        found: char,
        offset: usize,
    },

    #[error("path id {id:?} has an index that does not fit in usize")]
    IndexOverflow { id: String },

    #[error("path id {id:?} has an unpaired breakdown index")]
    OddIndexCount { id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("node {id:?} has no breakdown")]
    NoBreakdown { id: String },

    #[error("node {id:?} not found")]
    NodeNotFound { id: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
