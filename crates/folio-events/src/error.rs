//! Error types for the event log and history controller
//!
//! Everything here is raised synchronously by in-memory operations and is
//! deterministic: retrying the same call against the same log fails the same way.

/// Errors raised by the event log and the reducer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// Index outside `[0, len)`
    #[error("event index {index} out of range (log has {len} events)")]
    OutOfRange { index: usize, len: usize },

    /// Reducer met an event type it does not understand
    ///
    /// Fatal to replay: skipping the event would silently corrupt history.
    #[error("unknown event type '{event_type}' at sequence {sequence}")]
    UnknownEventType { event_type: String, sequence: u64 },

    /// Stored events do not form an unbroken hash chain
    #[error("event chain broken at sequence {sequence}: {reason}")]
    IntegrityViolation { sequence: u64, reason: String },

    /// Event belongs to another document
    #[error("event {sequence} belongs to document {found}, expected {expected}")]
    ForeignEvent {
        sequence: u64,
        expected: String,
        found: String,
    },

    /// Metadata key does not follow `namespace.name`
    #[error("invalid metadata key '{key}': {reason}")]
    InvalidMetadataKey { key: String, reason: &'static str },
}

/// Errors raised by undo/redo and session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Cursor already before the first event
    #[error("nothing to undo")]
    NothingToUndo,

    /// Cursor already at the tail
    #[error("nothing to redo")]
    NothingToRedo,

    /// Log or reducer failure
    #[error(transparent)]
    Event(#[from] EventError),
}

impl HistoryError {
    /// Benign no-op errors that can be shown to the user as-is
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NothingToUndo | Self::NothingToRedo)
    }
}
