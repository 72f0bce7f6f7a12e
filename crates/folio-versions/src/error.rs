//! Version error types
//!
//! Every operation in this crate may suspend on the store, so errors carry
//! enough context for the caller to choose between retrying, reloading and
//! surfacing the failure.

use crate::version::VersionId;
use folio_events::DocumentId;

/// Errors raised by the version store, manager and restore coordinator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Version or document does not exist
    #[error("version {version_id} of document {document_id} not found")]
    NotFound {
        document_id: DocumentId,
        version_id: VersionId,
    },

    /// Document has no versions yet
    #[error("document {document_id} has no versions")]
    NoVersions { document_id: DocumentId },

    /// Optimistic version check failed
    ///
    /// `actual` is 0 when the document has no versions.
    #[error("version conflict: expected current version {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// Persistence collaborator failed
    #[error("version store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Request parameters are invalid
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl VersionError {
    /// Whether the caller may retry the same request later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Whether this is an optimistic concurrency failure
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Store failure with a message
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }
}
