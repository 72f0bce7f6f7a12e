//! Per-document editing session
//!
//! A [`DocumentSession`] is created when a document is opened and dropped when
//! it is closed. It owns everything the editor mutates synchronously: the
//! coalescing buffer, the event log and the undo/redo controller. Nothing is
//! shared between sessions and nothing lives in globals.

use crate::coalesce::{CoalesceConfig, CoalescingBuffer, ContentEdit};
use crate::error::HistoryError;
use crate::event::{DocumentId, Event, EventBody, PendingEvent};
use crate::history::{History, HistoryConfig};
use crate::log::EventLog;
use crate::reducer::DocumentState;
use chrono::{DateTime, Utc};
use folio_content::ContentHash;
use serde::{Deserialize, Serialize};

/// Session configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Content edit coalescing
    pub coalesce: CoalesceConfig,
    /// Undo checkpointing
    pub history: HistoryConfig,
}

/// Editing session for one open document
#[derive(Debug, Clone)]
pub struct DocumentSession {
    history: History,
    buffer: CoalescingBuffer,
    opened_at: DateTime<Utc>,
}

impl DocumentSession {
    /// Open a session on a document with no history
    #[must_use]
    pub fn open(document_id: DocumentId, config: SessionConfig) -> Self {
        tracing::debug!(%document_id, "opening session");
        Self {
            history: History::new(document_id, config.history),
            buffer: CoalescingBuffer::new(config.coalesce),
            opened_at: Utc::now(),
        }
    }

    /// Open a session over previously stored events
    ///
    /// # Errors
    /// Fails if the events do not form a valid chain for `document_id` or an
    /// event cannot be replayed
    pub fn resume(
        document_id: DocumentId,
        events: Vec<Event>,
        config: SessionConfig,
    ) -> Result<Self, HistoryError> {
        let log = EventLog::from_events(document_id, events)?;
        tracing::debug!(document_id = %log.document_id(), events = log.len(), "resuming session");
        Ok(Self {
            history: History::from_log(log, config.history)?,
            buffer: CoalescingBuffer::new(config.coalesce),
            opened_at: Utc::now(),
        })
    }

    /// Document this session edits
    #[inline]
    #[must_use]
    pub fn document_id(&self) -> &DocumentId {
        self.history.log().document_id()
    }

    /// When the session was opened
    #[inline]
    #[must_use]
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// State of the applied events (buffered edits excluded)
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DocumentState {
        self.history.state()
    }

    /// Event log
    #[inline]
    #[must_use]
    pub fn log(&self) -> &EventLog {
        self.history.log()
    }

    /// Whether undo is possible, counting buffered edits
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.buffer.has_pending() || self.history.can_undo()
    }

    /// Whether redo is possible
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.buffer.has_pending() && self.history.can_redo()
    }

    /// Whether edits are waiting in the coalescing buffer
    #[inline]
    #[must_use]
    pub fn has_pending_edits(&self) -> bool {
        self.buffer.has_pending()
    }

    /// Append a discrete event
    ///
    /// Buffered edits are committed first so the log keeps the order in which
    /// actions happened. Returns the new cursor.
    ///
    /// # Errors
    /// Fails if the reducer rejects the event
    pub fn apply(&mut self, pending: PendingEvent) -> Result<usize, HistoryError> {
        self.flush()?;
        self.history.record(pending)
    }

    /// Feed a content edit through the coalescing buffer
    ///
    /// Returns the cursor after any events the edit released.
    ///
    /// # Errors
    /// Fails if a released event is rejected by the reducer
    pub fn edit(&mut self, edit: ContentEdit) -> Result<Option<usize>, HistoryError> {
        let mut cursor = None;
        for pending in self.buffer.push(edit) {
            cursor = Some(self.history.record(pending)?);
        }
        Ok(cursor)
    }

    /// Commit the buffered burst if it has gone idle
    ///
    /// # Errors
    /// Fails if the released event is rejected by the reducer
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<usize>, HistoryError> {
        self.buffer
            .poll(now)
            .map(|pending| self.history.record(pending))
            .transpose()
    }

    /// Commit the buffered burst now
    ///
    /// # Errors
    /// Fails if the released event is rejected by the reducer
    pub fn flush(&mut self) -> Result<Option<usize>, HistoryError> {
        self.buffer
            .flush()
            .map(|pending| self.history.record(pending))
            .transpose()
    }

    /// Undo, committing buffered edits first so they are what gets undone
    ///
    /// # Errors
    /// Returns [`HistoryError::NothingToUndo`] when nothing is applied
    pub fn undo(&mut self) -> Result<&DocumentState, HistoryError> {
        self.flush()?;
        self.history.undo()
    }

    /// Redo
    ///
    /// # Errors
    /// Returns [`HistoryError::NothingToRedo`] at the tail of the log
    pub fn redo(&mut self) -> Result<&DocumentState, HistoryError> {
        self.flush()?;
        self.history.redo()
    }

    /// Record that a version was persisted from the current state
    ///
    /// # Errors
    /// Fails only if the reducer rejects the event
    pub fn mark_saved(
        &mut self,
        version_number: u64,
        content_hash: ContentHash,
    ) -> Result<usize, HistoryError> {
        self.apply(PendingEvent::new(EventBody::VersionSaved {
            version_number,
            content_hash,
        }))
    }

    /// Events applied since the last `version-saved` event
    #[must_use]
    pub fn events_since_save(&self) -> usize {
        self.log()
            .applied()
            .iter()
            .rev()
            .take_while(|e| !matches!(e.body, EventBody::VersionSaved { .. }))
            .count()
    }

    /// Timestamp of the last applied `version-saved` event
    #[must_use]
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.log()
            .applied()
            .iter()
            .rev()
            .find(|e| matches!(e.body, EventBody::VersionSaved { .. }))
            .map(|e| e.timestamp)
    }

    /// Close the session, committing buffered edits
    ///
    /// Returns every stored event so the caller can persist the log.
    ///
    /// # Errors
    /// Fails if the final flush is rejected by the reducer
    pub fn close(mut self) -> Result<Vec<Event>, HistoryError> {
        self.flush()?;
        tracing::debug!(document_id = %self.document_id(), events = self.log().len(), "closing session");
        Ok(self.history.log().events().to_vec())
    }
}
