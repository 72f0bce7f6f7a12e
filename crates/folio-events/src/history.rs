//! Undo/redo over the event log
//!
//! [`History`] owns an [`EventLog`] and the state produced by its applied
//! prefix. Undo and redo only move the log cursor; the events themselves are
//! never rewritten.
//!
//! ```text
//! record(e0..e4)            undo() x2                 record(e5)
//! [e0 e1 e2 e3 e4]          [e0 e1 e2|e3 e4]          [e0 e1 e2 e5]
//!              ^ cursor              ^ cursor                  ^ cursor
//!                           redo available            redo branch dropped
//! ```
//!
//! Undo re-derives state by replaying from the nearest cached checkpoint at or
//! before the new cursor instead of from the first event. Checkpoints are taken
//! every `checkpoint_interval` events and at every `version-saved` event, and
//! those past the cursor are dropped when a new event truncates the log.

use crate::error::{EventError, HistoryError};
use crate::event::{DocumentId, Event, EventBody, PendingEvent};
use crate::log::EventLog;
use crate::reducer::{reduce, replay_from, DocumentState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for checkpointing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Cache the state every N applied events (0 disables interval checkpoints)
    pub checkpoint_interval: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 32,
        }
    }
}

/// Undo/redo controller for one document
#[derive(Debug, Clone)]
pub struct History {
    log: EventLog,
    state: DocumentState,
    /// State after applying `events[0..=index]`
    checkpoints: BTreeMap<usize, DocumentState>,
    config: HistoryConfig,
}

impl History {
    /// Empty history
    #[must_use]
    pub fn new(document_id: DocumentId, config: HistoryConfig) -> Self {
        Self {
            log: EventLog::new(document_id),
            state: DocumentState::default(),
            checkpoints: BTreeMap::new(),
            config,
        }
    }

    /// Resume from an existing log, replaying its applied prefix
    ///
    /// # Errors
    /// Fails if any applied event cannot be reduced
    pub fn from_log(log: EventLog, config: HistoryConfig) -> Result<Self, HistoryError> {
        let mut history = Self {
            log,
            state: DocumentState::default(),
            checkpoints: BTreeMap::new(),
            config,
        };
        let mut state = DocumentState::default();
        for (index, event) in history.log.applied().iter().enumerate() {
            state = reduce(&state, event)?;
            if history.should_checkpoint(index, event) {
                history.checkpoints.insert(index, state.clone());
            }
        }
        history.state = state;
        Ok(history)
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Underlying log
    #[inline]
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Cursor into the log
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.log.cursor()
    }

    /// Whether [`undo`](Self::undo) would succeed
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.log.cursor().is_some()
    }

    /// Whether [`redo`](Self::redo) would succeed
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.log.applied_len() < self.log.len()
    }

    /// Number of cached checkpoints
    #[inline]
    #[must_use]
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Apply and append an event
    ///
    /// The event is reduced before it is appended, so an event the reducer
    /// rejects never enters the log. Returns the new cursor.
    ///
    /// # Errors
    /// Returns [`EventError::UnknownEventType`] for unrecognized bodies
    pub fn record(&mut self, pending: PendingEvent) -> Result<usize, HistoryError> {
        let event = self.log.seal(pending);
        let next = reduce(&self.state, &event)?;

        let applied = self.log.applied_len();
        if applied < self.log.len() {
            self.checkpoints.retain(|&index, _| index < applied);
        }

        let is_checkpoint = self.should_checkpoint(applied, &event);
        let cursor = self.log.commit(event);
        if is_checkpoint {
            self.checkpoints.insert(cursor, next.clone());
        }
        self.state = next;
        Ok(cursor)
    }

    /// Step back one event
    ///
    /// # Errors
    /// Returns [`HistoryError::NothingToUndo`] when no event is applied
    pub fn undo(&mut self) -> Result<&DocumentState, HistoryError> {
        let cursor = self.log.cursor().ok_or(HistoryError::NothingToUndo)?;
        let target = cursor.checked_sub(1);
        let state = self.rebuild(target)?;
        self.log.set_cursor(target)?;
        self.state = state;
        tracing::debug!(
            document_id = %self.log.document_id(),
            cursor = ?target,
            "undo"
        );
        Ok(&self.state)
    }

    /// Step forward one event
    ///
    /// # Errors
    /// Returns [`HistoryError::NothingToRedo`] when the cursor is at the tail
    pub fn redo(&mut self) -> Result<&DocumentState, HistoryError> {
        if !self.can_redo() {
            return Err(HistoryError::NothingToRedo);
        }
        let next_index = self.log.applied_len();
        let event = self.log.at(next_index)?;
        let state = reduce(&self.state, event)?;
        if self.should_checkpoint(next_index, event) {
            self.checkpoints.insert(next_index, state.clone());
        }
        self.log.set_cursor(Some(next_index))?;
        self.state = state;
        tracing::debug!(
            document_id = %self.log.document_id(),
            cursor = next_index,
            "redo"
        );
        Ok(&self.state)
    }

    /// State after applying `events[0..=target]`, from the nearest checkpoint
    fn rebuild(&self, target: Option<usize>) -> Result<DocumentState, EventError> {
        let Some(target) = target else {
            return Ok(DocumentState::default());
        };
        let (start, base) = match self.checkpoints.range(..=target).next_back() {
            Some((&index, state)) => (index + 1, state.clone()),
            None => (0, DocumentState::default()),
        };
        replay_from(base, &self.log.events()[start..=target])
    }

    fn should_checkpoint(&self, index: usize, event: &Event) -> bool {
        let interval_hit = self.config.checkpoint_interval > 0
            && (index + 1) % self.config.checkpoint_interval == 0;
        interval_hit || matches!(event.body, EventBody::VersionSaved { .. })
    }
}
