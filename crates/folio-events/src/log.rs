//! Append-only event log with a replay cursor
//!
//! # Invariants
//!
//! 1. `events[i].sequence == i` for every stored event
//! 2. `events[i].prev_hash == events[i - 1].hash` (genesis for `i == 0`)
//! 3. `cursor` is `None` iff no event is applied; otherwise `cursor < len`
//! 4. `cursor < len - 1` only while redo history exists
//!
//! Appending while `cursor < len - 1` first truncates everything after the
//! cursor: a new edit abandons the redo branch.

use crate::error::EventError;
use crate::event::{DocumentId, Event, EventHash, PendingEvent};
use sha2::{Digest, Sha256};

/// Ordered events for one document
#[derive(Debug, Clone)]
pub struct EventLog {
    document_id: DocumentId,
    events: Vec<Event>,
    cursor: Option<usize>,
}

impl EventLog {
    /// Empty log
    #[must_use]
    pub fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            events: Vec::new(),
            cursor: None,
        }
    }

    /// Rebuild a log from stored events, cursor at the tail
    ///
    /// # Errors
    /// Returns [`EventError::ForeignEvent`] if an event belongs to another
    /// document and [`EventError::IntegrityViolation`] if the chain is broken
    pub fn from_events(document_id: DocumentId, events: Vec<Event>) -> Result<Self, EventError> {
        if let Some(foreign) = events.iter().find(|e| e.document_id != document_id) {
            return Err(EventError::ForeignEvent {
                sequence: foreign.sequence,
                expected: document_id.to_string(),
                found: foreign.document_id.to_string(),
            });
        }
        let cursor = events.len().checked_sub(1);
        let log = Self {
            document_id,
            events,
            cursor,
        };
        log.verify_chain()?;
        Ok(log)
    }

    /// Owning document
    #[inline]
    #[must_use]
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Number of stored events, including any redo branch
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing was ever appended
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Index of the last applied event
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of applied events (`cursor + 1`)
    #[inline]
    #[must_use]
    pub fn applied_len(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    /// Event at `index`
    ///
    /// # Errors
    /// Returns [`EventError::OutOfRange`] if `index >= len`
    pub fn at(&self, index: usize) -> Result<&Event, EventError> {
        self.events.get(index).ok_or(EventError::OutOfRange {
            index,
            len: self.events.len(),
        })
    }

    /// Applied prefix `events[0..=cursor]`
    #[inline]
    #[must_use]
    pub fn applied(&self) -> &[Event] {
        &self.events[..self.applied_len()]
    }

    /// Every stored event, redo branch included
    #[inline]
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Append an event, discarding any redo branch
    ///
    /// Returns the new cursor.
    pub fn append(&mut self, pending: PendingEvent) -> usize {
        let event = self.seal(pending);
        self.commit(event)
    }

    /// Seal `pending` as the event that would follow the cursor
    ///
    /// Does not modify the log; pass the result to [`commit`](Self::commit)
    /// before the cursor moves.
    pub(crate) fn seal(&self, pending: PendingEvent) -> Event {
        let applied = self.applied_len();
        let prev_hash = self
            .cursor
            .map_or(EventHash::GENESIS, |c| self.events[c].hash);
        let mut event = Event {
            id: pending.id,
            document_id: self.document_id.clone(),
            sequence: applied as u64,
            body: pending.body,
            timestamp: pending.timestamp,
            actor_id: pending.actor_id,
            prev_hash,
            hash: EventHash::GENESIS,
        };
        event.hash = chain_hash(&event);
        event
    }

    /// Truncate after the cursor and push a sealed event
    pub(crate) fn commit(&mut self, event: Event) -> usize {
        let applied = self.applied_len();
        debug_assert_eq!(event.sequence, applied as u64);
        if applied < self.events.len() {
            tracing::debug!(
                document_id = %self.document_id,
                dropped = self.events.len() - applied,
                "discarding redo branch"
            );
            self.events.truncate(applied);
        }
        self.events.push(event);
        let cursor = self.events.len() - 1;
        self.cursor = Some(cursor);
        cursor
    }

    /// Move the cursor without touching events
    pub(crate) fn set_cursor(&mut self, cursor: Option<usize>) -> Result<(), EventError> {
        if let Some(index) = cursor {
            if index >= self.events.len() {
                return Err(EventError::OutOfRange {
                    index,
                    len: self.events.len(),
                });
            }
        }
        self.cursor = cursor;
        Ok(())
    }

    /// Check sequence numbers and hash links of every stored event
    ///
    /// # Errors
    /// Returns [`EventError::IntegrityViolation`] naming the first bad event
    pub fn verify_chain(&self) -> Result<(), EventError> {
        let mut prev = EventHash::GENESIS;
        for (index, event) in self.events.iter().enumerate() {
            let violation = |reason: &str| EventError::IntegrityViolation {
                sequence: event.sequence,
                reason: reason.to_string(),
            };
            if event.sequence != index as u64 {
                return Err(violation("sequence out of order"));
            }
            if event.prev_hash != prev {
                return Err(violation("previous hash does not match"));
            }
            if event.hash != chain_hash(event) {
                return Err(violation("event hash does not match contents"));
            }
            prev = event.hash;
        }
        Ok(())
    }
}

fn chain_hash(event: &Event) -> EventHash {
    let mut hasher = Sha256::new();
    hasher.update(event.prev_hash.0);
    hasher.update(event.sequence.to_le_bytes());
    hasher.update(event.id.0.to_bytes());
    hasher.update(event.document_id.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(event.timestamp.timestamp_micros().to_le_bytes());
    if let Some(actor) = &event.actor_id {
        hasher.update(actor.as_str().as_bytes());
    }
    hasher.update([0]);
    // Bodies hold no floats and maps are ordered, so their JSON is canonical.
    let body = serde_json::to_vec(&event.body).unwrap_or_default();
    hasher.update(&body);
    EventHash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBody;

    fn log_with(contents: &[&str]) -> EventLog {
        let mut log = EventLog::new(DocumentId::new("doc-1"));
        for content in contents {
            log.append(PendingEvent::new(EventBody::content(*content)));
        }
        log
    }

    #[test]
    fn empty_log_has_no_cursor() {
        let log = EventLog::new(DocumentId::new("doc-1"));
        assert!(log.is_empty());
        assert_eq!(log.cursor(), None);
        assert!(log.applied().is_empty());
    }

    #[test]
    fn append_advances_cursor_and_sequence() {
        let mut log = log_with(&["a", "b"]);
        let index = log.append(PendingEvent::new(EventBody::content("c")));
        assert_eq!(index, 2);
        assert_eq!(log.cursor(), Some(2));
        assert_eq!(log.at(2).unwrap().sequence, 2);
        assert_eq!(log.at(1).unwrap().hash, log.at(2).unwrap().prev_hash);
    }

    #[test]
    fn at_rejects_out_of_range() {
        let log = log_with(&["a"]);
        assert_eq!(
            log.at(1).unwrap_err(),
            EventError::OutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn append_after_rewind_truncates_redo_branch() {
        let mut log = log_with(&["a", "b", "c"]);
        log.set_cursor(Some(0)).unwrap();
        let index = log.append(PendingEvent::new(EventBody::content("z")));
        assert_eq!(index, 1);
        assert_eq!(log.len(), 2);
        assert!(matches!(
            &log.at(1).unwrap().body,
            EventBody::ContentChange { content, .. } if content == "z"
        ));
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn append_after_full_rewind_starts_from_genesis() {
        let mut log = log_with(&["a", "b"]);
        log.set_cursor(None).unwrap();
        log.append(PendingEvent::new(EventBody::content("fresh")));
        assert_eq!(log.len(), 1);
        assert_eq!(log.at(0).unwrap().prev_hash, EventHash::GENESIS);
    }

    #[test]
    fn set_cursor_validates_range() {
        let mut log = log_with(&["a"]);
        assert!(log.set_cursor(Some(1)).is_err());
        assert_eq!(log.cursor(), Some(0));
    }

    #[test]
    fn tampering_breaks_the_chain() {
        let log = log_with(&["a", "b", "c"]);
        let mut events = log.events().to_vec();
        events[1].body = EventBody::content("forged");

        let err = EventLog::from_events(DocumentId::new("doc-1"), events).unwrap_err();
        assert!(matches!(err, EventError::IntegrityViolation { sequence: 1, .. }));
    }

    #[test]
    fn from_events_restores_tail_cursor() {
        let log = log_with(&["a", "b"]);
        let rebuilt =
            EventLog::from_events(DocumentId::new("doc-1"), log.events().to_vec()).unwrap();
        assert_eq!(rebuilt.cursor(), Some(1));
        assert_eq!(rebuilt.events(), log.events());
    }

    #[test]
    fn from_events_rejects_foreign_documents() {
        let log = log_with(&["a"]);
        let err = EventLog::from_events(DocumentId::new("other"), log.events().to_vec())
            .unwrap_err();
        assert!(matches!(err, EventError::ForeignEvent { .. }));
    }

    #[test]
    fn events_survive_json_round_trip_with_valid_chain() {
        let log = log_with(&["a", "b"]);
        let json = serde_json::to_string(log.events()).unwrap();
        let events: Vec<Event> = serde_json::from_str(&json).unwrap();
        assert!(EventLog::from_events(DocumentId::new("doc-1"), events).is_ok());
    }
}
