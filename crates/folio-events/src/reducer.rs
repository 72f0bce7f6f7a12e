//! Pure state reducer
//!
//! [`reduce`] maps `(state, event)` to the next state. It reads nothing but its
//! arguments, so replaying the same events always yields a bit-identical state.

use crate::error::EventError;
use crate::event::{ConnectionDirection, DocumentId, Event, EventBody};
use crate::metadata::Metadata;
use folio_content::ContentHash;
use serde::{Deserialize, Serialize};

/// Linked documents, in link order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    /// Documents feeding into this one
    pub upstream: Vec<DocumentId>,
    /// Documents this one feeds
    pub downstream: Vec<DocumentId>,
}

impl Connections {
    fn side_mut(&mut self, direction: ConnectionDirection) -> &mut Vec<DocumentId> {
        match direction {
            ConnectionDirection::Upstream => &mut self.upstream,
            ConnectionDirection::Downstream => &mut self.downstream,
        }
    }
}

/// Marker left by the last `version-saved` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMarker {
    /// Version number that was persisted
    pub version_number: u64,
    /// Hash of the content that was persisted
    pub content_hash: ContentHash,
}

/// Projection of a document's applied events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    /// Serialized content
    pub content: String,
    /// Display title
    pub title: String,
    /// Linked documents
    pub connections: Connections,
    /// Typed metadata
    pub metadata: Metadata,
    /// Last persisted version, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<SavedMarker>,
}

impl DocumentState {
    /// Hash of the current content
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_text(&self.content)
    }

    /// Whether content changed since the last saved version
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.last_saved
            .map_or(!self.content.is_empty(), |saved| !saved.content_hash.matches(&self.content))
    }
}

/// Apply one event
///
/// # Errors
/// Returns [`EventError::UnknownEventType`] for [`EventBody::Unrecognized`]
pub fn reduce(state: &DocumentState, event: &Event) -> Result<DocumentState, EventError> {
    let mut next = state.clone();
    match &event.body {
        EventBody::ContentChange { content, title } => {
            next.content.clone_from(content);
            if let Some(title) = title {
                next.title.clone_from(title);
            }
        }
        EventBody::TitleChange { title } => next.title.clone_from(title),
        EventBody::ConnectionAdd {
            direction,
            document_id,
        } => {
            let side = next.connections.side_mut(*direction);
            if !side.contains(document_id) {
                side.push(document_id.clone());
            }
        }
        EventBody::ConnectionRemove {
            direction,
            document_id,
        } => next
            .connections
            .side_mut(*direction)
            .retain(|linked| linked != document_id),
        EventBody::MetadataSet { key, value } => {
            next.metadata.insert(key.clone(), value.clone());
        }
        EventBody::MetadataRemove { key } => {
            next.metadata.remove(key);
        }
        EventBody::VersionSaved {
            version_number,
            content_hash,
        } => {
            next.last_saved = Some(SavedMarker {
                version_number: *version_number,
                content_hash: *content_hash,
            });
        }
        EventBody::Unrecognized { event_type, .. } => {
            return Err(EventError::UnknownEventType {
                event_type: event_type.clone(),
                sequence: event.sequence,
            });
        }
    }
    Ok(next)
}

/// Fold [`reduce`] over `events` starting from `initial`
///
/// # Errors
/// Stops at the first event [`reduce`] rejects
pub fn replay_from<'a, I>(initial: DocumentState, events: I) -> Result<DocumentState, EventError>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .try_fold(initial, |state, event| reduce(&state, event))
}

/// Fold [`reduce`] over `events` starting from the empty state
///
/// # Errors
/// Stops at the first event [`reduce`] rejects
pub fn replay<'a, I>(events: I) -> Result<DocumentState, EventError>
where
    I: IntoIterator<Item = &'a Event>,
{
    replay_from(DocumentState::default(), events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PendingEvent;
    use crate::log::EventLog;
    use crate::metadata::MetadataValue;
    use pretty_assertions::assert_eq;

    fn sealed(body: EventBody) -> Event {
        EventLog::new(DocumentId::new("doc")).seal(PendingEvent::new(body))
    }

    #[test]
    fn content_change_replaces_content_and_optional_title() {
        let state = reduce(
            &DocumentState::default(),
            &sealed(EventBody::ContentChange {
                content: "body".into(),
                title: Some("Intro".into()),
            }),
        )
        .unwrap();
        let state = reduce(&state, &sealed(EventBody::content("body v2"))).unwrap();
        assert_eq!(state.content, "body v2");
        assert_eq!(state.title, "Intro");
    }

    #[test]
    fn connections_are_idempotent_and_ordered() {
        let add = |id: &str| {
            sealed(EventBody::ConnectionAdd {
                direction: ConnectionDirection::Downstream,
                document_id: id.into(),
            })
        };
        let mut state = DocumentState::default();
        for event in [add("b"), add("a"), add("b")] {
            state = reduce(&state, &event).unwrap();
        }
        assert_eq!(state.connections.downstream, vec![DocumentId::from("b"), "a".into()]);
        assert!(state.connections.upstream.is_empty());

        let remove = sealed(EventBody::ConnectionRemove {
            direction: ConnectionDirection::Downstream,
            document_id: "b".into(),
        });
        let state = reduce(&state, &remove).unwrap();
        assert_eq!(state.connections.downstream, vec![DocumentId::from("a")]);
        // Removing again is a no-op
        assert_eq!(reduce(&state, &remove).unwrap(), state);
    }

    #[test]
    fn metadata_set_and_remove() {
        let key: crate::MetadataKey = "doc.status".parse().unwrap();
        let set = sealed(EventBody::MetadataSet {
            key: key.clone(),
            value: MetadataValue::Text("draft".into()),
        });
        let state = reduce(&DocumentState::default(), &set).unwrap();
        assert_eq!(state.metadata.get(&key), Some(&MetadataValue::Text("draft".into())));

        let state = reduce(&state, &sealed(EventBody::MetadataRemove { key: key.clone() })).unwrap();
        assert!(state.metadata.is_empty());
    }

    #[test]
    fn version_saved_clears_dirty_flag() {
        let state = reduce(&DocumentState::default(), &sealed(EventBody::content("x"))).unwrap();
        assert!(state.is_dirty());
        let saved = sealed(EventBody::VersionSaved {
            version_number: 1,
            content_hash: ContentHash::of_text("x"),
        });
        let state = reduce(&state, &saved).unwrap();
        assert!(!state.is_dirty());
        assert_eq!(state.last_saved.map(|m| m.version_number), Some(1));
    }

    #[test]
    fn unknown_event_type_is_fatal() {
        let event = sealed(EventBody::Unrecognized {
            event_type: "comment-add".into(),
            payload: serde_json::json!({}),
        });
        let err = reduce(&DocumentState::default(), &event).unwrap_err();
        assert_eq!(
            err,
            EventError::UnknownEventType {
                event_type: "comment-add".into(),
                sequence: 0
            }
        );
    }

    #[test]
    fn replay_stops_at_unknown_event() {
        let mut log = EventLog::new(DocumentId::new("doc"));
        log.append(PendingEvent::new(EventBody::content("a")));
        log.append(PendingEvent::new(EventBody::Unrecognized {
            event_type: "future".into(),
            payload: serde_json::Value::Null,
        }));
        log.append(PendingEvent::new(EventBody::content("c")));
        assert!(matches!(
            replay(log.events()),
            Err(EventError::UnknownEventType { sequence: 1, .. })
        ));
    }
}
