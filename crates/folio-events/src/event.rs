//! Domain events
//!
//! An [`Event`] is one immutable, state-changing action on a document. Callers
//! build a [`PendingEvent`]; the [`EventLog`](crate::EventLog) assigns its
//! sequence number and seals it into the hash chain on append.

use crate::metadata::{MetadataKey, MetadataValue};
use chrono::{DateTime, Utc};
use folio_content::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wrap an identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// User or agent responsible for an event
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Wrap an identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique event identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Ulid);

impl EventId {
    /// Generate a new event ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the chain a connection points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionDirection {
    /// Documents feeding into this one
    Upstream,
    /// Documents this one feeds
    Downstream,
}

/// Event type and payload
///
/// Serialized as `{"type": "...", "payload": {...}}`. Types this build does not
/// know are kept as [`EventBody::Unrecognized`] so that a log written by a newer
/// client still round-trips; the reducer refuses to apply them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBody", into = "RawBody")]
pub enum EventBody {
    /// Full replacement of the document content
    ContentChange {
        content: String,
        title: Option<String>,
    },
    /// Rename
    TitleChange { title: String },
    /// Link another document
    ConnectionAdd {
        direction: ConnectionDirection,
        document_id: DocumentId,
    },
    /// Unlink another document
    ConnectionRemove {
        direction: ConnectionDirection,
        document_id: DocumentId,
    },
    /// Set one metadata entry
    MetadataSet {
        key: MetadataKey,
        value: MetadataValue,
    },
    /// Drop one metadata entry
    MetadataRemove { key: MetadataKey },
    /// A version was persisted from the state at this point
    VersionSaved {
        version_number: u64,
        content_hash: ContentHash,
    },
    /// Type unknown to this build
    Unrecognized {
        event_type: String,
        payload: serde_json::Value,
    },
}

impl EventBody {
    /// Wire name of the event type
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::ContentChange { .. } => "content-change",
            Self::TitleChange { .. } => "title-change",
            Self::ConnectionAdd { .. } => "connection-add",
            Self::ConnectionRemove { .. } => "connection-remove",
            Self::MetadataSet { .. } => "metadata-set",
            Self::MetadataRemove { .. } => "metadata-remove",
            Self::VersionSaved { .. } => "version-saved",
            Self::Unrecognized { event_type, .. } => event_type,
        }
    }

    /// Content replacement without a title change
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self::ContentChange {
            content: content.into(),
            title: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPayload {
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct TitlePayload {
    title: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionPayload {
    direction: ConnectionDirection,
    document_id: DocumentId,
}

#[derive(Serialize, Deserialize)]
struct MetadataSetPayload {
    key: MetadataKey,
    value: MetadataValue,
}

#[derive(Serialize, Deserialize)]
struct MetadataRemovePayload {
    key: MetadataKey,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionSavedPayload {
    version_number: u64,
    content_hash: ContentHash,
}

/// Envelope form of [`EventBody`] on the wire
#[derive(Serialize, Deserialize)]
struct RawBody {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl TryFrom<RawBody> for EventBody {
    type Error = serde_json::Error;

    fn try_from(raw: RawBody) -> Result<Self, Self::Error> {
        let payload = raw.payload;
        Ok(match raw.event_type.as_str() {
            "content-change" => {
                let p: ContentPayload = serde_json::from_value(payload)?;
                Self::ContentChange {
                    content: p.content,
                    title: p.title,
                }
            }
            "title-change" => {
                let p: TitlePayload = serde_json::from_value(payload)?;
                Self::TitleChange { title: p.title }
            }
            "connection-add" => {
                let p: ConnectionPayload = serde_json::from_value(payload)?;
                Self::ConnectionAdd {
                    direction: p.direction,
                    document_id: p.document_id,
                }
            }
            "connection-remove" => {
                let p: ConnectionPayload = serde_json::from_value(payload)?;
                Self::ConnectionRemove {
                    direction: p.direction,
                    document_id: p.document_id,
                }
            }
            "metadata-set" => {
                let p: MetadataSetPayload = serde_json::from_value(payload)?;
                Self::MetadataSet {
                    key: p.key,
                    value: p.value,
                }
            }
            "metadata-remove" => {
                let p: MetadataRemovePayload = serde_json::from_value(payload)?;
                Self::MetadataRemove { key: p.key }
            }
            "version-saved" => {
                let p: VersionSavedPayload = serde_json::from_value(payload)?;
                Self::VersionSaved {
                    version_number: p.version_number,
                    content_hash: p.content_hash,
                }
            }
            _ => Self::Unrecognized {
                event_type: raw.event_type,
                payload,
            },
        })
    }
}

impl From<EventBody> for RawBody {
    fn from(body: EventBody) -> Self {
        let event_type = body.event_type().to_string();
        // Payload structs only hold strings, integers and validated keys, so
        // conversion to a JSON value cannot fail.
        let payload = match body {
            EventBody::ContentChange { content, title } => {
                serde_json::to_value(ContentPayload { content, title })
            }
            EventBody::TitleChange { title } => serde_json::to_value(TitlePayload { title }),
            EventBody::ConnectionAdd {
                direction,
                document_id,
            }
            | EventBody::ConnectionRemove {
                direction,
                document_id,
            } => serde_json::to_value(ConnectionPayload {
                direction,
                document_id,
            }),
            EventBody::MetadataSet { key, value } => {
                serde_json::to_value(MetadataSetPayload { key, value })
            }
            EventBody::MetadataRemove { key } => {
                serde_json::to_value(MetadataRemovePayload { key })
            }
            EventBody::VersionSaved {
                version_number,
                content_hash,
            } => serde_json::to_value(VersionSavedPayload {
                version_number,
                content_hash,
            }),
            EventBody::Unrecognized { payload, .. } => Ok(payload),
        }
        .unwrap_or(serde_json::Value::Null);
        Self {
            event_type,
            payload,
        }
    }
}

/// An event that has not been appended yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvent {
    /// Event ID
    pub id: EventId,
    /// Type and payload
    #[serde(flatten)]
    pub body: EventBody,
    /// When the action happened
    pub timestamp: DateTime<Utc>,
    /// Who performed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,
}

impl PendingEvent {
    /// New event stamped with the current time
    #[must_use]
    pub fn new(body: EventBody) -> Self {
        Self {
            id: EventId::new(),
            body,
            timestamp: Utc::now(),
            actor_id: None,
        }
    }

    /// With actor
    #[inline]
    #[must_use]
    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor_id = Some(actor);
        self
    }

    /// With explicit timestamp
    #[inline]
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// 32-byte SHA-256 link in the event hash chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventHash(pub [u8; 32]);

impl EventHash {
    /// Chain anchor used as `prev_hash` of the first event
    pub const GENESIS: Self = Self([0u8; 32]);
}

impl fmt::Display for EventHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for EventHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("event hash must be 32 bytes"))?;
        Ok(Self(arr))
    }
}

/// An appended, immutable event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event ID
    pub id: EventId,
    /// Owning document
    pub document_id: DocumentId,
    /// Position in the log (append index)
    pub sequence: u64,
    /// Type and payload
    #[serde(flatten)]
    pub body: EventBody,
    /// When the action happened
    pub timestamp: DateTime<Utc>,
    /// Who performed it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,
    /// Hash of the previous event
    pub prev_hash: EventHash,
    /// Hash of this event
    pub hash: EventHash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_types_round_trip() {
        let bodies = vec![
            EventBody::ContentChange {
                content: "text".into(),
                title: Some("Title".into()),
            },
            EventBody::TitleChange {
                title: "Renamed".into(),
            },
            EventBody::ConnectionAdd {
                direction: ConnectionDirection::Upstream,
                document_id: "doc-2".into(),
            },
            EventBody::MetadataSet {
                key: "doc.language".parse().unwrap(),
                value: MetadataValue::Text("en".into()),
            },
            EventBody::VersionSaved {
                version_number: 4,
                content_hash: ContentHash::of_text("text"),
            },
        ];
        for body in bodies {
            let json = serde_json::to_string(&body).unwrap();
            let back: EventBody = serde_json::from_str(&json).unwrap();
            assert_eq!(back, body);
        }
    }

    #[test]
    fn wire_shape_is_type_and_payload() {
        let json = serde_json::to_value(EventBody::content("hello")).unwrap();
        assert_eq!(json["type"], "content-change");
        assert_eq!(json["payload"]["content"], "hello");
        assert!(json["payload"].get("title").is_none());
    }

    #[test]
    fn unknown_type_is_preserved() {
        let json = r#"{"type":"comment-add","payload":{"text":"nice"}}"#;
        let body: EventBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.event_type(), "comment-add");
        assert!(matches!(body, EventBody::Unrecognized { .. }));

        let again = serde_json::to_value(&body).unwrap();
        assert_eq!(again["payload"]["text"], "nice");
    }

    #[test]
    fn malformed_known_payload_fails() {
        let json = r#"{"type":"title-change","payload":{"name":"x"}}"#;
        assert!(serde_json::from_str::<EventBody>(json).is_err());
    }

    #[test]
    fn pending_event_flattens_body() {
        let pending = PendingEvent::new(EventBody::content("x")).with_actor(ActorId::new("ana"));
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["type"], "content-change");
        assert_eq!(json["actorId"], "ana");
        let back: PendingEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, pending);
    }
}
