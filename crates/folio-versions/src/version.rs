//! Version records

use chrono::{DateTime, Utc};
use folio_content::{ContentHash, TextStats};
use folio_events::{ActorId, DocumentId, DocumentState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Unique version identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub Ulid);

impl VersionId {
    /// Generate a new ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// Durable snapshot of a document, immutable once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: VersionId,
    pub document_id: DocumentId,
    /// Strictly increasing per document, never reused
    pub version_number: u64,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub word_count: u64,
    pub char_count: u64,
    pub content_hash: ContentHash,
    /// Explicit checkpoint rather than an incidental save
    pub is_snapshot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Seal a draft under the number the store assigned
    #[must_use]
    pub fn from_draft(draft: VersionDraft, version_number: u64) -> Self {
        Self {
            id: VersionId::new(),
            document_id: draft.document_id,
            version_number,
            title: draft.title,
            word_count: draft.stats.word_count,
            char_count: draft.stats.char_count,
            content_hash: draft.content_hash,
            content: draft.content,
            description: draft.description,
            is_snapshot: draft.is_snapshot,
            created_by: draft.created_by,
            created_at: draft.created_at,
        }
    }

    /// Number and ID only
    #[inline]
    #[must_use]
    pub fn to_ref(&self) -> VersionRef {
        VersionRef {
            id: self.id,
            version_number: self.version_number,
        }
    }

    /// Listing form, optionally without content
    #[must_use]
    pub fn summary(&self, include_content: bool) -> VersionSummary {
        VersionSummary {
            id: self.id,
            document_id: self.document_id.clone(),
            version_number: self.version_number,
            title: self.title.clone(),
            content: include_content.then(|| self.content.clone()),
            description: self.description.clone(),
            word_count: self.word_count,
            char_count: self.char_count,
            content_hash: self.content_hash,
            is_snapshot: self.is_snapshot,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
        }
    }
}

/// A version as it appears in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub version_number: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub word_count: u64,
    pub char_count: u64,
    pub content_hash: ContentHash,
    pub is_snapshot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,
    pub created_at: DateTime<Utc>,
}

/// Lightweight reference to a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRef {
    pub id: VersionId,
    pub version_number: u64,
}

/// Everything about a version except its identity and number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDraft {
    pub document_id: DocumentId,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub stats: TextStats,
    pub content_hash: ContentHash,
    pub is_snapshot: bool,
    pub created_by: Option<ActorId>,
    pub created_at: DateTime<Utc>,
}

impl VersionDraft {
    /// Draft from raw content; hash and counts are derived here
    #[must_use]
    pub fn new(
        document_id: DocumentId,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            document_id,
            title: title.into(),
            stats: TextStats::of(&content),
            content_hash: ContentHash::of_text(&content),
            content,
            description: None,
            is_snapshot: false,
            created_by: None,
            created_at,
        }
    }

    /// Draft of a document state
    #[must_use]
    pub fn of_state(document_id: DocumentId, state: &DocumentState, created_at: DateTime<Utc>) -> Self {
        Self::new(document_id, state.title.clone(), state.content.clone(), created_at)
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn described(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Mark as snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(mut self, is_snapshot: bool) -> Self {
        self.is_snapshot = is_snapshot;
        self
    }

    /// With author
    #[inline]
    #[must_use]
    pub fn by(mut self, created_by: Option<ActorId>) -> Self {
        self.created_by = created_by;
        self
    }
}
