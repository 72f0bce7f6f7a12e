//! Request and response bodies

use folio_content::{DiffOptions, Granularity};
use folio_events::{ActorId, DocumentId, DocumentSession, DocumentState, Event, EventBody};
use folio_versions::{RetentionPolicy, VersionId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `POST /documents/{id}/versions/snapshot`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotBody {
    pub description: Option<String>,
    pub force_snapshot: bool,
    pub created_by: Option<ActorId>,
}

/// `POST /documents/{id}/versions/{versionId}/restore`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestoreBody {
    pub description: Option<String>,
    pub expected_current_version_number: Option<u64>,
    pub force: bool,
    pub created_by: Option<ActorId>,
}

/// `POST /documents/{id}/versions/cleanup`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupBody {
    pub retention_policy: RetentionPolicy,
}

/// `DELETE /documents/{id}/versions/{versionId}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBody {
    pub deleted_version_id: VersionId,
}

/// Query of `GET /documents/{id}/versions/{fromId}/diff`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffParams {
    pub to_id: Option<String>,
    #[serde(rename = "type")]
    pub granularity: Option<String>,
    pub format: Option<String>,
    pub ignore_whitespace: bool,
}

/// Output format of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffFormat {
    Json,
    Html,
}

impl DiffParams {
    /// Engine options
    ///
    /// # Errors
    /// Unknown `type`
    pub fn options(&self) -> Result<DiffOptions, ApiError> {
        let granularity = match self.granularity.as_deref() {
            None => Granularity::default(),
            Some(name) => name
                .parse::<Granularity>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
        };
        Ok(DiffOptions::new()
            .with_granularity(granularity)
            .ignoring_whitespace(self.ignore_whitespace))
    }

    /// Requested output format
    ///
    /// # Errors
    /// Unknown `format`
    pub fn format(&self) -> Result<DiffFormat, ApiError> {
        match self.format.as_deref() {
            None | Some("json") => Ok(DiffFormat::Json),
            Some("html") => Ok(DiffFormat::Html),
            Some(other) => Err(ApiError::bad_request(format!(
                "unknown diff format '{other}' (expected json or html)"
            ))),
        }
    }

    /// Parsed `toId`
    ///
    /// # Errors
    /// Malformed ID
    pub fn to_version(&self) -> Result<Option<VersionId>, ApiError> {
        self.to_id.as_deref().map(parse_version_id).transpose()
    }
}

/// `POST /documents/{id}/session`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenSessionBody {
    /// Previously stored events to resume from
    pub events: Vec<Event>,
}

/// `POST /documents/{id}/events`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEventBody {
    pub body: EventBody,
    #[serde(default)]
    pub actor_id: Option<ActorId>,
    /// Route `content-change` through the coalescing buffer
    #[serde(default)]
    pub coalesce: bool,
}

/// Response of `POST /documents/{id}/events`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEventReply {
    /// Log cursor after the append
    pub index: Option<usize>,
    /// Whether edits wait in the coalescing buffer
    pub pending_edits: bool,
    pub state: DocumentState,
}

/// Session snapshot returned by session endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub document_id: DocumentId,
    pub cursor: Option<usize>,
    pub event_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub pending_edits: bool,
    pub state: DocumentState,
}

impl SessionView {
    #[must_use]
    pub fn of(session: &DocumentSession) -> Self {
        Self {
            document_id: session.document_id().clone(),
            cursor: session.log().cursor(),
            event_count: session.log().len(),
            can_undo: session.can_undo(),
            can_redo: session.can_redo(),
            pending_edits: session.has_pending_edits(),
            state: session.state().clone(),
        }
    }
}

/// Response of `DELETE /documents/{id}/session`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSession {
    pub document_id: DocumentId,
    pub events: Vec<Event>,
}

/// Parse a version ID path segment
///
/// # Errors
/// [`ApiError::bad_request`] for anything that is not a ULID
pub fn parse_version_id(raw: &str) -> Result<VersionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("invalid version id '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_params_parse_type_and_format() {
        let params = DiffParams {
            granularity: Some("lines".into()),
            format: Some("html".into()),
            ignore_whitespace: true,
            ..DiffParams::default()
        };
        let options = params.options().unwrap();
        assert_eq!(options.granularity, Granularity::Lines);
        assert!(options.ignore_whitespace);
        assert_eq!(params.format().unwrap(), DiffFormat::Html);
    }

    #[test]
    fn bad_diff_params_are_rejected() {
        let params = DiffParams {
            granularity: Some("paragraphs".into()),
            format: Some("pdf".into()),
            to_id: Some("nope".into()),
            ..DiffParams::default()
        };
        assert!(params.options().is_err());
        assert!(params.format().is_err());
        assert!(params.to_version().is_err());
    }

    #[test]
    fn append_body_reads_wire_event() {
        let body: AppendEventBody = serde_json::from_str(
            r#"{"body":{"type":"title-change","payload":{"title":"Hi"}},"actorId":"ana"}"#,
        )
        .unwrap();
        assert_eq!(body.body.event_type(), "title-change");
        assert_eq!(body.actor_id, Some(ActorId::new("ana")));
        assert!(!body.coalesce);
    }
}
