//! HTTP error mapping
//!
//! Every failure leaves the API as `{"error": <message>, "errorCode": <code>}`
//! with the status of its [`ErrorCode`].

use folio_events::{EventError, HistoryError};
use folio_versions::VersionError;
use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    VersionConflict,
    NothingToUndo,
    NothingToRedo,
    UnknownEventType,
    OutOfRange,
    BadRequest,
    StoreUnavailable,
    SessionNotOpen,
    MethodNotAllowed,
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound | Self::SessionNotOpen => StatusCode::NOT_FOUND,
            Self::VersionConflict | Self::NothingToUndo | Self::NothingToRedo => {
                StatusCode::CONFLICT
            }
            Self::UnknownEventType => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OutOfRange | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure of an API request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Malformed input
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// No session is open for the document
    #[must_use]
    pub fn session_not_open(document_id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::SessionNotOpen,
            format!("no session open for document {document_id}"),
        )
    }

    /// HTTP status
    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// JSON error response
    #[must_use]
    pub fn to_response(&self) -> warp::reply::Response {
        let body = ErrorBody {
            error: &self.message,
            error_code: self.code,
        };
        warp::reply::with_status(warp::reply::json(&body), self.status()).into_response()
    }
}

impl warp::reject::Reject for ApiError {}

impl From<VersionError> for ApiError {
    fn from(err: VersionError) -> Self {
        let code = match &err {
            VersionError::NotFound { .. } | VersionError::NoVersions { .. } => ErrorCode::NotFound,
            VersionError::VersionConflict { .. } => ErrorCode::VersionConflict,
            VersionError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            VersionError::InvalidRequest(_) => ErrorCode::BadRequest,
        };
        Self::new(code, err.to_string())
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        let code = match &err {
            EventError::UnknownEventType { .. } => ErrorCode::UnknownEventType,
            EventError::OutOfRange { .. } => ErrorCode::OutOfRange,
            EventError::IntegrityViolation { .. }
            | EventError::ForeignEvent { .. }
            | EventError::InvalidMetadataKey { .. } => ErrorCode::BadRequest,
        };
        Self::new(code, err.to_string())
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NothingToUndo => Self::new(ErrorCode::NothingToUndo, err.to_string()),
            HistoryError::NothingToRedo => Self::new(ErrorCode::NothingToRedo, err.to_string()),
            HistoryError::Event(inner) => inner.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    error_code: ErrorCode,
}

/// Turn every rejection into the JSON error shape
///
/// # Errors
/// Never fails
pub async fn handle_rejection(rejection: Rejection) -> Result<warp::reply::Response, Infallible> {
    let error = if let Some(api) = rejection.find::<ApiError>() {
        api.clone()
    } else if rejection.is_not_found() {
        ApiError::new(ErrorCode::NotFound, "no such route")
    } else if let Some(invalid) = rejection.find::<warp::reject::InvalidQuery>() {
        ApiError::bad_request(invalid.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::new(ErrorCode::MethodNotAllowed, "method not allowed")
    } else {
        tracing::error!(?rejection, "unhandled rejection");
        ApiError::new(ErrorCode::Internal, "internal error")
    };

    if error.status().is_server_error() {
        tracing::warn!(code = ?error.code, message = %error.message, "request failed");
    } else {
        tracing::debug!(code = ?error.code, message = %error.message, "request rejected");
    }
    Ok(error.to_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_events::DocumentId;

    #[test]
    fn version_errors_map_to_codes() {
        let conflict: ApiError = VersionError::VersionConflict {
            expected: 4,
            actual: 5,
        }
        .into();
        assert_eq!(conflict.code, ErrorCode::VersionConflict);
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let outage: ApiError = VersionError::unavailable("down").into();
        assert_eq!(outage.status(), StatusCode::SERVICE_UNAVAILABLE);

        let missing: ApiError = VersionError::NoVersions {
            document_id: DocumentId::new("d"),
        }
        .into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn history_errors_map_through_event_errors() {
        let unknown: ApiError = HistoryError::from(EventError::UnknownEventType {
            event_type: "x".into(),
            sequence: 0,
        })
        .into();
        assert_eq!(unknown.code, ErrorCode::UnknownEventType);
        assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let undo: ApiError = HistoryError::NothingToUndo.into();
        assert_eq!(undo.code, ErrorCode::NothingToUndo);
    }

    #[test]
    fn codes_serialize_screaming_snake() {
        let json = serde_json::to_value(ErrorCode::VersionConflict).unwrap();
        assert_eq!(json, "VERSION_CONFLICT");
        let json = serde_json::to_value(ErrorCode::SessionNotOpen).unwrap();
        assert_eq!(json, "SESSION_NOT_OPEN");
    }
}
