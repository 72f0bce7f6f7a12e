//! Request handlers
//!
//! Handlers take already-extracted inputs and return either a response or an
//! [`ApiError`]; the filters in [`crate::routes`] turn errors into rejections.

use crate::dto::{
    parse_version_id, AppendEventBody, AppendEventReply, CleanupBody, ClosedSession,
    DeletedBody, DiffFormat, DiffParams, OpenSessionBody, RestoreBody, SessionView, SnapshotBody,
};
use crate::error::ApiError;
use crate::state::AppState;
use chrono::Utc;
use folio_content::render_html;
use folio_events::{ContentEdit, DocumentId, DocumentSession, EventBody, PendingEvent};
use folio_versions::{ListQuery, RestoreRequest, SnapshotRequest, Version};
use serde::Serialize;
use tracing::{debug, info};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

type HandlerResult = Result<Response, ApiError>;

fn json<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

/// Record a stored version in the open session, if any, unless it already
/// points at that version
fn mark_saved_in_session(state: &AppState, document_id: &DocumentId, version: &Version) {
    let marked = state.sessions.with(document_id, |session| {
        let already = session
            .state()
            .last_saved
            .is_some_and(|m| m.version_number == version.version_number);
        if !already {
            session.mark_saved(version.version_number, version.content_hash)?;
        }
        Ok(())
    });
    if let Err(err) = marked {
        debug!(%document_id, error = %err, "no session to mark saved");
    }
}

pub(crate) async fn create_snapshot(
    document_id: String,
    body: SnapshotBody,
    state: AppState,
) -> HandlerResult {
    let document_id = DocumentId::new(document_id);
    let current = state
        .sessions
        .with(&document_id, |session| {
            session.flush()?;
            Ok(session.state().clone())
        })?;

    let request = SnapshotRequest {
        description: body.description,
        force: body.force_snapshot,
        created_by: body.created_by,
        is_snapshot: true,
    };
    let outcome = state
        .versions
        .create_snapshot(&document_id, &current, request)
        .await?;
    mark_saved_in_session(&state, &document_id, &outcome.version);

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(json(&outcome.version, status))
}

pub(crate) async fn list_versions(
    document_id: String,
    query: ListQuery,
    state: AppState,
) -> HandlerResult {
    let page = state
        .versions
        .list_versions(&DocumentId::new(document_id), query)
        .await?;
    Ok(json(&page, StatusCode::OK))
}

pub(crate) async fn get_version(
    document_id: String,
    version_id: String,
    state: AppState,
) -> HandlerResult {
    let version = state
        .versions
        .get_version(&DocumentId::new(document_id), parse_version_id(&version_id)?)
        .await?;
    Ok(json(&version, StatusCode::OK))
}

pub(crate) async fn delete_version(
    document_id: String,
    version_id: String,
    state: AppState,
) -> HandlerResult {
    let deleted_version_id = state
        .versions
        .delete_version(&DocumentId::new(document_id), parse_version_id(&version_id)?)
        .await?;
    Ok(json(&DeletedBody { deleted_version_id }, StatusCode::OK))
}

pub(crate) async fn restore_version(
    document_id: String,
    version_id: String,
    body: RestoreBody,
    state: AppState,
) -> HandlerResult {
    let document_id = DocumentId::new(document_id);
    let target = parse_version_id(&version_id)?;
    let request = RestoreRequest {
        description: body.description,
        expected_current: body.expected_current_version_number,
        force: body.force,
        created_by: body.created_by.clone(),
    };
    let outcome = state.restores.restore(&document_id, target, request).await?;

    // An open session follows the restored content.
    let restored = &outcome.new_version;
    let followed = state.sessions.with(&document_id, |session| {
        let mut event = PendingEvent::new(EventBody::ContentChange {
            content: restored.content.clone(),
            title: Some(restored.title.clone()),
        });
        event.actor_id.clone_from(&body.created_by);
        session.apply(event)?;
        session.mark_saved(restored.version_number, restored.content_hash)?;
        Ok(())
    });
    if followed.is_ok() {
        info!(%document_id, version_number = restored.version_number, "session moved to restored content");
    }

    Ok(json(&outcome, StatusCode::OK))
}

pub(crate) async fn diff_versions(
    document_id: String,
    from_id: String,
    params: DiffParams,
    state: AppState,
) -> HandlerResult {
    let options = params.options()?;
    let format = params.format()?;
    let from = parse_version_id(&from_id)?;
    let to = params.to_version()?;

    let diff = state
        .diffs
        .compare(&DocumentId::new(document_id), from, to, options)
        .await?;
    Ok(match format {
        DiffFormat::Json => json(&diff, StatusCode::OK),
        DiffFormat::Html => warp::reply::html(render_html(&diff.diff)).into_response(),
    })
}

pub(crate) async fn cleanup_versions(
    document_id: String,
    body: CleanupBody,
    state: AppState,
) -> HandlerResult {
    let report = state
        .versions
        .apply_retention(&DocumentId::new(document_id), body.retention_policy, Utc::now())
        .await?;
    Ok(json(&report, StatusCode::OK))
}

pub(crate) async fn open_session(
    document_id: String,
    body: OpenSessionBody,
    state: AppState,
) -> HandlerResult {
    let document_id = DocumentId::new(document_id);
    let created = state.sessions.open(&document_id, body.events)?;
    let view = state
        .sessions
        .with(&document_id, |session| Ok(SessionView::of(session)))?;
    if created {
        info!(%document_id, events = view.event_count, "session opened");
    }
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(json(&view, status))
}

pub(crate) async fn close_session(document_id: String, state: AppState) -> HandlerResult {
    let document_id = DocumentId::new(document_id);
    let events = state.sessions.close(&document_id)?;
    info!(%document_id, events = events.len(), "session closed");
    Ok(json(
        &ClosedSession {
            document_id,
            events,
        },
        StatusCode::OK,
    ))
}

pub(crate) async fn session_state(document_id: String, state: AppState) -> HandlerResult {
    let view = state
        .sessions
        .with(&DocumentId::new(document_id), |session| Ok(SessionView::of(session)))?;
    Ok(json(&view, StatusCode::OK))
}

fn append(session: &mut DocumentSession, body: AppendEventBody) -> Result<AppendEventReply, ApiError> {
    match body.body {
        EventBody::ContentChange { content, title } if body.coalesce => {
            let mut edit = ContentEdit::new(content, Utc::now());
            edit.title = title;
            edit.actor_id = body.actor_id;
            session.edit(edit)?;
        }
        other => {
            let mut event = PendingEvent::new(other);
            event.actor_id = body.actor_id;
            session.apply(event)?;
        }
    }
    Ok(AppendEventReply {
        index: session.log().cursor(),
        pending_edits: session.has_pending_edits(),
        state: session.state().clone(),
    })
}

pub(crate) async fn append_event(
    document_id: String,
    body: AppendEventBody,
    state: AppState,
) -> HandlerResult {
    let document_id = DocumentId::new(document_id);
    let (reply, events_since_save, last_saved_at) =
        state.sessions.with(&document_id, |session| {
            let reply = append(session, body)?;
            let last_saved_at = session.last_saved_at().unwrap_or_else(|| session.opened_at());
            Ok((reply, session.events_since_save(), last_saved_at))
        })?;

    let auto = state
        .versions
        .maybe_auto_snapshot(
            &document_id,
            &reply.state,
            events_since_save,
            last_saved_at,
            Utc::now(),
        )
        .await;
    match auto {
        Ok(Some(outcome)) => mark_saved_in_session(&state, &document_id, &outcome.version),
        Ok(None) => {}
        // The event is already applied; a failed auto-save must not fail it.
        Err(err) => tracing::warn!(%document_id, error = %err, "automatic snapshot failed"),
    }

    Ok(json(&reply, StatusCode::OK))
}

pub(crate) async fn undo(document_id: String, state: AppState) -> HandlerResult {
    let view = state.sessions.with(&DocumentId::new(document_id), |session| {
        session.undo()?;
        Ok(SessionView::of(session))
    })?;
    Ok(json(&view, StatusCode::OK))
}

pub(crate) async fn redo(document_id: String, state: AppState) -> HandlerResult {
    let view = state.sessions.with(&DocumentId::new(document_id), |session| {
        session.redo()?;
        Ok(SessionView::of(session))
    })?;
    Ok(json(&view, StatusCode::OK))
}
