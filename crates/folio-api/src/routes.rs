//! Warp filters
//!
//! | method | path                                          | handler            |
//! |--------|-----------------------------------------------|--------------------|
//! | POST   | `/documents/{id}/versions/snapshot`           | `create_snapshot`  |
//! | GET    | `/documents/{id}/versions`                    | `list_versions`    |
//! | POST   | `/documents/{id}/versions/cleanup`            | `cleanup_versions` |
//! | GET    | `/documents/{id}/versions/{versionId}`        | `get_version`      |
//! | DELETE | `/documents/{id}/versions/{versionId}`        | `delete_version`   |
//! | POST   | `/documents/{id}/versions/{versionId}/restore`| `restore_version`  |
//! | GET    | `/documents/{id}/versions/{fromId}/diff`      | `diff_versions`    |
//! | POST   | `/documents/{id}/session`                     | `open_session`     |
//! | DELETE | `/documents/{id}/session`                     | `close_session`    |
//! | GET    | `/documents/{id}/state`                       | `session_state`    |
//! | POST   | `/documents/{id}/events`                      | `append_event`     |
//! | POST   | `/documents/{id}/undo`                        | `undo`             |
//! | POST   | `/documents/{id}/redo`                        | `redo`             |
//! | GET    | `/health`                                     |                    |

use crate::error::{handle_rejection, ApiError};
use crate::dto::{AppendEventBody, CleanupBody, DiffParams, OpenSessionBody, RestoreBody, SnapshotBody};
use crate::handlers;
use crate::state::AppState;
use folio_versions::ListQuery;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::future::Future;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, Rejection> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")).into())
}

/// JSON body with the API's error shape on failure
fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send + 'static,
{
    warp::body::bytes().and_then(|body: Bytes| async move { parse_json::<T>(&body) })
}

/// JSON body where an empty body means `T::default()`
fn json_or_default<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Default + Send + 'static,
{
    warp::body::bytes().and_then(|body: Bytes| async move {
        if body.iter().all(u8::is_ascii_whitespace) {
            Ok(T::default())
        } else {
            parse_json::<T>(&body)
        }
    })
}

async fn respond(
    handler: impl Future<Output = Result<Response, ApiError>>,
) -> Result<Response, Rejection> {
    handler.await.map_err(Rejection::from)
}

/// Version history routes
pub fn version_routes(
    state: AppState,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let snapshot = warp::path!("documents" / String / "versions" / "snapshot")
        .and(warp::post())
        .and(json_or_default::<SnapshotBody>())
        .and(with_state(state.clone()))
        .and_then(|id: String, body: SnapshotBody, state: AppState| {
            respond(handlers::create_snapshot(id, body, state))
        });

    let cleanup = warp::path!("documents" / String / "versions" / "cleanup")
        .and(warp::post())
        .and(json_body::<CleanupBody>())
        .and(with_state(state.clone()))
        .and_then(|id: String, body: CleanupBody, state: AppState| {
            respond(handlers::cleanup_versions(id, body, state))
        });

    let list = warp::path!("documents" / String / "versions")
        .and(warp::get())
        .and(warp::query::<ListQuery>())
        .and(with_state(state.clone()))
        .and_then(|id: String, query: ListQuery, state: AppState| {
            respond(handlers::list_versions(id, query, state))
        });

    let get = warp::path!("documents" / String / "versions" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|id: String, vid: String, state: AppState| {
            respond(handlers::get_version(id, vid, state))
        });

    let delete = warp::path!("documents" / String / "versions" / String)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(|id: String, vid: String, state: AppState| {
            respond(handlers::delete_version(id, vid, state))
        });

    let restore = warp::path!("documents" / String / "versions" / String / "restore")
        .and(warp::post())
        .and(json_or_default::<RestoreBody>())
        .and(with_state(state.clone()))
        .and_then(|id: String, vid: String, body: RestoreBody, state: AppState| {
            respond(handlers::restore_version(id, vid, body, state))
        });

    let diff = warp::path!("documents" / String / "versions" / String / "diff")
        .and(warp::get())
        .and(warp::query::<DiffParams>())
        .and(with_state(state))
        .and_then(|id: String, from: String, params: DiffParams, state: AppState| {
            respond(handlers::diff_versions(id, from, params, state))
        });

    snapshot
        .or(cleanup)
        .unify()
        .or(list)
        .unify()
        .or(get)
        .unify()
        .or(delete)
        .unify()
        .or(restore)
        .unify()
        .or(diff)
        .unify()
}

/// Document session routes
pub fn session_routes(
    state: AppState,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let open = warp::path!("documents" / String / "session")
        .and(warp::post())
        .and(json_or_default::<OpenSessionBody>())
        .and(with_state(state.clone()))
        .and_then(|id: String, body: OpenSessionBody, state: AppState| {
            respond(handlers::open_session(id, body, state))
        });

    let close = warp::path!("documents" / String / "session")
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(|id: String, state: AppState| respond(handlers::close_session(id, state)));

    let read = warp::path!("documents" / String / "state")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|id: String, state: AppState| respond(handlers::session_state(id, state)));

    let events = warp::path!("documents" / String / "events")
        .and(warp::post())
        .and(json_body::<AppendEventBody>())
        .and(with_state(state.clone()))
        .and_then(|id: String, body: AppendEventBody, state: AppState| {
            respond(handlers::append_event(id, body, state))
        });

    let undo = warp::path!("documents" / String / "undo")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(|id: String, state: AppState| respond(handlers::undo(id, state)));

    let redo = warp::path!("documents" / String / "redo")
        .and(warp::post())
        .and(with_state(state))
        .and_then(|id: String, state: AppState| respond(handlers::redo(id, state)));

    open.or(close)
        .unify()
        .or(read)
        .unify()
        .or(events)
        .unify()
        .or(undo)
        .unify()
        .or(redo)
        .unify()
}

/// Every route, with JSON error handling and request tracing
pub fn api(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })).into_response());

    health
        .or(version_routes(state.clone()))
        .unify()
        .or(session_routes(state))
        .unify()
        .recover(handle_rejection)
        .with(warp::trace::request())
}
