//! End-to-end tests of the HTTP surface over an in-memory store

use folio_api::api;
use folio_test_utils::{app_state, doc, manager, seed_versions, store};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::Filter;

async fn call<F>(filter: &F, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value)
where
    F: Filter + 'static,
    F::Extract: warp::Reply + Send,
{
    let mut request = warp::test::request().method(method).path(path);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.reply(filter).await;
    let status = response.status();
    let value = if response.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(response.body()).unwrap()
    };
    (status, value)
}

fn content_change(content: &str) -> Value {
    json!({ "body": { "type": "content-change", "payload": { "content": content } } })
}

#[tokio::test]
async fn test_session_open_edit_undo_redo() {
    let routes = api(app_state(store()));

    let (status, view) = call(&routes, "POST", "/documents/d1/session", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["eventCount"], 0);
    let (status, _) = call(&routes, "POST", "/documents/d1/session", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = call(&routes, "POST", "/documents/d1/undo", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["errorCode"], "NOTHING_TO_UNDO");

    for content in ["a", "ab"] {
        let (status, reply) =
            call(&routes, "POST", "/documents/d1/events", Some(content_change(content))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["state"]["content"], content);
    }

    let (status, view) = call(&routes, "POST", "/documents/d1/undo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["state"]["content"], "a");
    assert_eq!(view["canRedo"], true);

    let (_, view) = call(&routes, "POST", "/documents/d1/redo", None).await;
    assert_eq!(view["state"]["content"], "ab");

    let (status, err) = call(&routes, "POST", "/documents/d1/redo", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["errorCode"], "NOTHING_TO_REDO");
}

#[tokio::test]
async fn test_unknown_event_type_is_unprocessable() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;

    let body = json!({ "body": { "type": "mystery", "payload": {} } });
    let (status, err) = call(&routes, "POST", "/documents/d1/events", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["errorCode"], "UNKNOWN_EVENT_TYPE");

    let (_, view) = call(&routes, "GET", "/documents/d1/state", None).await;
    assert_eq!(view["eventCount"], 0);
}

#[tokio::test]
async fn test_requests_without_session() {
    let routes = api(app_state(store()));

    let (status, err) = call(&routes, "GET", "/documents/ghost/state", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["errorCode"], "SESSION_NOT_OPEN");

    let (status, err) = call(&routes, "POST", "/documents/ghost/versions/snapshot", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["errorCode"], "SESSION_NOT_OPEN");
}

#[tokio::test]
async fn test_snapshot_dedup_and_listing() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;
    call(&routes, "POST", "/documents/d1/events", Some(content_change("hello world"))).await;

    let (status, first) = call(
        &routes,
        "POST",
        "/documents/d1/versions/snapshot",
        Some(json!({ "description": "draft" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["versionNumber"], 1);
    assert_eq!(first["wordCount"], 2);
    assert_eq!(first["isSnapshot"], true);

    let (status, again) = call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], first["id"]);

    let (status, forced) = call(
        &routes,
        "POST",
        "/documents/d1/versions/snapshot",
        Some(json!({ "forceSnapshot": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(forced["versionNumber"], 2);

    let (status, page) = call(&routes, "GET", "/documents/d1/versions?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["versions"][0]["versionNumber"], 2);
    assert!(page["versions"][0].get("content").is_none());

    let (_, page) =
        call(&routes, "GET", "/documents/d1/versions?includeContent=true", None).await;
    assert_eq!(page["versions"][1]["content"], "hello world");

    let path = format!("/documents/d1/versions/{}", first["id"].as_str().unwrap());
    let (status, fetched) = call(&routes, "GET", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["description"], "draft");

    let (_, view) = call(&routes, "GET", "/documents/d1/state", None).await;
    assert_eq!(view["state"]["lastSaved"]["versionNumber"], 2);
}

#[tokio::test]
async fn test_coalesced_edits_are_flushed_before_snapshot() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;

    for content in ["h", "he", "hel"] {
        let mut body = content_change(content);
        body["coalesce"] = json!(true);
        let (status, _) = call(&routes, "POST", "/documents/d1/events", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, version) = call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(version["content"], "hel");
}

#[tokio::test]
async fn test_restore_conflict_then_success() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;

    let mut ids = Vec::new();
    for content in ["one", "two"] {
        call(&routes, "POST", "/documents/d1/events", Some(content_change(content))).await;
        let (_, version) =
            call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
        ids.push(version["id"].as_str().unwrap().to_string());
    }

    let path = format!("/documents/d1/versions/{}/restore", ids[0]);
    let (status, err) = call(
        &routes,
        "POST",
        &path,
        Some(json!({ "expectedCurrentVersionNumber": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["errorCode"], "VERSION_CONFLICT");

    let (status, outcome) = call(
        &routes,
        "POST",
        &path,
        Some(json!({ "expectedCurrentVersionNumber": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["restoredVersion"]["versionNumber"], 1);
    assert_eq!(outcome["newVersion"]["versionNumber"], 3);
    assert_eq!(outcome["newVersion"]["content"], "one");
    assert_eq!(outcome["newVersion"]["description"], "Restored to version 1");

    let (_, view) = call(&routes, "GET", "/documents/d1/state", None).await;
    assert_eq!(view["state"]["content"], "one");
    assert_eq!(view["state"]["lastSaved"]["versionNumber"], 3);
}

#[tokio::test]
async fn test_diff_json_and_html() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;

    let mut ids = Vec::new();
    for content in ["the quick fox", "the slow fox"] {
        call(&routes, "POST", "/documents/d1/events", Some(content_change(content))).await;
        let (_, version) =
            call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
        ids.push(version["id"].as_str().unwrap().to_string());
    }

    let path = format!(
        "/documents/d1/versions/{}/diff?toId={}&type=words",
        ids[0], ids[1]
    );
    let (status, diff) = call(&routes, "GET", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(diff["sourceVersion"]["versionNumber"], 1);
    assert_eq!(diff["targetVersion"]["versionNumber"], 2);
    assert_eq!(diff["granularity"], "words");
    assert!(diff["operations"].as_array().unwrap().len() >= 3);

    // Without toId the target is the latest version.
    let path = format!("/documents/d1/versions/{}/diff?format=html", ids[0]);
    let response = warp::test::request().method("GET").path(&path).reply(&routes).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(html.starts_with("<pre class=\"folio-diff\">"));
    assert!(html.contains("<ins class=\"diff-insert\">"));

    let path = format!("/documents/d1/versions/{}/diff?type=sentences", ids[0]);
    let (status, err) = call(&routes, "GET", &path, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_delete_and_cleanup() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;

    let mut ids = Vec::new();
    for content in ["v1", "v2", "v3", "v4"] {
        call(&routes, "POST", "/documents/d1/events", Some(content_change(content))).await;
        let (_, version) =
            call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
        ids.push(version["id"].as_str().unwrap().to_string());
    }

    let path = format!("/documents/d1/versions/{}", ids[0]);
    let (status, deleted) = call(&routes, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedVersionId"], ids[0]);
    let (status, err) = call(&routes, "GET", &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["errorCode"], "NOT_FOUND");

    let (status, report) = call(
        &routes,
        "POST",
        "/documents/d1/versions/cleanup",
        Some(json!({ "retentionPolicy": { "keepRecentVersions": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["deletedCount"], 2);
    assert_eq!(report["remainingCount"], 1);
}

#[tokio::test]
async fn test_store_outage_is_service_unavailable() {
    let store = store();
    let routes = api(app_state(store.clone()));
    call(&routes, "POST", "/documents/d1/session", None).await;
    call(&routes, "POST", "/documents/d1/events", Some(content_change("x"))).await;

    store.set_available(false);
    let (status, err) = call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["errorCode"], "STORE_UNAVAILABLE");

    store.set_available(true);
    let (status, _) = call(&routes, "POST", "/documents/d1/versions/snapshot", None).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let routes = api(app_state(store()));

    let (status, err) = call(&routes, "GET", "/documents/d1/versions/not-a-ulid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["errorCode"], "BAD_REQUEST");

    call(&routes, "POST", "/documents/d1/session", None).await;
    let response = warp::test::request()
        .method("POST")
        .path("/documents/d1/events")
        .body("{not json")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_close_returns_events_for_resume() {
    let routes = api(app_state(store()));
    call(&routes, "POST", "/documents/d1/session", None).await;
    call(&routes, "POST", "/documents/d1/events", Some(content_change("kept"))).await;

    let (status, closed) = call(&routes, "DELETE", "/documents/d1/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["events"].as_array().unwrap().len(), 1);

    let (status, _) = call(&routes, "GET", "/documents/d1/state", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, view) = call(
        &routes,
        "POST",
        "/documents/d1/session",
        Some(json!({ "events": closed["events"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["state"]["content"], "kept");
}

#[tokio::test]
async fn test_health() {
    let routes = api(app_state(store()));
    let (status, body) = call(&routes, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_version_reads_need_no_session() {
    let store = store();
    let seeded = seed_versions(&manager(store.clone()), &doc("d2"), &["a", "b", "c"]).await;
    let routes = api(app_state(store));

    let (status, page) =
        call(&routes, "GET", "/documents/d2/versions?page=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["versions"][0]["versionNumber"], 1);

    let path = format!("/documents/d2/versions/{}/diff", seeded[0].id);
    let (status, diff) = call(&routes, "GET", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(diff["targetVersion"]["versionNumber"], 3);
}

#[tokio::test]
async fn test_stale_restore_of_deleted_version_conflicts() {
    let store = store();
    let seeded = seed_versions(&manager(store.clone()), &doc("d3"), &["a", "b", "c"]).await;
    let routes = api(app_state(store));

    let path = format!("/documents/d3/versions/{}", seeded[0].id);
    let (status, _) = call(&routes, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::OK);

    let restore = format!("{path}/restore");
    let (status, err) = call(
        &routes,
        "POST",
        &restore,
        Some(json!({ "expectedCurrentVersionNumber": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["errorCode"], "VERSION_CONFLICT");

    let (status, err) = call(
        &routes,
        "POST",
        &restore,
        Some(json!({ "expectedCurrentVersionNumber": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["errorCode"], "NOT_FOUND");
}
