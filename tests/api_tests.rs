//! Router-level tests for the HTTP API.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use tasktree::db::Database;
use tasktree::web::{AppServer, build_router};
use tower::ServiceExt;

fn setup() -> (Arc<Database>, Router) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let router = build_router(AppServer::new(Arc::clone(&db)));
    (db, router)
}

async fn send(router: &Router, method: &str, uri: &str, form: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match form {
        Some(form) => {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn tree_ids(tree: &Value) -> Vec<i64> {
    tree.as_array()
        .expect("tree array")
        .iter()
        .map(|node| node["id"].as_i64().expect("id"))
        .collect()
}

#[tokio::test]
async fn health_reports_version() {
    let (_, router) = setup();
    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn create_and_move_roots() {
    let (_, router) = setup();

    let (status, first) = send(&router, "POST", "/api/tasks", Some("at_front=false")).await;
    assert_eq!(status, StatusCode::OK);
    let a = first["task_id"].as_i64().unwrap();
    let (_, second) = send(&router, "POST", "/api/tasks", Some("at_front=false")).await;
    let b = second["task_id"].as_i64().unwrap();
    assert_eq!(tree_ids(&second["tree"]), vec![a, b]);

    let (status, moved) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/move", b),
        Some("displacement=-1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["changed"], true);
    assert_eq!(tree_ids(&moved["tree"]), vec![b, a]);

    let (_, again) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/move", b),
        Some("displacement=-1"),
    )
    .await;
    assert_eq!(again["changed"], false);
}

#[tokio::test]
async fn indent_and_outdent_through_api() {
    let (db, router) = setup();
    let a = db.create_root(false).unwrap();
    let b = db.create_root(false).unwrap();

    let (_, indented) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/indent", b),
        Some("displacement=1"),
    )
    .await;
    assert_eq!(tree_ids(&indented["tree"]), vec![a]);
    assert_eq!(indented["tree"][0]["children"][0]["id"], b);

    let (_, outdented) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/indent", b),
        Some("displacement=-1"),
    )
    .await;
    assert_eq!(tree_ids(&outdented["tree"]), vec![a, b]);
}

#[tokio::test]
async fn bad_displacement_is_client_error() {
    let (db, router) = setup();
    let a = db.create_root(false).unwrap();

    let (status, body) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/move", a),
        Some("displacement=up"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FIELD_VALUE");
}

#[tokio::test]
async fn missing_task_is_404() {
    let (_, router) = setup();

    let (status, body) = send(&router, "POST", "/api/tasks/99/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");

    let (status, _) = send(&router, "DELETE", "/api/tasks/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn field_edits_and_tags() {
    let (db, router) = setup();
    let a = db.create_root(false).unwrap();

    let (_, name) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/name", a),
        Some("value=Write+report"),
    )
    .await;
    assert_eq!(name["value"], "Write report");

    let (_, tags) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/tags", a),
        Some("value=a%2C+b%2C+b%2C+"),
    )
    .await;
    assert_eq!(tags["value"], serde_json::json!(["a", "b"]));

    let (_, all) = send(&router, "GET", "/api/tags", None).await;
    assert_eq!(all, serde_json::json!(["a", "b"]));

    let (_, toggled) = send(&router, "POST", &format!("/api/tasks/{}/toggle", a), None).await;
    assert_eq!(toggled["value"], true);
}

#[tokio::test]
async fn filter_toggle_hides_completed() {
    let (db, router) = setup();
    let a = db.create_root(false).unwrap();
    let b = db.create_root(false).unwrap();
    db.toggle_completed(a).unwrap();

    let (status, body) = send(&router, "POST", "/api/filter/completed", Some("")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["show_completed"], false);
    assert_eq!(tree_ids(&body["tree"]), vec![b]);

    let (status, _) = send(&router, "POST", "/api/filter/priority", Some("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn due_part_edit_reports_rejection() {
    let (db, router) = setup();
    let a = db.create_root(false).unwrap();

    let (status, body) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/due/day", a),
        Some("value=xx"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], false);

    let (status, _) = send(
        &router,
        "POST",
        &format!("/api/tasks/{}/due/week", a),
        Some("value=1"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn every_request_checks_in() {
    let (db, router) = setup();
    assert!(db.app_state().unwrap().last_checked_in.is_none());

    send(&router, "GET", "/api/tags", None).await;

    assert!(db.app_state().unwrap().last_checked_in.is_some());
}
