// Integration tests for GET /tasks

mod common;

use axum::{
    body::Body,
    http::{header, StatusCode},
};
use common::{authed, body_string, TestGateway};
use remap_gateway::config::{GatewayConfig, TaskSource};
use serde_json::{json, Value};

async fn seeded() -> TestGateway {
    let gw = TestGateway::new().await;
    let tasks = gw.tasks();
    for task in [
        json!({"name": "walk", "ios": true, "android": true}),
        json!({"name": "survey", "ios": true, "android": false}),
        json!({"name": "sensor", "android": true}),
    ] {
        tasks.insert_task(task).await.unwrap();
    }
    gw
}

async fn get_tasks(gw: &TestGateway, uri: &str) -> (StatusCode, Value) {
    let response = gw.send(authed("GET", uri).body(Body::empty()).unwrap()).await;
    let status = response.status();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    (status, body)
}

fn names(tasks: &Value) -> Vec<&str> {
    tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect()
}

/// No query params → the whole catalog, without internal ids.
#[tokio::test]
async fn test_unfiltered_catalog() {
    let gw = seeded().await;
    let (status, tasks) = get_tasks(&gw, "/tasks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&tasks), vec!["walk", "survey", "sensor"]);
    assert!(tasks.as_array().unwrap().iter().all(|t| t.get("_id").is_none()));
}

/// ?ios=1 → only descriptors with ios == true.
#[tokio::test]
async fn test_ios_filter() {
    let gw = seeded().await;
    let (status, tasks) = get_tasks(&gw, "/tasks?ios=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&tasks), vec!["walk", "survey"]);
}

/// The parameter's value is irrelevant; presence alone filters.
#[tokio::test]
async fn test_filter_value_ignored() {
    let gw = seeded().await;
    let (_, tasks) = get_tasks(&gw, "/tasks?android=false").await;
    assert_eq!(names(&tasks), vec!["walk", "sensor"]);
}

/// Both platforms → intersection.
#[tokio::test]
async fn test_both_platforms() {
    let gw = seeded().await;
    let (_, tasks) = get_tasks(&gw, "/tasks?ios=1&android=1").await;
    assert_eq!(names(&tasks), vec!["walk"]);
}

/// Unknown params are ignored and behave as unfiltered.
#[tokio::test]
async fn test_unknown_param_ignored() {
    let gw = seeded().await;
    let (status, tasks) = get_tasks(&gw, "/tasks?foo=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&tasks), vec!["walk", "survey", "sensor"]);
}

/// Query keys are form-decoded before they are matched.
#[tokio::test]
async fn test_encoded_query_keys() {
    let gw = seeded().await;

    let (_, tasks) = get_tasks(&gw, "/tasks?%69os=1").await;
    assert_eq!(names(&tasks), vec!["walk", "survey"]);

    let (_, tasks) = get_tasks(&gw, "/tasks?ios%3D1").await;
    assert_eq!(names(&tasks), vec!["walk", "survey", "sensor"]);
}

/// Empty catalog → 200 with [].
#[tokio::test]
async fn test_empty_catalog() {
    let gw = TestGateway::new().await;
    let (status, tasks) = get_tasks(&gw, "/tasks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([]));
}

/// File-backed catalog with the same filter semantics.
#[tokio::test]
async fn test_file_catalog() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(
        &path,
        r#"[{"_id": 1, "name": "walk", "ios": true}, {"_id": 2, "name": "sensor", "android": true}]"#,
    )
    .unwrap();

    let mut config = GatewayConfig::default();
    config.tasks.source = TaskSource::File;
    config.tasks.file = path.to_string_lossy().to_string();
    let gw = TestGateway::with_config(config).await;

    let (status, tasks) = get_tasks(&gw, "/tasks?ios").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([{"name": "walk", "ios": true}]));
}

/// Lookup failure → 404 with body [] and nothing else.
#[tokio::test]
async fn test_lookup_failure_returns_404_empty_list() {
    let dir = tempfile::TempDir::new().unwrap();

    let mut config = GatewayConfig::default();
    config.tasks.source = TaskSource::File;
    config.tasks.file = dir.path().join("missing.json").to_string_lossy().to_string();
    let gw = TestGateway::with_config(config).await;

    let (status, tasks) = get_tasks(&gw, "/tasks").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(tasks, json!([]));
}
