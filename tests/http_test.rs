use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use log_service::app::build_app;
use log_service::config::AppConfig;
use log_service::state::log_table::{LogTable, MemoryLogTable, SharedTable};

fn config() -> AppConfig {
    AppConfig::from_json(
        r#"{ "port": 0, "table_name": "LogTable", "server_version": "9.9.9" }"#,
        None,
    )
    .unwrap()
}

fn app() -> (Router, Arc<MemoryLogTable>) {
    let table = Arc::new(MemoryLogTable::new("LogTable"));
    let shared: SharedTable = table.clone();
    (build_app(shared, config()), table)
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Option<String>, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, content_type, json)
}

async fn post_log(app: &Router, body: Value) -> Value {
    let (status, _, json) = send(app, "POST", "/logs", Body::from(body.to_string())).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json
}

async fn recent(app: &Router) -> Value {
    let (status, _, json) = send(app, "GET", "/logs/recent", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    json
}

#[tokio::test]
async fn write_then_read_generated_entry() {
    let (app, _) = app();
    let ack = post_log(&app, json!({ "severity": "error", "message": "disk full" })).await;
    assert_eq!(ack["message"], "Log entry created");

    let body = recent(&app).await;
    assert_eq!(body["count"], 1);

    let log = &body["logs"][0];
    assert_eq!(log["severity"], "error");
    assert_eq!(log["message"], "disk full");
    assert_eq!(log["id"], ack["id"]);
    assert_eq!(log["dateTime"], ack["dateTime"]);
    assert!(!log["id"].as_str().unwrap().is_empty());
    assert!(!log["dateTime"].as_str().unwrap().is_empty());
    assert!(log.get("partitionTag").is_none());
}

#[tokio::test]
async fn explicit_id_and_timestamp_round_trip() {
    let (app, _) = app();
    post_log(
        &app,
        json!({ "id": "x1", "dateTime": "2024-01-01T00:00:00Z", "severity": "info", "message": "boot" }),
    )
    .await;

    let body = recent(&app).await;
    assert_eq!(
        body["logs"],
        json!([{ "id": "x1", "dateTime": "2024-01-01T00:00:00Z", "severity": "info", "message": "boot" }])
    );
}

#[tokio::test]
async fn recent_is_newest_first() {
    let (app, _) = app();
    for (id, dt) in [
        ("t2", "2024-05-01T10:00:02Z"),
        ("t1", "2024-05-01T10:00:01Z"),
        ("t3", "2024-05-01T10:00:03Z"),
    ] {
        post_log(&app, json!({ "id": id, "dateTime": dt, "severity": "info", "message": id })).await;
    }

    let body = recent(&app).await;
    let ids: Vec<&str> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["t3", "t2", "t1"]);
}

#[tokio::test]
async fn recent_returns_at_most_one_hundred() {
    let (app, table) = app();
    for i in 0..150 {
        post_log(
            &app,
            json!({
                "id": format!("e{i:03}"),
                "dateTime": format!("2024-01-01T01:{:02}:{:02}Z", i / 60, i % 60),
                "severity": "warning",
                "message": "tick",
            }),
        )
        .await;
    }
    assert_eq!(table.len().unwrap(), 150);

    let body = recent(&app).await;
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(body["count"], 100);
    assert_eq!(logs.len(), 100);
    assert_eq!(logs[0]["id"], "e149");
    assert_eq!(logs[99]["id"], "e050");
}

#[tokio::test]
async fn wrong_methods_are_rejected() {
    let (app, table) = app();

    let (status, content_type, body) = send(&app, "POST", "/logs/recent", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({ "error": "Method POST not allowed. Use GET." }));

    let (status, _, body) = send(&app, "GET", "/logs", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method GET not allowed. Use POST." }));

    assert_eq!(table.len().unwrap(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (app, table) = app();
    let (status, _, body) = send(&app, "POST", "/logs", Body::from("severity=info")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Request body must be valid JSON" }));
    assert_eq!(table.len().unwrap(), 0);
}

#[tokio::test]
async fn validation_errors_are_returned_together() {
    let (app, table) = app();
    let payload = json!({ "message": "", "dateTime": "01/02/2024" }).to_string();
    let (status, _, body) = send(&app, "POST", "/logs", Body::from(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "errors": [
            "Missing required field: 'severity'",
            "Missing required field: 'message'",
            "Invalid dateTime format: '01/02/2024'. Expected ISO 8601.",
        ] })
    );
    assert_eq!(table.len().unwrap(), 0);
}

#[tokio::test]
async fn non_utf8_body_is_an_internal_error() {
    let (app, table) = app();
    let (status, _, body) = send(&app, "POST", "/logs", Body::from(vec![0xc3, 0x28])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
    assert_eq!(table.len().unwrap(), 0);
}

#[tokio::test]
async fn system_routes_report_table() {
    let (app, _) = app();
    post_log(&app, json!({ "severity": "info", "message": "m" })).await;

    let (status, _, body) = send(&app, "GET", "/system/version", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "version": "9.9.9", "table": "LogTable", "entries": 1 }));

    let response = app
        .oneshot(Request::builder().uri("/system/alive").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn large_record_is_accepted() {
    let (app, table) = app();
    let message = "x".repeat(3 * 1024 * 1024);
    let payload = json!({ "id": "big", "severity": "info", "message": &message }).to_string();

    let (status, content_type, body) = send(&app, "POST", "/logs", Body::from(payload)).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["id"], "big");
    assert_eq!(table.get("big").unwrap().unwrap().message.len(), message.len());
}
