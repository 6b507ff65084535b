use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::sleep;

use log_service::app::{build_app, serve_and_persist};
use log_service::config::AppConfig;
use log_service::persistence::load_snapshot;
use log_service::state::entry::{LogEntry, Severity};
use log_service::state::log_table::{LogTable, MemoryLogTable, SharedTable};

fn config() -> AppConfig {
    AppConfig::from_json(
        r#"{ "port": 0, "table_name": "LogTable", "server_version": "9.9.9" }"#,
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn write_in_flight_at_shutdown_reaches_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("LogTable.json");

    let table = Arc::new(MemoryLogTable::new("LogTable"));
    let shared: SharedTable = table.clone();
    let app = build_app(shared, config());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_and_persist(
        listener,
        app,
        table.clone(),
        path.clone(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let body = json!({ "id": "late", "severity": "warning", "message": "draining" }).to_string();
    let head = format!(
        "POST /logs HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let (first, rest) = body.split_at(10);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(first.as_bytes()).await.unwrap();
    sleep(Duration::from_millis(100)).await;

    // Shutdown begins while the request body is still arriving.
    stop_tx.send(()).unwrap();
    sleep(Duration::from_millis(50)).await;
    stream.write_all(rest.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    let saved = server.await.unwrap().unwrap();
    assert_eq!(saved, 1);

    let restored = MemoryLogTable::new("LogTable");
    assert_eq!(load_snapshot(&path, &restored).unwrap(), 1);
    assert_eq!(restored.get("late").unwrap().unwrap().message, "draining");
}

#[tokio::test]
async fn shutdown_without_traffic_still_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("LogTable.json");

    let table = Arc::new(MemoryLogTable::new("LogTable"));
    let shared: SharedTable = table.clone();
    table
        .put(
            LogEntry {
                id: "kept".into(),
                date_time: "2024-01-01T00:00:00Z".into(),
                severity: Severity::Info,
                message: "before shutdown".into(),
            }
            .into_stored(),
        )
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let saved = serve_and_persist(
        listener,
        build_app(shared, config()),
        table,
        path.clone(),
        async {},
    )
    .await
    .unwrap();
    assert_eq!(saved, 1);

    let restored = MemoryLogTable::new("LogTable");
    assert_eq!(load_snapshot(&path, &restored).unwrap(), 1);
    assert!(restored.get("kept").unwrap().is_some());
}
