use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::errors::StoreError;
use crate::persistence::save_snapshot;
use crate::routes::{log_routes, system_routes};
use crate::state::log_table::{MemoryLogTable, SharedTable};

/// Build the complete Axum application:
/// - /logs, /logs/recent  (ingest + recent query)
/// - /system              (alive + version)
///
/// Every handler gets the table handle it works on; nothing is global.
pub fn build_app(table: SharedTable, cfg: AppConfig) -> Router {
    Router::new()
        // /logs, /logs/recent
        .merge(log_routes::routes(table.clone()))

        // /system/*
        .nest("/system", system_routes::routes(cfg, table))

        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Serve `app` until `signal` resolves, then write the final snapshot.
///
/// The snapshot is taken only after axum has drained in-flight requests,
/// so every write acknowledged with a 200 is on disk. It is also taken when
/// the server stops with an error. Returns the number of entries saved.
pub async fn serve_and_persist<F>(
    listener: TcpListener,
    app: Router,
    table: Arc<MemoryLogTable>,
    snapshot_path: PathBuf,
    signal: F,
) -> Result<usize, StoreError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
    {
        tracing::error!("Server error: {e}");
    }

    save_snapshot(&snapshot_path, &table)
}
