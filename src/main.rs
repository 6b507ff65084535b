/*****************************************************************************************
 *
 *  log-service – Log Entry Ingestion & Retrieval Microservice
 *  -----------------------------------------------------------
 *
 *  POST /logs          store one entry
 *  GET  /logs/recent   newest 100 entries
 *
 *****************************************************************************************/

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use log_service::app;
use log_service::config::AppConfig;
use log_service::persistence::{autosave_loop, load_snapshot};
use log_service::state::log_table::{MemoryLogTable, SharedTable};

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Load configuration (fatal if absent or incomplete)
    // ────────────────────────────────────────────────────────
    //
    let cfg = match AppConfig::locate().and_then(|path| AppConfig::load_from_file(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("log-service: {e}");
            std::process::exit(1);
        }
    };

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info"  => LevelFilter::INFO,
        "warn"  => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("log-service: failed to set tracing subscriber: {e}");
    }

    tracing::info!("Starting log-service…");
    tracing::info!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Open the log table and load its snapshot
    // ────────────────────────────────────────────────────────
    //
    let table = Arc::new(MemoryLogTable::new(cfg.table_name()));
    let snapshot_path = cfg.snapshot_path();

    if let Err(e) = load_snapshot(&snapshot_path, &table) {
        tracing::error!("Failed to load snapshot {}: {e}", snapshot_path.display());
        std::process::exit(1);
    }

    //
    // ────────────────────────────────────────────────────────
    //  Start autosave loop
    // ────────────────────────────────────────────────────────
    //
    {
        let table_clone = table.clone();
        let path = snapshot_path.clone();
        let interval = cfg.snapshot_interval;

        task::spawn(async move {
            autosave_loop(path, table_clone, interval).await;
        });
    }

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app (log + system routes)
    // ────────────────────────────────────────────────────────
    //
    let shared: SharedTable = table.clone();
    let app = app::build_app(shared, cfg.clone());

    //
    // ────────────────────────────────────────────────────────
    //  Bind server and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on http://{}", addr);

    let saved = app::serve_and_persist(
        listener,
        app,
        table,
        snapshot_path,
        shutdown_signal(),
    )
    .await;

    match saved {
        Ok(count) => tracing::info!("Snapshot saved ({count} entries). Goodbye."),
        Err(e) => tracing::error!("Failed to save snapshot: {e}"),
    }
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown signal
// ─────────────────────────────────────────────────────────────
//
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }

    tracing::warn!("CTRL+C received — draining requests before the final snapshot…");
}
