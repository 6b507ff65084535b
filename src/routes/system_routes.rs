use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::state::log_table::SharedTable;

#[derive(Clone)]
struct SystemState {
    config: AppConfig,
    table: SharedTable,
}

pub fn routes(config: AppConfig, table: SharedTable) -> Router {
    Router::new()
        .route("/alive", get(is_alive))
        .route("/version", get(version))
        .with_state(SystemState { config, table })
}

/// GET /system/alive
async fn is_alive() -> &'static str {
    "OK"
}

/// GET /system/version
async fn version(State(state): State<SystemState>) -> Result<Json<Value>, StatusCode> {
    let entries = state.table.len().map_err(|e| {
        tracing::error!("Failed to count log entries: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({
        "version": state.config.server_version,
        "table": state.table.name(),
        "entries": entries,
    })))
}
