use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::time::{sleep, Duration};

use crate::errors::StoreError;
use crate::state::entry::StoredEntry;
use crate::state::log_table::{LogTable, MemoryLogTable};

/// Load the table snapshot from disk into memory.
///
/// A missing file means a fresh table. A file that cannot be parsed is
/// ignored with a warning, and so is every record that does not have the
/// stored entry shape. Returns the number of entries loaded.
pub fn load_snapshot(path: &Path, table: &MemoryLogTable) -> Result<usize, StoreError> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(_) => {
            tracing::info!("No snapshot found at startup (path = {})", path.display());
            return Ok(0);
        }
    };

    let records = match serde_json::from_str::<Value>(&data) {
        Ok(Value::Array(records)) => records,
        Ok(_) => {
            tracing::warn!("Snapshot is not a JSON array, ignoring");
            return Ok(0);
        }
        Err(e) => {
            tracing::warn!("Failed to parse snapshot JSON: {e}");
            return Ok(0);
        }
    };

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value::<StoredEntry>(record) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Skipping invalid snapshot record: {e}"),
        }
    }

    table.restore(entries)?;
    let loaded = table.len()?;
    tracing::info!("Loaded snapshot of {}: {} entries", table.name(), loaded);
    Ok(loaded)
}

/// Write the current table content to `path`.
///
/// The snapshot goes to a sibling temp file first and is renamed into
/// place, so a crash mid-write leaves the previous snapshot intact.
pub fn save_snapshot(path: &Path, table: &MemoryLogTable) -> Result<usize, StoreError> {
    let entries = table.snapshot()?;
    let json = serde_json::to_string_pretty(&entries)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    Ok(entries.len())
}

/// Background task that periodically saves the snapshot.
pub async fn autosave_loop(path: PathBuf, table: Arc<MemoryLogTable>, every_sec: u64) {
    loop {
        sleep(Duration::from_secs(every_sec.max(1))).await;
        match save_snapshot(&path, &table) {
            Ok(count) => tracing::debug!("Snapshot saved ({count} entries)"),
            Err(e) => tracing::warn!("Failed to save snapshot: {e}"),
        }
    }
}
