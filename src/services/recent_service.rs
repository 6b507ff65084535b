use serde::Serialize;

use crate::errors::ServiceError;
use crate::services::envelope::{self, ApiRequest, ApiResponse};
use crate::state::entry::{LogEntry, PARTITION_TAG};
use crate::state::log_table::{LogTable, ScanOrder};

/// The only method the recent-logs endpoint accepts.
pub const READ_METHOD: &str = "GET";

/// Fixed page size. There is no pagination token.
pub const RECENT_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
struct RecentLogs {
    count: usize,
    logs: Vec<LogEntry>,
}

/// Return the newest entries, newest first.
pub fn handle(table: &dyn LogTable, request: &ApiRequest) -> ApiResponse {
    envelope::guard(request, || recent(table, request))
}

fn recent(table: &dyn LogTable, request: &ApiRequest) -> Result<ApiResponse, ServiceError> {
    request.require_method(READ_METHOD)?;

    let logs: Vec<LogEntry> = table
        .query_partition(PARTITION_TAG, ScanOrder::Descending, RECENT_LIMIT)?
        .into_iter()
        .map(|stored| stored.into_public())
        .collect();

    ApiResponse::json(
        200,
        &RecentLogs {
            count: logs.len(),
            logs,
        },
    )
}
