use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::envelope::{self, ApiRequest, ApiResponse};
use crate::services::validator::{self, RawRecord};
use crate::state::entry::{LogEntry, Severity};
use crate::state::log_table::LogTable;

/// The only method the ingest endpoint accepts.
pub const WRITE_METHOD: &str = "POST";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestAck<'a> {
    message: &'static str,
    id: &'a str,
    date_time: &'a str,
}

/// Ingest one log entry.
///
/// Never fails: every outcome, including store failures, is turned into a
/// response by the envelope boundary.
pub fn handle(table: &dyn LogTable, request: &ApiRequest) -> ApiResponse {
    envelope::guard(request, || ingest(table, request, Utc::now()))
}

fn ingest(
    table: &dyn LogTable,
    request: &ApiRequest,
    now: DateTime<Utc>,
) -> Result<ApiResponse, ServiceError> {
    request.require_method(WRITE_METHOD)?;

    let record = parse_record(&request.decoded_body()?)?;

    let errors = validator::validate(&record);
    if !errors.is_empty() {
        return Err(ServiceError::Validation(errors));
    }

    let entry = build_entry(&record, now)?;
    table.put(entry.clone().into_stored())?;

    ApiResponse::json(
        200,
        &IngestAck {
            message: "Log entry created",
            id: &entry.id,
            date_time: &entry.date_time,
        },
    )
}

/// Empty body means an empty record. Anything that is not a JSON object is
/// rejected as malformed.
fn parse_record(body: &str) -> Result<RawRecord, ServiceError> {
    if body.is_empty() {
        return Ok(RawRecord::new());
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(record)) => Ok(record),
        _ => Err(ServiceError::MalformedBody),
    }
}

/// Build the typed entry from a record that passed validation, filling in
/// the generated id and timestamp.
fn build_entry(record: &RawRecord, now: DateTime<Utc>) -> Result<LogEntry, ServiceError> {
    // Only reachable with an invalid severity if validation was skipped.
    let severity = validator::present(record, "severity")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Severity>().ok())
        .ok_or_else(|| {
            ServiceError::Validation(vec!["Missing required field: 'severity'".to_string()])
        })?;

    let id = match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => Uuid::new_v4().to_string(),
    };

    let date_time = match validator::present(record, "dateTime") {
        Some(value) => validator::display(value),
        None => now.to_rfc3339_opts(SecondsFormat::Micros, false),
    };

    let message = record
        .get("message")
        .map(validator::display)
        .unwrap_or_default();

    Ok(LogEntry {
        id,
        date_time,
        severity,
        message,
    })
}
