use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::state::entry::Severity;

/// Loosely-typed inbound record, as parsed from the request body.
pub type RawRecord = Map<String, Value>;

lazy_static! {
    /// Permissive ISO 8601: date, `T` or space, time, optional fraction,
    /// optional `Z` or signed `HH:MM` / `HHMM` offset.
    static ref DATE_TIME_RE: Regex = Regex::new(
        r"^[0-9]{4}-[0-9]{2}-[0-9]{2}[T ][0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|[+-][0-9]{2}:?[0-9]{2})?$"
    )
    .expect("dateTime pattern is valid");
}

/// Check `record` against the ingest rules.
///
/// Every rule runs; an empty list means the record can be stored.
pub fn validate(record: &RawRecord) -> Vec<String> {
    let mut errors = Vec::new();

    match present(record, "severity") {
        None => errors.push("Missing required field: 'severity'".to_string()),
        Some(value) => {
            let known = value
                .as_str()
                .is_some_and(|s| s.parse::<Severity>().is_ok());
            if !known {
                errors.push(format!(
                    "Invalid severity '{}'. Must be one of: {}",
                    display(value),
                    Severity::NAMES.join(", ")
                ));
            }
        }
    }

    if !is_truthy(record.get("message")) {
        errors.push("Missing required field: 'message'".to_string());
    }

    if let Some(value) = present(record, "dateTime") {
        let text = display(value);
        if !is_date_time(&text) {
            errors.push(format!(
                "Invalid dateTime format: '{text}'. Expected ISO 8601."
            ));
        }
    }

    errors
}

/// True when `value` matches the accepted timestamp pattern.
pub fn is_date_time(value: &str) -> bool {
    DATE_TIME_RE.is_match(value)
}

/// Field value, treating JSON `null` as absent.
pub(crate) fn present<'a>(record: &'a RawRecord, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

/// Strings verbatim, everything else as JSON text.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Falsy: absent, null, false, zero, blank string, empty array or object.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
