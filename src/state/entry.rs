use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Partition value shared by every stored entry.
///
/// All entries land in one logical partition of the `dateTime` index, which
/// is what lets a single range scan see the whole table.
pub const PARTITION_TAG: &str = "LOG";

/// Allowed severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Accepted wire values, sorted alphabetically.
    pub const NAMES: [&'static str; 3] = ["error", "info", "warning"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// A log entry as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub date_time: String,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    /// Attach the partition tag for storage.
    pub fn into_stored(self) -> StoredEntry {
        StoredEntry {
            id: self.id,
            date_time: self.date_time,
            severity: self.severity,
            message: self.message,
            partition_tag: PARTITION_TAG.to_string(),
        }
    }
}

/// A log entry as the table holds it.
///
/// `id` is the primary key, `(partition_tag, date_time)` the secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    pub id: String,
    pub date_time: String,
    pub severity: Severity,
    pub message: String,
    pub partition_tag: String,
}

impl StoredEntry {
    /// Project to the public shape, dropping the partition tag.
    pub fn into_public(self) -> LogEntry {
        LogEntry {
            id: self.id,
            date_time: self.date_time,
            severity: self.severity,
            message: self.message,
        }
    }
}
