use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration failures. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config.json not found in:\n  {}\n  {}\nCopy config.json to one of these paths.", .primary.display(), .fallback.display())]
    NotFound { primary: PathBuf, fallback: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config.json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No log table configured: set `table_name` in config.json or the TABLE_NAME environment variable")]
    MissingTableName,

    #[error("Cannot locate the executable directory: {0}")]
    ExecutablePath(std::io::Error),
}

/// Failures raised by a log table implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Log table lock poisoned")]
    Poisoned,

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Log table unavailable: {0}")]
    Unavailable(String),
}

/// Everything a request handler can fail with.
///
/// The first three variants are client errors and are answered inline with a
/// 4xx response. The rest are internal and end up as an opaque 500.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Method {method} not allowed. Use {expected}.")]
    MethodNotAllowed {
        method: String,
        expected: &'static str,
    },

    #[error("Request body must be valid JSON")]
    MalformedBody,

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Request body is not valid base64: {0}")]
    BodyEncoding(#[from] base64::DecodeError),

    #[error("Request body is not valid UTF-8: {0}")]
    BodyCharset(#[from] std::string::FromUtf8Error),

    #[error("Failed to encode response: {0}")]
    ResponseEncoding(serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Handler panicked: {0}")]
    Panic(String),
}

impl ServiceError {
    /// True for errors caused by the caller, answered with a 4xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::MethodNotAllowed { .. }
                | ServiceError::MalformedBody
                | ServiceError::Validation(_)
        )
    }
}
