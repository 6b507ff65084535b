use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::ServiceError;

/// Transport-neutral description of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub method: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.is_base64_encoded = false;
        self
    }

    pub fn with_base64_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.is_base64_encoded = true;
        self
    }

    /// Build a request from raw HTTP parts. Bodies that are not UTF-8 are
    /// forwarded base64-encoded.
    pub fn from_http(method: &str, body: Vec<u8>) -> Self {
        let request = Self::new(method);
        if body.is_empty() {
            return request;
        }

        match String::from_utf8(body) {
            Ok(text) => request.with_body(text),
            Err(e) => request.with_base64_body(BASE64.encode(e.into_bytes())),
        }
    }

    pub fn require_method(&self, expected: &'static str) -> Result<(), ServiceError> {
        if self.method == expected {
            Ok(())
        } else {
            Err(ServiceError::MethodNotAllowed {
                method: self.method.clone(),
                expected,
            })
        }
    }

    /// The body as text, undoing the base64 transport encoding if flagged.
    pub fn decoded_body(&self) -> Result<String, ServiceError> {
        let raw = self.body.as_deref().unwrap_or_default();
        if !self.is_base64_encoded {
            return Ok(raw.to_string());
        }

        let bytes = BASE64.decode(raw)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Handler result: status code, headers and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: Serialize>(status_code: u16, payload: &T) -> Result<Self, ServiceError> {
        let body = serde_json::to_string(payload).map_err(ServiceError::ResponseEncoding)?;
        Ok(Self::raw(status_code, body))
    }

    fn raw(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    fn internal_error() -> Self {
        Self::raw(500, json!({ "error": "Internal server error" }).to_string())
    }

    /// Parse the body back into JSON.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

/// Failure boundary wrapped around a whole handler.
///
/// Client errors become 4xx responses and are never logged. Anything else,
/// including a panic, becomes an opaque 500 and the full request is logged.
pub fn guard<F>(request: &ApiRequest, handler: F) -> ApiResponse
where
    F: FnOnce() -> Result<ApiResponse, ServiceError>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ServiceError::Panic(reason))
    });

    match outcome {
        Ok(response) => response,
        Err(err) => match client_response(&err) {
            Some(response) => response,
            None => {
                let dump = serde_json::to_string(request)
                    .unwrap_or_else(|_| format!("{request:?}"));
                tracing::error!(error = %err, request = %dump, "Error processing request");
                ApiResponse::internal_error()
            }
        },
    }
}

fn client_response(err: &ServiceError) -> Option<ApiResponse> {
    let (status, body) = match err {
        ServiceError::MethodNotAllowed { .. } => (405, json!({ "error": err.to_string() })),
        ServiceError::MalformedBody => (400, json!({ "error": err.to_string() })),
        ServiceError::Validation(errors) => (400, json!({ "errors": errors })),
        _ => return None,
    };
    Some(ApiResponse::raw(status, body.to_string()))
}
