//! HTTP transport for the academy backend.
//!
//! ARCHITECTURE
//! ============
//! The backend exposes a single endpoint and selects the operation with an
//! `action` parameter. Reads are `GET` with everything in the query string;
//! writes are `POST` with a JSON body. The shared `apiKey` credential is
//! injected here so no caller ever handles it.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is mapped into a [`TransportError`]. Response interpretation
//! lives in the pure [`interpret_response`] so the status/body rules can be
//! tested without a socket.

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::envelope::DEFAULT_ERROR_MESSAGE;

/// Flat parameter bag for one action.
pub type Params = Map<String, Value>;

/// Whether an action reads (query string) or writes (JSON body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("network request failed: {0}")]
    Network(String),

    /// Non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The body was not JSON, or not the JSON the action expects.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Well-formed response carrying a backend error.
    #[error("{0}")]
    Backend(String),

    /// Parameters could not be turned into a flat bag.
    #[error("invalid request parameters: {0}")]
    Encode(String),

    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

/// One network round-trip for an action.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `action` with `params` and return the payload JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for network, status, decode, or backend failures.
    async fn send(&self, kind: RequestKind, action: &str, params: Params) -> Result<Value, TransportError>;
}

// =============================================================================
// HTTP
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| TransportError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), api_key: config.api_key.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, kind: RequestKind, action: &str, params: Params) -> Result<Value, TransportError> {
        tracing::debug!(action, ?kind, "api request");

        let request = match kind {
            RequestKind::Read => self.http.get(&self.base_url).query(&query_pairs(action, &self.api_key, &params)),
            RequestKind::Write => self
                .http
                .post(&self.base_url)
                .query(&[("action", action)])
                .json(&write_body(action, &self.api_key, params)),
        };

        let result = async {
            let response = request.send().await.map_err(|e| TransportError::Network(e.to_string()))?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| TransportError::Network(e.to_string()))?;
            interpret_response(status, &text)
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!(action, error = %e, "api request failed");
        }
        result
    }
}

// =============================================================================
// WIRE HELPERS
// =============================================================================

/// Query-string pairs for a read: `action`, `apiKey`, then the parameters.
/// `null` values are dropped.
#[must_use]
pub fn query_pairs(action: &str, api_key: &str, params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len() + 2);
    pairs.push(("action".to_owned(), action.to_owned()));
    pairs.push(("apiKey".to_owned(), api_key.to_owned()));
    for (key, value) in params {
        if key == "action" || key == "apiKey" {
            continue;
        }
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
        };
        pairs.push((key.clone(), text));
    }
    pairs
}

/// JSON body for a write. The credential and action always win over
/// same-named parameters.
#[must_use]
pub fn write_body(action: &str, api_key: &str, mut params: Params) -> Value {
    params.insert("action".to_owned(), Value::String(action.to_owned()));
    params.insert("apiKey".to_owned(), Value::String(api_key.to_owned()));
    Value::Object(params)
}

/// Interpret a raw HTTP response.
///
/// - non-2xx: failure, message from the body's `error` field or `API Error`
/// - 2xx with a non-null `error` field: backend failure
/// - 2xx `{"success": false, ...}`: backend failure with its `message`
/// - 2xx `{"success": true, "data": X}`: payload `X`; without `data` the
///   acknowledgement itself is the payload (`true`)
/// - any other JSON: the payload itself
/// - a `null` payload (bare body or `data: null`): decode failure
///
/// # Errors
///
/// Returns a [`TransportError`] for any of the failure shapes above, or if
/// the body is not JSON.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, TransportError> {
    let ok = (200..300).contains(&status);
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) if !ok => {
            return Err(TransportError::Status { status, message: format!("API Error (HTTP {status})") });
        }
        Err(e) => return Err(TransportError::Decode(e.to_string())),
    };

    if !ok {
        let message = error_field(&json).unwrap_or_else(|| format!("API Error (HTTP {status})"));
        return Err(TransportError::Status { status, message });
    }
    if let Some(message) = error_field(&json) {
        return Err(TransportError::Backend(message));
    }

    let payload = match json {
        Value::Object(mut map) if map.get("success").is_some_and(Value::is_boolean) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_ERROR_MESSAGE)
                    .to_owned();
                return Err(TransportError::Backend(message));
            }
            map.remove("data").unwrap_or(Value::Bool(true))
        }
        other => other,
    };
    if payload.is_null() {
        return Err(TransportError::Decode("response carried no payload".to_owned()));
    }
    Ok(payload)
}

fn error_field(json: &Value) -> Option<String> {
    match json.get("error")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
