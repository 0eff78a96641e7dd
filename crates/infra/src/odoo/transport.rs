//! JSON-RPC 2.0 transport for the Odoo external API
//!
//! Speaks to the ERP's `/jsonrpc` endpoint. Two services exist:
//! `common` (authentication, version probe) and `object` (`execute_kw`).
//! The transport only classifies responses; retry and session policy
//! live in [`super::session::SessionManager`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mirador_domain::MiradorError;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Request timeout. Matches the longest report query seen in production
/// with comfortable headroom.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How much of a non-JSON body is kept for diagnostics.
const SNIPPET_CHARS: usize = 120;

/// Errors at the JSON-RPC layer.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection, TLS or timeout failure. Never retried at this layer.
    #[error("Transport error: {0}")]
    Http(String),

    /// The response body is not JSON. Odoo answers with an HTML error
    /// page when the worker holding the session died; the session layer
    /// treats this as a poisoned session and replays once.
    #[error("Non-JSON response from server: {snippet}")]
    PoisonedSession { snippet: String },

    /// A well-formed JSON-RPC error object.
    #[error("RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The body is JSON but not a JSON-RPC envelope.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<RpcError> for MiradorError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Http(msg) => Self::Network(msg),
            poisoned @ RpcError::PoisonedSession { .. } => Self::Network(poisoned.to_string()),
            fault @ RpcError::Fault { .. } => Self::Internal(fault.to_string()),
            RpcError::Decode(msg) => Self::Decode(msg),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: u64,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    service: &'a str,
    method: &'a str,
    args: &'a Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Deserialize)]
struct RpcFault {
    #[serde(default)]
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<RpcFaultData>,
}

/// Odoo puts the human-readable message under `data.message`; the
/// top-level `message` is usually just "Odoo Server Error".
#[derive(Deserialize)]
struct RpcFaultData {
    #[serde(default)]
    message: Option<String>,
}

/// Posts JSON-RPC 2.0 envelopes to the ERP.
pub struct JsonRpcTransport {
    client: ReqwestClient,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    /// Build a transport for the given Odoo base URL.
    ///
    /// # Errors
    /// Returns `MiradorError::Config` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, MiradorError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .no_proxy()
            .build()
            .map_err(|e| MiradorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/jsonrpc", base_url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }

    /// Execute one JSON-RPC call and classify the response.
    ///
    /// # Errors
    /// See [`RpcError`] for the classification.
    pub async fn call(&self, service: &str, method: &str, args: Value) -> Result<Value, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams { service, method, args: &args },
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        debug!(service, method, "calling jsonrpc endpoint");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;

        // The status line is not checked on purpose. A dead worker answers
        // 200 with an HTML page, and real faults also come back 200 with an
        // error member. Classification is parse-driven.
        let body = response.text().await.map_err(|e| RpcError::Http(e.to_string()))?;

        let raw: Value = serde_json::from_str(&body)
            .map_err(|_| RpcError::PoisonedSession { snippet: snippet(&body) })?;

        let envelope: RpcResponse =
            serde_json::from_value(raw).map_err(|e| RpcError::Decode(e.to_string()))?;

        if let Some(fault) = envelope.error {
            let message = fault.data.and_then(|d| d.message).unwrap_or(fault.message);
            return Err(RpcError::Fault { code: fault.code, message });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(SNIPPET_CHARS).collect()
}
