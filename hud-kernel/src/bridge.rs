/**
 * HOST BRIDGE - Outbound request/response calls to the host process
 *
 * ROLE:
 * The engine never talks to the host directly: it emits `BridgeCall`s and the
 * runtime hands them to a `HostBridge`. Calls are fire-and-forget, only the
 * `getThemeColors` answer is fed back into the engine.
 *
 * HOW IT WORKS:
 * - every call is a JSON POST to `{base_url}/{endpoint}`
 * - a non-2xx status, a transport error or a timeout is a `BridgeError`
 * - an empty body reads as `null`, a non-JSON body as a plain string
 */

use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::BridgeSettings;
use crate::theme::ThemeColorMap;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("host answered {status} on {endpoint}")]
    Status { endpoint: String, status: u16 },
    #[error("request to {0} timed out")]
    Timeout(String),
}

impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        match e.url() {
            Some(url) if e.is_timeout() => BridgeError::Timeout(url.to_string()),
            _ => BridgeError::Transport(e.to_string()),
        }
    }
}

/// Outbound call, named after the host endpoint it hits.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCall {
    SetNuiFocus { has_focus: bool, has_cursor: bool },
    HideFrame,
    /// `generation` comes back with the reply so the engine can drop stale answers.
    GetThemeColors { generation: u64 },
    SaveThemeColors(ThemeColorMap),
}

impl BridgeCall {
    pub fn endpoint(&self) -> &'static str {
        match self {
            BridgeCall::SetNuiFocus { .. } => "setNuiFocus",
            BridgeCall::HideFrame => "hideFrame",
            BridgeCall::GetThemeColors { .. } => "getThemeColors",
            BridgeCall::SaveThemeColors(_) => "saveThemeColors",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            BridgeCall::SetNuiFocus { has_focus, has_cursor } => json!({
                "hasFocus": has_focus,
                "hasCursor": has_cursor,
            }),
            BridgeCall::HideFrame | BridgeCall::GetThemeColors { .. } => json!({}),
            BridgeCall::SaveThemeColors(colors) => serde_json::to_value(colors).unwrap_or_default(),
        }
    }

    /// Generation tag of a call whose answer has to re-enter the engine.
    pub fn reply_generation(&self) -> Option<u64> {
        match self {
            BridgeCall::GetThemeColors { generation } => Some(*generation),
            _ => None,
        }
    }
}

/// Request/response port to the host.
pub trait HostBridge: Send + Sync + 'static {
    fn post(&self, endpoint: &str, body: Value) -> impl Future<Output = Result<Value, BridgeError>> + Send;
}

/// Sends one call through any bridge.
pub async fn dispatch<B: HostBridge>(bridge: &B, call: &BridgeCall) -> Result<Value, BridgeError> {
    bridge.post(call.endpoint(), call.body()).await
}

#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBridge {
    pub fn new(settings: &BridgeSettings) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

impl HostBridge for HttpBridge {
    async fn post(&self, endpoint: &str, body: Value) -> Result<Value, BridgeError> {
        let request_id = Uuid::new_v4();
        debug!("[bridge] POST {endpoint} ({request_id})");

        let response = self
            .client
            .post(self.url_for(endpoint))
            .header("X-Request-Id", request_id.to_string())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(parse_reply(&text))
    }
}

fn parse_reply(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
