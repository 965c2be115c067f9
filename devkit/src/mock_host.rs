/*!
Mock host side of the kernel

`MockHostBridge` stands in for the host's HTTP callback endpoints and
`RecordingStylePort` for the renderer's style surface. Both keep everything
they receive so tests can assert on order and content.
*/

use chrono::{DateTime, Utc};
use hud_kernel::bridge::{BridgeError, HostBridge};
use hud_kernel::style::StylePort;
use hud_kernel::theme::{StyleCommand, ThemeColorMap};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedCall {
    pub endpoint: String,
    pub body: Value,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct Script {
    theme_reply: Option<Result<Value, String>>,
    failing: HashSet<String>,
    latency: Option<Duration>,
}

/// Host bridge double. Clones share their recordings.
#[derive(Clone, Default)]
pub struct MockHostBridge {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    script: Arc<Mutex<Script>>,
}

impl MockHostBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `getThemeColors` with this payload.
    pub fn with_theme(self, colors: Value) -> Self {
        lock(&self.script).theme_reply = Some(Ok(colors));
        self
    }

    /// Answer `getThemeColors` with a transport error.
    pub fn with_theme_failure(self, reason: &str) -> Self {
        lock(&self.script).theme_reply = Some(Err(reason.to_string()));
        self
    }

    /// Every call to `endpoint` fails with a 500.
    pub fn failing(self, endpoint: &str) -> Self {
        lock(&self.script).failing.insert(endpoint.to_string());
        self
    }

    /// Delay every answer, measured on the tokio clock.
    pub fn with_latency(self, latency: Duration) -> Self {
        lock(&self.script).latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.endpoint.clone()).collect()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .cloned()
            .collect()
    }

    /// Last body sent to `saveThemeColors`, decoded.
    pub fn last_saved_theme(&self) -> Option<ThemeColorMap> {
        let call = self.calls_to("saveThemeColors").pop()?;
        serde_json::from_value(call.body).ok()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    fn reply(&self, endpoint: &str) -> Result<Value, BridgeError> {
        let script = lock(&self.script);
        if script.failing.contains(endpoint) {
            return Err(BridgeError::Status { endpoint: endpoint.to_string(), status: 500 });
        }
        if endpoint != "getThemeColors" {
            return Ok(json!({ "ok": true }));
        }
        match &script.theme_reply {
            Some(Ok(colors)) => Ok(colors.clone()),
            Some(Err(reason)) => Err(BridgeError::Transport(reason.clone())),
            None => Ok(json!({})),
        }
    }
}

impl HostBridge for MockHostBridge {
    async fn post(&self, endpoint: &str, body: Value) -> Result<Value, BridgeError> {
        lock(&self.calls).push(RecordedCall {
            endpoint: endpoint.to_string(),
            body,
            at: Utc::now(),
        });
        log::debug!("[mock-host] {endpoint}");

        let latency = lock(&self.script).latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.reply(endpoint)
    }
}

/// Style port that keeps every command it was asked to apply.
#[derive(Debug, Default, Clone)]
pub struct RecordingStylePort {
    applied: Vec<StyleCommand>,
    batches: usize,
}

impl RecordingStylePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> &[StyleCommand] {
        &self.applied
    }

    /// Number of `apply_all` batches seen.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn take(&mut self) -> Vec<StyleCommand> {
        self.batches = 0;
        std::mem::take(&mut self.applied)
    }
}

impl StylePort for RecordingStylePort {
    fn apply(&mut self, command: &StyleCommand) {
        self.applied.push(command.clone());
    }

    fn apply_all(&mut self, commands: &[StyleCommand]) {
        self.batches += 1;
        for command in commands {
            self.apply(command);
        }
    }
}
