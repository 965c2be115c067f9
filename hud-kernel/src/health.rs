use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::state::{new_state, Shared};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct KernelHealth {
    pub started_at: String,
    pub uptime_seconds: u64,
    pub inputs_processed: u64,
    pub messages_ignored: u64,
    pub bridge_calls: u64,
    pub bridge_failures: u64,
    pub mqtt_status: String,
    pub mqtt_reconnects: u64,
    pub memory_usage_mb: f32,
}

#[derive(Debug, Default)]
struct Counters {
    inputs_processed: AtomicU64,
    messages_ignored: AtomicU64,
    bridge_calls: AtomicU64,
    bridge_failures: AtomicU64,
    mqtt_reconnects: AtomicU64,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    started_at: OffsetDateTime,
    counters: Arc<Counters>,
    mqtt_status: Shared<String>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            started_at: OffsetDateTime::now_utc(),
            counters: Arc::new(Counters::default()),
            mqtt_status: new_state("disabled".to_string()),
        }
    }

    pub fn record_input(&self) {
        self.counters.inputs_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.counters.messages_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bridge_call(&self, ok: bool) {
        self.counters.bridge_calls.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.counters.bridge_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn mark_mqtt_connecting(&self) {
        *self.mqtt_status.lock() = "connecting".to_string();
    }

    pub fn mark_mqtt_connected(&self) {
        *self.mqtt_status.lock() = "connected".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.counters.mqtt_reconnects.fetch_add(1, Ordering::Relaxed);
        *self.mqtt_status.lock() = "reconnecting".to_string();
    }

    pub fn report(&self) -> KernelHealth {
        let c = &self.counters;
        KernelHealth {
            started_at: self.started_at.format(&Rfc3339).unwrap_or_default(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            inputs_processed: c.inputs_processed.load(Ordering::Relaxed),
            messages_ignored: c.messages_ignored.load(Ordering::Relaxed),
            bridge_calls: c.bridge_calls.load(Ordering::Relaxed),
            bridge_failures: c.bridge_failures.load(Ordering::Relaxed),
            mqtt_status: self.mqtt_status.lock().clone(),
            mqtt_reconnects: c.mqtt_reconnects.load(Ordering::Relaxed),
            memory_usage_mb: memory_usage_mb(),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = rss_kb {
                return kb as f32 / 1024.0;
            }
        }
    }
    0.0
}
