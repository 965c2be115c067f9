/*!
Test harness for the HUD sync engine

Drives an `Engine` with a manual clock and flushes every `Outbox` the same
way the runtime loop does: bridge calls, style commands, theme reassert,
notices. No tokio runtime needed.
*/

use anyhow::Result;
use hud_kernel::bridge::BridgeCall;
use hud_kernel::config::Authority;
use hud_kernel::engine::{Engine, Input, Notice, Outbox};
use hud_kernel::models::HudSnapshot;
use hud_kernel::style::{StylePort, StyleSurface};
use hud_kernel::theme::RawColors;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::messages::HudMessageBuilder;
use crate::mock_host::RecordingStylePort;

pub struct TestHarness {
    pub engine: Engine,
    /// What a renderer would currently show.
    pub surface: StyleSurface,
    /// Every style command, in application order.
    pub style_log: RecordingStylePort,
    pub calls: Vec<BridgeCall>,
    pub notices: Vec<Notice>,
    start: Instant,
    clock: Instant,
}

impl TestHarness {
    pub fn new(authority: Authority, legacy_theme: Option<RawColors>) -> Self {
        env_logger::try_init().ok();
        let start = Instant::now();
        Self {
            engine: Engine::new(authority, legacy_theme, start),
            surface: StyleSurface::new(),
            style_log: RecordingStylePort::new(),
            calls: Vec::new(),
            notices: Vec::new(),
            start,
            clock: start,
        }
    }

    /// Host-driven speed, no legacy cache.
    pub fn host() -> Self {
        Self::new(Authority::Host, None)
    }

    /// Local kinematics simulator, no legacy cache.
    pub fn local() -> Self {
        Self::new(Authority::Local, None)
    }

    pub fn now(&self) -> Instant {
        self.clock
    }

    pub fn elapsed_ms(&self) -> u128 {
        (self.clock - self.start).as_millis()
    }

    /// Sends one host message at the current instant.
    pub fn send(&mut self, action: &str, data: Value) -> Result<()> {
        let command = HudMessageBuilder::command(action, data)?;
        self.input(Input::Command(command));
        Ok(())
    }

    /// Sends an envelope built by `HudMessageBuilder`.
    pub fn send_envelope(&mut self, envelope: Value) -> Result<()> {
        let action = envelope["action"].as_str().unwrap_or_default().to_string();
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);
        self.send(&action, data)
    }

    pub fn input(&mut self, input: Input) {
        let out = self.engine.handle(input, self.clock);
        self.flush(out);
    }

    /// Moves the clock forward, firing every timer that comes due on the way.
    pub fn advance(&mut self, ms: u64) {
        self.clock += Duration::from_millis(ms);
        let out = self.engine.fire_due(self.clock);
        self.flush(out);
    }

    pub fn snapshot(&self) -> HudSnapshot {
        self.engine.snapshot()
    }

    pub fn take_calls(&mut self) -> Vec<BridgeCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn flush(&mut self, out: Outbox) {
        self.calls.extend(out.calls);
        self.apply_style(&out.style);
        if out.reassert_theme {
            let held = self.engine.reassert_theme();
            self.apply_style(&held);
        }
        self.notices.extend(out.notices);
    }

    fn apply_style(&mut self, commands: &[hud_kernel::theme::StyleCommand]) {
        if commands.is_empty() {
            return;
        }
        log::debug!("[harness] applying {} style commands", commands.len());
        self.surface.apply_all(commands);
        self.style_log.apply_all(commands);
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::host()
    }
}
