/**
 * RUNTIME LOOP - Serializes inputs and timer firings onto one task
 *
 * ROLE:
 * Owns the `Engine` and is the only place it is touched. Transports push
 * `Input`s into an mpsc channel; the loop processes them in delivery order
 * and wakes up on its own for the next timer deadline.
 *
 * HOW IT WORKS:
 * - time comes from `tokio::time`, so paused-clock tests drive timers
 * - every `Outbox` is flushed in a fixed order: bridge calls (spawned), style
 *   commands, snapshot publish, theme reassert, notices
 * - a `getThemeColors` answer comes back as `Input::ThemeFetched`, tagged
 *   with the generation the engine gave the request
 * - closing every sender or sending `Input::Shutdown` clears all timers and
 *   ends the task
 */

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::{dispatch, BridgeCall, HostBridge};
use crate::engine::{Engine, Input, Notice, Outbox};
use crate::health::HealthTracker;
use crate::models::HudSnapshot;
use crate::state::Shared;
use crate::style::StylePort;

pub const INPUT_QUEUE: usize = 256;
const NOTICE_QUEUE: usize = 16;

/// Loop-side clock, pausable in tests.
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// What the transports and the HTTP API hold on to.
pub struct RuntimeHandle {
    pub inputs: mpsc::Sender<Input>,
    pub snapshots: watch::Receiver<HudSnapshot>,
    pub notices: broadcast::Sender<Notice>,
    pub task: JoinHandle<()>,
}

impl RuntimeHandle {
    pub fn snapshot(&self) -> HudSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Stops the loop and waits for it to finish.
    pub async fn shutdown(self) {
        if self.inputs.send(Input::Shutdown).await.is_err() {
            debug!("[runtime] already stopped");
        }
        if let Err(e) = self.task.await {
            warn!("[runtime] task ended abnormally: {e}");
        }
    }
}

struct Runtime<B, P> {
    engine: Engine,
    bridge: Arc<B>,
    style: Shared<P>,
    health: HealthTracker,
    inputs: mpsc::WeakSender<Input>,
    snapshots: watch::Sender<HudSnapshot>,
    notices: broadcast::Sender<Notice>,
}

pub fn spawn_runtime<B, P>(engine: Engine, bridge: Arc<B>, style: Shared<P>, health: HealthTracker) -> RuntimeHandle
where
    B: HostBridge,
    P: StylePort + 'static,
{
    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE);
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
    let (notice_tx, _) = broadcast::channel(NOTICE_QUEUE);

    let runtime = Runtime {
        engine,
        bridge,
        style,
        health,
        inputs: input_tx.downgrade(),
        snapshots: snapshot_tx,
        notices: notice_tx.clone(),
    };
    let task = tokio::spawn(runtime.run(input_rx));

    RuntimeHandle {
        inputs: input_tx,
        snapshots: snapshot_rx,
        notices: notice_tx,
        task,
    }
}

impl<B, P> Runtime<B, P>
where
    B: HostBridge,
    P: StylePort + 'static,
{
    async fn run(mut self, mut rx: mpsc::Receiver<Input>) {
        info!("[runtime] started ({:?} authority)", self.engine.authority());
        loop {
            let deadline = self.engine.next_deadline();
            tokio::select! {
                input = rx.recv() => {
                    let Some(input) = input else {
                        self.engine.shutdown();
                        break;
                    };
                    self.health.record_input();
                    let out = self.engine.handle(input, now());
                    self.flush(out);
                    if !self.engine.is_running() {
                        break;
                    }
                }
                _ = sleep_until(deadline) => {
                    let out = self.engine.fire_due(now());
                    self.flush(out);
                }
            }
        }
        info!("[runtime] stopped");
    }

    fn flush(&mut self, out: Outbox) {
        for call in out.calls {
            self.spawn_call(call);
        }
        if !out.style.is_empty() {
            self.style.lock().apply_all(&out.style);
        }
        if out.rerender {
            self.snapshots.send_replace(self.engine.snapshot());
        }
        if out.reassert_theme {
            let held = self.engine.reassert_theme();
            if !held.is_empty() {
                self.style.lock().apply_all(&held);
            }
        }
        for notice in out.notices {
            // No subscriber is fine.
            let _ = self.notices.send(notice);
        }
    }

    fn spawn_call(&self, call: BridgeCall) {
        let bridge = self.bridge.clone();
        let health = self.health.clone();
        let reply_to = call
            .reply_generation()
            .and_then(|generation| self.inputs.upgrade().map(|inputs| (generation, inputs)));
        tokio::spawn(async move {
            let result = dispatch(bridge.as_ref(), &call).await;
            health.record_bridge_call(result.is_ok());
            if let Err(e) = &result {
                warn!("[runtime] {} failed: {e}", call.endpoint());
            }
            if let Some((generation, inputs)) = reply_to {
                let reply = Input::ThemeFetched { generation, result: result.map_err(|e| e.to_string()) };
                if inputs.send(reply).await.is_err() {
                    debug!("[runtime] dropped {} reply after shutdown", call.endpoint());
                }
            }
        });
    }
}
