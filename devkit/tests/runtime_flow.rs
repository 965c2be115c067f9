//! End-to-end flows through the async runtime, on a paused tokio clock.

use hud_devkit::{HudMessageBuilder, MockHostBridge, RecordingStylePort};
use hud_kernel::config::Authority;
use hud_kernel::engine::{DashboardAction, Engine, Input, Notice};
use hud_kernel::health::HealthTracker;
use hud_kernel::runtime::{self, spawn_runtime, RuntimeHandle};
use hud_kernel::state::{new_state, Shared};
use hud_kernel::theme::{StyleCommand, StylePriority};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Rig {
    handle: RuntimeHandle,
    bridge: MockHostBridge,
    style: Shared<RecordingStylePort>,
    health: HealthTracker,
}

fn rig(bridge: MockHostBridge) -> Rig {
    let style = new_state(RecordingStylePort::new());
    let health = HealthTracker::new();
    let engine = Engine::new(Authority::Host, None, runtime::now());
    let handle = spawn_runtime(engine, Arc::new(bridge.clone()), style.clone(), health.clone());
    Rig { handle, bridge, style, health }
}

async fn send(rig: &Rig, input: Input) {
    rig.handle.inputs.send(input).await.unwrap();
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn opening_the_dashboard_fetches_the_remote_theme() {
    let rig = rig(MockHostBridge::new().with_theme(json!({ "health": "#121212", "bogus": "#000000" })));
    let command = HudMessageBuilder::command("toggleThemeDashboard", json!(null)).unwrap();
    send(&rig, Input::Command(command)).await;
    settle().await;

    let endpoints = rig.bridge.endpoints();
    assert!(endpoints.contains(&"setNuiFocus".to_string()));
    assert!(endpoints.contains(&"getThemeColors".to_string()));
    assert_eq!(rig.bridge.calls_to("setNuiFocus")[0].body["hasCursor"], true);

    let snap = rig.handle.snapshot();
    assert!(snap.theme_dashboard_open);
    assert_eq!(snap.theme.health, "#121212");
    assert_eq!(rig.health.report().bridge_calls, 2);

    rig.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_current_colors() {
    let rig = rig(MockHostBridge::new().with_theme_failure("host offline"));
    let load = HudMessageBuilder::command("loadThemeColors", json!({ "ammo": "#0a0a0a" })).unwrap();
    send(&rig, Input::Command(load)).await;
    let toggle = HudMessageBuilder::command("toggleThemeDashboard", json!(null)).unwrap();
    send(&rig, Input::Command(toggle)).await;
    settle().await;

    assert_eq!(rig.handle.snapshot().theme.ammo, "#0a0a0a");
    assert_eq!(rig.health.report().bridge_failures, 1);

    rig.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn saving_persists_applies_and_notifies() {
    let rig = rig(MockHostBridge::new());
    let mut notices = rig.handle.subscribe_notices();

    let toggle = HudMessageBuilder::command("toggleThemeDashboard", json!(null)).unwrap();
    send(&rig, Input::Command(toggle)).await;
    settle().await;
    rig.style.lock().take();

    send(
        &rig,
        Input::Dashboard(DashboardAction::SetColor { slot: "health".into(), color: "#abcdef".into() }),
    )
    .await;
    send(&rig, Input::Dashboard(DashboardAction::Save)).await;
    settle().await;

    let saved = rig.bridge.last_saved_theme().expect("saveThemeColors was called");
    assert_eq!(saved.health, "#abcdef");

    let applied = rig.style.lock().take();
    assert!(applied.iter().any(|c| matches!(
        c,
        StyleCommand::Set { color, priority: StylePriority::Important, .. } if color == "#abcdef"
    )));

    match notices.recv().await.unwrap() {
        Notice::ThemeChanged(colors) => assert_eq!(colors, saved),
    }
    assert!(!rig.handle.snapshot().theme_dashboard_open);

    rig.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_reply_does_not_overwrite_a_save() {
    let rig = rig(
        MockHostBridge::new()
            .with_theme(json!({ "health": "#010101" }))
            .with_latency(Duration::from_millis(50)),
    );
    let toggle = HudMessageBuilder::command("toggleThemeDashboard", json!(null)).unwrap();
    send(&rig, Input::Command(toggle)).await;
    send(
        &rig,
        Input::Dashboard(DashboardAction::SetColor { slot: "health".into(), color: "#abcdef".into() }),
    )
    .await;
    send(&rig, Input::Dashboard(DashboardAction::Save)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(rig.bridge.endpoints().contains(&"getThemeColors".to_string()));
    assert_eq!(rig.bridge.last_saved_theme().unwrap().health, "#abcdef");
    assert_eq!(rig.handle.snapshot().theme.health, "#abcdef");

    rig.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn account_timer_runs_on_the_runtime_clock() {
    let rig = rig(MockHostBridge::new());
    let show = HudMessageBuilder::command("showAccount", json!({ "type": "cash", "amount": 500 })).unwrap();
    send(&rig, Input::Command(show)).await;

    tokio::time::sleep(Duration::from_millis(2990)).await;
    assert!(rig.handle.snapshot().account.visible);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!rig.handle.snapshot().account.visible);

    rig.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn escape_without_dashboard_hides_the_frame() {
    let rig = rig(MockHostBridge::new().failing("hideFrame"));
    send(&rig, Input::Escape).await;
    settle().await;

    assert_eq!(rig.bridge.endpoints(), vec!["hideFrame"]);
    assert_eq!(rig.health.report().bridge_failures, 1);

    rig.handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop() {
    let rig = rig(MockHostBridge::new());
    let inputs = rig.handle.inputs.clone();
    rig.handle.shutdown().await;
    assert!(inputs.send(Input::Escape).await.is_err());
}
