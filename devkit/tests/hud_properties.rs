//! Behavioural properties of the sync engine, driven through the harness.

use hud_devkit::{HudMessageBuilder, TestHarness};
use hud_kernel::bridge::BridgeCall;
use hud_kernel::config::Authority;
use hud_kernel::engine::{DashboardAction, Input};
use hud_kernel::kinematics::DriveInput;
use hud_kernel::theme::{ThemeColorMap, ThemeSlot};
use hud_kernel::weapon::TriggerInput;
use serde_json::{json, Value};

fn set_color(slot: &str, color: &str) -> Input {
    Input::Dashboard(DashboardAction::SetColor { slot: slot.into(), color: color.into() })
}

fn theme_reply(generation: u64, colors: Value) -> Input {
    Input::ThemeFetched { generation, result: Ok(colors) }
}

fn saved_colors(calls: &[BridgeCall]) -> Option<ThemeColorMap> {
    calls.iter().find_map(|call| match call {
        BridgeCall::SaveThemeColors(colors) => Some(colors.clone()),
        _ => None,
    })
}

#[test]
fn absent_or_non_numeric_fields_keep_their_value() {
    let mut h = TestHarness::host();
    h.send("updatePlayerHud", json!({ "health": 80, "armor": 40, "hunger": 70 })).unwrap();
    h.send("updatePlayerHud", json!({ "health": 60 })).unwrap();
    h.send("updatePlayerHud", json!({ "armor": "lots", "hunger": null, "thirst": 10 })).unwrap();

    let stats = h.snapshot().stats;
    assert_eq!(stats.health, 60.0);
    assert_eq!(stats.armor, 40.0);
    assert_eq!(stats.hunger, 70.0);
    assert_eq!(stats.thirst, 10.0);
}

#[test]
fn vehicle_messages_only_touch_vehicle_fields() {
    let mut h = TestHarness::host();
    h.send("updatePlayerHud", json!({ "health": 55, "stress": 20 })).unwrap();
    h.send("updateVehicleHud", json!({ "fuel": 30, "engine": 90 })).unwrap();

    let stats = h.snapshot().stats;
    assert_eq!(stats.health, 55.0);
    assert_eq!(stats.stress, 20.0);
    assert_eq!(stats.fuel, 30.0);
}

#[test]
fn wholesale_slices_reset_omitted_booleans() {
    let mut h = TestHarness::host();
    h.send("updatePlayerHud", json!({ "talking": true, "armed": true, "voice": 3 })).unwrap();
    h.send("updatePlayerHud", json!({ "health": 90 })).unwrap();

    let player = h.snapshot().player;
    assert!(!player.talking);
    assert!(!player.armed);
    assert_eq!(player.voice, 2);

    h.send("updateVehicleHud", json!({ "show": true, "gear": 3 })).unwrap();
    h.send("updateVehicleHud", json!({ "fuel": 20 })).unwrap();
    let vehicle = h.snapshot().vehicle;
    assert!(!vehicle.show);
    assert_eq!(vehicle.gear, 0);
}

#[test]
fn armor_85_to_55_drops_segments_three_and_four() {
    let mut h = TestHarness::host();
    h.send("updatePlayerHud", json!({ "armor": 85, "maxArmor": 100 })).unwrap();
    h.advance(1000);
    h.send("updatePlayerHud", json!({ "armor": 55 })).unwrap();

    let effects = h.snapshot().effects;
    assert_eq!(effects.falling_segments, vec![3, 4]);
    assert!(!effects.armor_gain);

    h.advance(599);
    assert_eq!(h.snapshot().effects.falling_segments.len(), 2);
    h.advance(1);
    assert!(h.snapshot().effects.falling_segments.is_empty());
}

#[test]
fn remote_theme_wins_over_legacy_fallback() {
    let legacy = json!({ "health": "#222222", "armor": "#333333" }).as_object().cloned();
    let mut h = TestHarness::new(Authority::Host, legacy);

    h.send_envelope(HudMessageBuilder::load_theme_colors(json!({ "health": "#111111" })))
        .unwrap();
    h.advance(5000);

    let theme = h.snapshot().theme;
    assert_eq!(theme.health, "#111111");
    assert_eq!(theme.armor, "#333333");
}

#[test]
fn ten_accelerate_ticks_reach_fifty() {
    let mut h = TestHarness::local();
    h.input(Input::Drive(DriveInput::Accelerate));
    h.advance(1000);

    let stats = h.snapshot().stats;
    assert_eq!(stats.speed, 50.0);
    assert!(stats.rpm <= 1.0);
}

#[test]
fn brake_halts_acceleration_on_the_next_tick() {
    let mut h = TestHarness::local();
    h.input(Input::Drive(DriveInput::Accelerate));
    h.advance(500);
    let before = h.snapshot().stats.speed;

    h.input(Input::Drive(DriveInput::Brake));
    h.advance(100);
    assert!(h.snapshot().stats.speed < before);

    h.advance(2000);
    assert_eq!(h.snapshot().stats.speed, 0.0);
}

#[test]
fn release_returns_to_coasting_and_eventually_idles() {
    let mut h = TestHarness::local();
    h.input(Input::Drive(DriveInput::Accelerate));
    h.advance(300);
    h.input(Input::Drive(DriveInput::Release));
    assert_eq!(h.engine.snapshot().stats.speed, 15.0);

    h.advance(60_000);
    assert_eq!(h.snapshot().stats.speed, 0.0);
    assert_eq!(h.engine.pending_timers(), 0);
}

#[test]
fn account_hides_after_exactly_three_seconds() {
    let mut h = TestHarness::host();
    h.send_envelope(HudMessageBuilder::show_account("cash", 500.0)).unwrap();
    let account = h.snapshot().account;
    assert!(account.visible);
    assert_eq!(account.kind, "cash");

    for _ in 0..29 {
        h.advance(100);
        assert!(h.snapshot().account.visible, "hidden early at {}ms", h.elapsed_ms());
    }
    h.advance(99);
    assert!(h.snapshot().account.visible);
    h.advance(1);
    assert!(!h.snapshot().account.visible);
}

#[test]
fn refresh_all_components_is_idempotent() {
    let mut h = TestHarness::host();
    h.send("hudInitialize", json!({ "config": { "disableStress": false } })).unwrap();
    h.send("updatePlayerHud", json!({ "health": 70, "talking": true })).unwrap();
    h.send("updateVehicleHud", json!({ "show": true, "fuel": 44 })).unwrap();
    h.advance(1000);

    let before = serde_json::to_vec(&h.snapshot()).unwrap();
    for _ in 0..5 {
        h.send_envelope(HudMessageBuilder::refresh_all_components()).unwrap();
    }
    let after = serde_json::to_vec(&h.snapshot()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn slow_theme_read_cannot_undo_a_save() {
    let mut h = TestHarness::host();
    h.send_envelope(HudMessageBuilder::toggle_theme_dashboard()).unwrap();
    let generation = h.take_calls().iter().find_map(BridgeCall::reply_generation).unwrap();

    h.input(set_color("health", "#abcdef"));
    h.input(Input::Dashboard(DashboardAction::Save));
    assert_eq!(saved_colors(&h.take_calls()).unwrap().health, "#abcdef");

    h.input(theme_reply(generation, json!({ "health": "#010101" })));
    h.send("updatePlayerHud", json!({ "health": 70 })).unwrap();

    assert_eq!(h.snapshot().theme.health, "#abcdef");
    assert_eq!(h.surface.get(ThemeSlot::Health).map(|s| s.value.as_str()), Some("#abcdef"));
}

#[test]
fn theme_read_landing_mid_edit_keeps_the_edit() {
    let mut h = TestHarness::host();
    h.send_envelope(HudMessageBuilder::toggle_theme_dashboard()).unwrap();
    let generation = h.take_calls().iter().find_map(BridgeCall::reply_generation).unwrap();

    h.input(set_color("armor", "#123456"));
    h.input(theme_reply(generation, json!({ "armor": "#654321", "oxygen": "#0a0a0a" })));
    h.input(Input::Dashboard(DashboardAction::Save));

    let saved = saved_colors(&h.take_calls()).unwrap();
    assert_eq!(saved.armor, "#123456");
    assert_eq!(saved.oxygen, "#0a0a0a");
    assert_eq!(h.surface.get(ThemeSlot::Armor).map(|s| s.value.as_str()), Some("#123456"));
}

#[test]
fn held_trigger_empties_the_magazine_and_stops() {
    let mut h = TestHarness::local();
    h.send("updatePlayerHud", json!({ "currentAmmo": 3, "reserveAmmo": 60 })).unwrap();
    h.input(Input::Trigger(TriggerInput::Shoot));
    h.advance(200);

    let snap = h.snapshot();
    assert_eq!(snap.player.current_ammo, 0);
    assert_eq!(snap.effects.pulse, 2);

    h.advance(5000);
    assert_eq!(h.snapshot().player.current_ammo, 0);
    assert_eq!(h.engine.pending_timers(), 0);
}
