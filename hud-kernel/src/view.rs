//! Pure projection of a [`HudSnapshot`] into what each widget shows.
//!
//! While the theme dashboard is open every bar is forced visible and raised
//! to a preview minimum so colors can be judged on a populated HUD.

use serde::Serialize;

use crate::models::{HudSnapshot, VoiceRange};
use crate::visibility::SpeedometerPhase;

const PREVIEW_HEALTH: f64 = 80.0;
const PREVIEW_ARMOR: f64 = 75.0;
const PREVIEW_HUNGER: f64 = 65.0;
const PREVIEW_THIRST: f64 = 70.0;
const PREVIEW_STRESS: f64 = 25.0;
const PREVIEW_STAMINA: f64 = 85.0;
const PREVIEW_OXYGEN: f64 = 90.0;
const PREVIEW_AMMO: (u32, u32) = (24, 120);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub visible: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HealthLevel {
    Normal,
    Low,
    Critical,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TalkingState {
    Idle,
    Talking,
    Radio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceView {
    pub visible: bool,
    pub state: TalkingState,
    pub range: VoiceRange,
    pub has_radio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenEffects {
    pub blur: bool,
    pub shake: bool,
    pub stress_distortion: bool,
    pub low_oxygen_tint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedometerView {
    pub visible: bool,
    pub phase: SpeedometerPhase,
    pub speed: f64,
    pub unit: String,
    pub progress: f64,
    pub progress_color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmoView {
    pub visible: bool,
    pub current: u32,
    pub reserve: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HudView {
    pub visible: bool,
    pub health: Bar,
    pub health_level: HealthLevel,
    pub last_stand: bool,
    pub armor: Bar,
    pub hunger: Bar,
    pub thirst: Bar,
    pub stress: Bar,
    pub stamina: Bar,
    pub oxygen: Bar,
    pub ammo: AmmoView,
    pub voice: VoiceView,
    pub speedometer: SpeedometerView,
    pub compass_visible: bool,
    pub account_visible: bool,
    pub effects: ScreenEffects,
}

pub fn health_level(health: f64, max_health: f64) -> HealthLevel {
    let pct = if max_health > 0.0 { health / max_health * 100.0 } else { 0.0 };
    if pct <= 0.0 {
        HealthLevel::Dead
    } else if pct <= 30.0 {
        HealthLevel::Critical
    } else if pct <= 50.0 {
        HealthLevel::Low
    } else {
        HealthLevel::Normal
    }
}

pub fn progress_color(gear_progress: f64) -> &'static str {
    if gear_progress < 30.0 {
        "greenyellow"
    } else if gear_progress < 60.0 {
        "#ffff00"
    } else if gear_progress < 90.0 {
        "#ff8000"
    } else {
        "#FF3838"
    }
}

pub fn talking_state(talking: bool, on_radio: bool) -> TalkingState {
    match (talking, on_radio) {
        (_, true) => TalkingState::Radio,
        (true, false) => TalkingState::Talking,
        _ => TalkingState::Idle,
    }
}

pub fn project(snap: &HudSnapshot) -> HudView {
    let s = &snap.stats;
    let settings = &snap.config.hud_settings;
    let preview = snap.theme_dashboard_open;
    let shown = |value: f64, min: f64| if preview { value.max(min) } else { value };

    let level = health_level(s.health, s.max_health);
    let critical = matches!(level, HealthLevel::Critical | HealthLevel::Dead);
    let low_oxygen = s.oxygen <= 20.0;

    let speedometer_visible = snap.speedometer != SpeedometerPhase::Hidden;

    HudView {
        visible: snap.visible,
        health: Bar {
            visible: settings.show_health || preview,
            value: shown(s.health, PREVIEW_HEALTH),
        },
        health_level: level,
        last_stand: snap.player.in_last_stand,
        armor: Bar {
            visible: settings.show_armor && (s.armor > 0.0 || preview),
            value: shown(s.armor, PREVIEW_ARMOR),
        },
        hunger: Bar {
            visible: settings.show_hunger && (s.hunger < 100.0 || preview),
            value: shown(s.hunger, PREVIEW_HUNGER),
        },
        thirst: Bar {
            visible: settings.show_thirst && (s.thirst < 100.0 || preview),
            value: shown(s.thirst, PREVIEW_THIRST),
        },
        stress: Bar {
            visible: settings.show_stress && !snap.config.disable_stress && (snap.stress_bar_visible || preview),
            value: shown(s.stress, PREVIEW_STRESS),
        },
        // Stamina has no toggle of its own and follows the oxygen one.
        stamina: Bar {
            visible: settings.show_oxygen && !snap.config.disable_stamina && (s.stamina < 100.0 || preview),
            value: shown(s.stamina, PREVIEW_STAMINA),
        },
        oxygen: Bar {
            visible: settings.show_oxygen && !snap.config.disable_oxygen && (s.oxygen < 100.0 || preview),
            value: shown(s.oxygen, PREVIEW_OXYGEN),
        },
        ammo: AmmoView {
            visible: snap.player.armed || preview,
            current: if preview { snap.player.current_ammo.max(PREVIEW_AMMO.0) } else { snap.player.current_ammo },
            reserve: if preview { snap.player.reserve_ammo.max(PREVIEW_AMMO.1) } else { snap.player.reserve_ammo },
        },
        voice: VoiceView {
            visible: settings.show_voice,
            state: talking_state(snap.player.talking, snap.player.talking_on_radio),
            range: VoiceRange::from_level(snap.player.voice),
            has_radio: snap.player.has_radio,
        },
        speedometer: SpeedometerView {
            visible: speedometer_visible && settings.show_speed,
            phase: snap.speedometer,
            speed: s.speed,
            unit: snap.vehicle.speed_unit.clone(),
            progress: snap.vehicle.gear_progress,
            progress_color: progress_color(snap.vehicle.gear_progress),
        },
        compass_visible: speedometer_visible,
        account_visible: snap.account.visible,
        effects: ScreenEffects {
            blur: critical && (s.hunger <= 20.0 || s.thirst <= 20.0),
            shake: critical && low_oxygen,
            stress_distortion: s.stress > 80.0,
            low_oxygen_tint: low_oxygen,
        },
    }
}
