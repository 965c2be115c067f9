//! Canonical state slices and the snapshot handed to the presentation layer.
//!
//! Field names serialize in camelCase so the snapshot matches the wire names
//! the host and the presentation layer already use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::effects::EffectProjection;
use crate::theme::{ThemeColorMap, ThemeSlot, ThemeSource};
use crate::visibility::SpeedometerPhase;

/// Vitals and vehicle telemetry. Field-merged (see `reducer::FieldMerge`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub health: f64,
    pub max_health: f64,
    pub armor: f64,
    pub max_armor: f64,
    pub hunger: f64,
    pub thirst: f64,
    pub stress: f64,
    pub oxygen: f64,
    pub stamina: f64,
    pub speed: f64,
    pub fuel: f64,
    pub engine: f64,
    pub seatbelt: bool,
    pub rpm: f64,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            armor: 0.0,
            max_armor: 100.0,
            hunger: 100.0,
            thirst: 100.0,
            stress: 0.0,
            oxygen: 100.0,
            stamina: 100.0,
            speed: 0.0,
            fuel: 100.0,
            engine: 100.0,
            seatbelt: false,
            rpm: 0.0,
        }
    }
}

/// Per-frame session flags pushed by the host. Wholesale-replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub show: bool,
    pub talking: bool,
    pub talking_on_radio: bool,
    pub on_phone: bool,
    pub armed: bool,
    /// Host parachute state code, -1 when not equipped.
    pub parachute: i64,
    pub player_dead: bool,
    /// 0..=3, see [`VoiceRange`].
    pub voice: u8,
    pub current_ammo: u32,
    pub reserve_ammo: u32,
    pub in_last_stand: bool,
    pub has_radio: bool,
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            show: false,
            talking: false,
            talking_on_radio: false,
            on_phone: false,
            armed: false,
            parachute: -1,
            player_dead: false,
            voice: 2,
            current_ammo: 0,
            reserve_ammo: 0,
            in_last_stand: false,
            has_radio: false,
        }
    }
}

/// Vehicle frame state. Wholesale-replaced, except `cruise` which `cruiseToggle` patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleData {
    pub show: bool,
    pub seatbelt: bool,
    pub cruise: bool,
    pub nos: f64,
    pub gear: i64,
    /// Drives the progress ring, not raw speed.
    pub gear_progress: f64,
    pub speed_unit: String,
}

impl Default for VehicleData {
    fn default() -> Self {
        Self {
            show: false,
            seatbelt: false,
            cruise: false,
            nos: 0.0,
            gear: 0,
            gear_progress: 0.0,
            speed_unit: "MPH".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompassData {
    pub direction: String,
    pub roads: String,
    pub zone: String,
}

impl Default for CompassData {
    fn default() -> Self {
        Self {
            direction: "N".to_string(),
            roads: String::new(),
            zone: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsDistance {
    pub distance: f64,
    pub unit: String,
    pub has_waypoint: bool,
    pub has_armor: bool,
}

impl Default for GpsDistance {
    fn default() -> Self {
        Self {
            distance: 0.0,
            unit: "mi".to_string(),
            has_waypoint: false,
            has_armor: false,
        }
    }
}

/// Widget toggles sent with `hudInitialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HudSettings {
    pub show_health: bool,
    pub show_armor: bool,
    pub show_hunger: bool,
    pub show_thirst: bool,
    pub show_stress: bool,
    pub show_oxygen: bool,
    pub show_voice: bool,
    pub show_speed: bool,
    pub show_fuel: bool,
    pub show_engine: bool,
    pub show_seatbelt: bool,
    pub show_cruise: bool,
    pub animate_status_bars: bool,
}

impl Default for HudSettings {
    fn default() -> Self {
        Self {
            show_health: true,
            show_armor: true,
            show_hunger: true,
            show_thirst: true,
            show_stress: true,
            show_oxygen: true,
            show_voice: true,
            show_speed: true,
            show_fuel: true,
            show_engine: true,
            show_seatbelt: true,
            show_cruise: true,
            animate_status_bars: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HudConfig {
    pub disable_stress: bool,
    pub disable_stamina: bool,
    pub disable_oxygen: bool,
    pub hud_settings: HudSettings,
}

/// Voice proximity as sent in `PlayerData::voice`. Level 0 is the
/// quietest setting and shares the whisper range with level 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceRange {
    Whisper,
    Normal,
    Shout,
}

impl VoiceRange {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => VoiceRange::Whisper,
            2 => VoiceRange::Normal,
            _ => VoiceRange::Shout,
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HudSnapshot {
    pub visible: bool,
    pub config: HudConfig,
    pub stats: PlayerStats,
    pub player: PlayerData,
    pub vehicle: VehicleData,
    pub account: AccountData,
    pub compass: CompassData,
    pub gps: GpsDistance,
    pub effects: EffectProjection,
    pub stress_bar_visible: bool,
    pub speedometer: SpeedometerPhase,
    pub theme_dashboard_open: bool,
    pub theme: ThemeColorMap,
    /// Which layer each slot's color comes from.
    pub theme_sources: BTreeMap<ThemeSlot, ThemeSource>,
}
