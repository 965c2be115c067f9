/**
 * PARTIAL-UPDATE REDUCER - The two update disciplines of the HUD slices
 *
 * ROLE:
 * Every slice declares exactly one discipline and is only ever updated
 * through it:
 * - FieldMerge (PlayerStats): a key is written only when the payload carries
 *   a finite number for it; everything else keeps its previous value.
 *   Several host messages each own a disjoint subset of the fields.
 * - WholesaleReplace (PlayerData, VehicleData, compass, GPS, config): the
 *   slice is rebuilt from the payload, absent keys take their defaults and
 *   never the previous frame's value.
 */

use crate::envelope::Payload;
use crate::models::{
    CompassData, GpsDistance, HudConfig, HudSettings, PlayerData, PlayerStats, VehicleData,
};

/// Numeric keys of `PlayerStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Health,
    MaxHealth,
    Armor,
    MaxArmor,
    Hunger,
    Thirst,
    Stress,
    Oxygen,
    Stamina,
    Speed,
    Fuel,
    Engine,
    Rpm,
}

impl StatField {
    pub fn key(self) -> &'static str {
        match self {
            StatField::Health => "health",
            StatField::MaxHealth => "maxHealth",
            StatField::Armor => "armor",
            StatField::MaxArmor => "maxArmor",
            StatField::Hunger => "hunger",
            StatField::Thirst => "thirst",
            StatField::Stress => "stress",
            StatField::Oxygen => "oxygen",
            StatField::Stamina => "stamina",
            StatField::Speed => "speed",
            StatField::Fuel => "fuel",
            StatField::Engine => "engine",
            StatField::Rpm => "rpm",
        }
    }

    fn slot(self, stats: &mut PlayerStats) -> &mut f64 {
        match self {
            StatField::Health => &mut stats.health,
            StatField::MaxHealth => &mut stats.max_health,
            StatField::Armor => &mut stats.armor,
            StatField::MaxArmor => &mut stats.max_armor,
            StatField::Hunger => &mut stats.hunger,
            StatField::Thirst => &mut stats.thirst,
            StatField::Stress => &mut stats.stress,
            StatField::Oxygen => &mut stats.oxygen,
            StatField::Stamina => &mut stats.stamina,
            StatField::Speed => &mut stats.speed,
            StatField::Fuel => &mut stats.fuel,
            StatField::Engine => &mut stats.engine,
            StatField::Rpm => &mut stats.rpm,
        }
    }

    fn is_max(self) -> bool {
        matches!(self, StatField::MaxHealth | StatField::MaxArmor)
    }
}

/// Fields owned by `updatePlayerHud`.
pub const PLAYER_HUD_FIELDS: &[StatField] = &[
    StatField::MaxHealth,
    StatField::MaxArmor,
    StatField::Health,
    StatField::Armor,
    StatField::Hunger,
    StatField::Thirst,
    StatField::Stress,
    StatField::Oxygen,
    StatField::Stamina,
];

/// Fields owned by `updateVehicleHud`.
pub const VEHICLE_HUD_FIELDS: &[StatField] = &[
    StatField::Speed,
    StatField::Fuel,
    StatField::Engine,
    StatField::Rpm,
];

/// Typed numbers a message supplied, in ownership order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsPatch {
    entries: Vec<(StatField, f64)>,
}

impl StatsPatch {
    pub fn from_payload(payload: &Payload<'_>, owned: &[StatField]) -> Self {
        let entries = owned
            .iter()
            .filter_map(|&field| payload.number(field.key()).map(|v| (field, v)))
            .collect();
        Self { entries }
    }

    pub fn with(mut self, field: StatField, value: f64) -> Self {
        self.entries.retain(|(f, _)| *f != field);
        self.entries.push((field, value));
        self
    }

    pub fn get(&self, field: StatField) -> Option<f64> {
        self.entries.iter().find(|(f, _)| *f == field).map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Field-merge strategy for `PlayerStats`.
pub struct FieldMerge;

impl FieldMerge {
    /// Writes every patched field not listed in `skip`, then re-clamps.
    pub fn apply(stats: &mut PlayerStats, patch: &StatsPatch, skip: &[StatField]) {
        // Maxima first so the value clamps below see the new ceiling.
        let (maxima, values): (Vec<_>, Vec<_>) = patch
            .entries
            .iter()
            .filter(|(f, _)| !skip.contains(f))
            .partition(|(f, _)| f.is_max());

        for (field, value) in maxima {
            if value > 0.0 {
                *field.slot(stats) = value;
            }
        }
        for (field, value) in values {
            *field.slot(stats) = value;
        }
        clamp_stats(stats);
    }

    pub fn set_seatbelt(stats: &mut PlayerStats, enabled: bool) {
        stats.seatbelt = enabled;
    }
}

/// Brings every field back into its documented range.
pub fn clamp_stats(stats: &mut PlayerStats) {
    stats.health = stats.health.clamp(0.0, stats.max_health);
    stats.armor = stats.armor.clamp(0.0, stats.max_armor);
    stats.speed = stats.speed.max(0.0);
    stats.rpm = stats.rpm.clamp(0.0, 1.0);
    for v in [
        &mut stats.hunger,
        &mut stats.thirst,
        &mut stats.stress,
        &mut stats.oxygen,
        &mut stats.stamina,
        &mut stats.fuel,
        &mut stats.engine,
    ] {
        *v = v.clamp(0.0, 100.0);
    }
}

/// Wholesale-replace strategy: rebuild the whole slice from one payload.
pub trait WholesaleReplace: Sized + Default {
    fn rebuild(payload: &Payload<'_>) -> Self;
}

impl WholesaleReplace for PlayerData {
    fn rebuild(p: &Payload<'_>) -> Self {
        let d = PlayerData::default();
        PlayerData {
            show: p.boolean("show").unwrap_or(d.show),
            talking: p.boolean("talking").unwrap_or(d.talking),
            talking_on_radio: p.boolean("talkingOnRadio").unwrap_or(d.talking_on_radio),
            on_phone: p.boolean("onPhone").unwrap_or(d.on_phone),
            armed: p.boolean("armed").unwrap_or(d.armed),
            parachute: p.integer("parachute").unwrap_or(d.parachute),
            player_dead: p.boolean("playerDead").unwrap_or(d.player_dead),
            voice: p.integer("voice").map(|v| v.clamp(0, 3) as u8).unwrap_or(d.voice),
            current_ammo: p.integer("currentAmmo").map(non_negative).unwrap_or(d.current_ammo),
            reserve_ammo: p.integer("reserveAmmo").map(non_negative).unwrap_or(d.reserve_ammo),
            in_last_stand: p.boolean("inLastStand").unwrap_or(d.in_last_stand),
            has_radio: p.boolean("hasRadio").unwrap_or(d.has_radio),
        }
    }
}

impl WholesaleReplace for VehicleData {
    fn rebuild(p: &Payload<'_>) -> Self {
        let d = VehicleData::default();
        VehicleData {
            show: p.boolean("show").unwrap_or(d.show),
            seatbelt: p.boolean("seatbelt").unwrap_or(d.seatbelt),
            cruise: p.boolean("cruise").unwrap_or(d.cruise),
            nos: p.number("nos").map(percent).unwrap_or(d.nos),
            gear: p.integer("gear").unwrap_or(d.gear),
            gear_progress: p.number("gearProgress").map(percent).unwrap_or(d.gear_progress),
            speed_unit: p
                .string("speedUnit")
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(d.speed_unit),
        }
    }
}

impl WholesaleReplace for CompassData {
    fn rebuild(p: &Payload<'_>) -> Self {
        let d = CompassData::default();
        CompassData {
            direction: p.string("direction").map(str::to_string).unwrap_or(d.direction),
            roads: p.string("roads").map(str::to_string).unwrap_or(d.roads),
            zone: p.string("zone").map(str::to_string).unwrap_or(d.zone),
        }
    }
}

impl WholesaleReplace for GpsDistance {
    fn rebuild(p: &Payload<'_>) -> Self {
        let d = GpsDistance::default();
        GpsDistance {
            distance: p.number("distance").map(|n| n.max(0.0)).unwrap_or(d.distance),
            unit: p.string("unit").map(str::to_string).unwrap_or(d.unit),
            has_waypoint: p.boolean("hasWaypoint").unwrap_or(d.has_waypoint),
            has_armor: p.boolean("hasArmor").unwrap_or(d.has_armor),
        }
    }
}

impl WholesaleReplace for HudSettings {
    fn rebuild(p: &Payload<'_>) -> Self {
        let d = HudSettings::default();
        let flag = |key: &str, default: bool| p.boolean(key).unwrap_or(default);
        HudSettings {
            show_health: flag("showHealth", d.show_health),
            show_armor: flag("showArmor", d.show_armor),
            show_hunger: flag("showHunger", d.show_hunger),
            show_thirst: flag("showThirst", d.show_thirst),
            show_stress: flag("showStress", d.show_stress),
            show_oxygen: flag("showOxygen", d.show_oxygen),
            show_voice: flag("showVoice", d.show_voice),
            show_speed: flag("showSpeed", d.show_speed),
            show_fuel: flag("showFuel", d.show_fuel),
            show_engine: flag("showEngine", d.show_engine),
            show_seatbelt: flag("showSeatbelt", d.show_seatbelt),
            show_cruise: flag("showCruise", d.show_cruise),
            animate_status_bars: flag("animateStatusBars", d.animate_status_bars),
        }
    }
}

impl WholesaleReplace for HudConfig {
    fn rebuild(p: &Payload<'_>) -> Self {
        HudConfig {
            disable_stress: p.boolean("disableStress").unwrap_or(false),
            disable_stamina: p.boolean("disableStamina").unwrap_or(false),
            disable_oxygen: p.boolean("disableOxygen").unwrap_or(false),
            hud_settings: p
                .object("hudSettings")
                .map(|s| HudSettings::rebuild(&s))
                .unwrap_or_default(),
        }
    }
}

fn non_negative(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

fn percent(v: f64) -> f64 {
    v.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn patch(value: Value, owned: &[StatField]) -> StatsPatch {
        StatsPatch::from_payload(&Payload::of(&value).unwrap(), owned)
    }

    fn rebuild<T: WholesaleReplace>(value: Value) -> T {
        T::rebuild(&Payload::of(&value).unwrap())
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum UpdateDiscipline {
        FieldMerge,
        WholesaleReplace,
    }

    /// A canonical state slice and the discipline it is updated with.
    trait Slice {
        const DISCIPLINE: UpdateDiscipline;
    }

    impl Slice for PlayerStats {
        const DISCIPLINE: UpdateDiscipline = UpdateDiscipline::FieldMerge;
    }
    impl Slice for PlayerData {
        const DISCIPLINE: UpdateDiscipline = UpdateDiscipline::WholesaleReplace;
    }
    impl Slice for VehicleData {
        const DISCIPLINE: UpdateDiscipline = UpdateDiscipline::WholesaleReplace;
    }
    impl Slice for CompassData {
        const DISCIPLINE: UpdateDiscipline = UpdateDiscipline::WholesaleReplace;
    }
    impl Slice for GpsDistance {
        const DISCIPLINE: UpdateDiscipline = UpdateDiscipline::WholesaleReplace;
    }

    #[test]
    fn each_slice_declares_its_discipline() {
        assert_eq!(PlayerStats::DISCIPLINE, UpdateDiscipline::FieldMerge);
        assert_eq!(PlayerData::DISCIPLINE, UpdateDiscipline::WholesaleReplace);
        assert_eq!(VehicleData::DISCIPLINE, UpdateDiscipline::WholesaleReplace);
        assert_eq!(CompassData::DISCIPLINE, UpdateDiscipline::WholesaleReplace);
        assert_eq!(GpsDistance::DISCIPLINE, UpdateDiscipline::WholesaleReplace);
    }

    #[test]
    fn merge_keeps_absent_and_mistyped_fields() {
        let mut stats = PlayerStats { hunger: 40.0, thirst: 30.0, ..Default::default() };
        let p = patch(json!({ "hunger": 55, "thirst": "dry", "health": null }), PLAYER_HUD_FIELDS);
        FieldMerge::apply(&mut stats, &p, &[]);
        assert_eq!(stats.hunger, 55.0);
        assert_eq!(stats.thirst, 30.0);
        assert_eq!(stats.health, 100.0);
    }

    #[test]
    fn merge_ignores_fields_owned_by_other_messages() {
        let mut stats = PlayerStats::default();
        let p = patch(json!({ "speed": 80, "health": 20 }), VEHICLE_HUD_FIELDS);
        FieldMerge::apply(&mut stats, &p, &[]);
        assert_eq!(stats.speed, 80.0);
        assert_eq!(stats.health, 100.0);
    }

    #[test]
    fn merge_honours_skip_list() {
        let mut stats = PlayerStats::default();
        let p = patch(json!({ "speed": 80, "rpm": 0.5, "fuel": 12 }), VEHICLE_HUD_FIELDS);
        FieldMerge::apply(&mut stats, &p, &[StatField::Speed, StatField::Rpm]);
        assert_eq!(stats.speed, 0.0);
        assert_eq!(stats.rpm, 0.0);
        assert_eq!(stats.fuel, 12.0);
    }

    #[test]
    fn values_are_clamped_against_new_maxima() {
        let mut stats = PlayerStats::default();
        let p = patch(json!({ "maxHealth": 200, "health": 250, "armor": -5, "stress": 140 }), PLAYER_HUD_FIELDS);
        FieldMerge::apply(&mut stats, &p, &[]);
        assert_eq!(stats.max_health, 200.0);
        assert_eq!(stats.health, 200.0);
        assert_eq!(stats.armor, 0.0);
        assert_eq!(stats.stress, 100.0);

        let shrink = patch(json!({ "maxHealth": 50 }), PLAYER_HUD_FIELDS);
        FieldMerge::apply(&mut stats, &shrink, &[]);
        assert_eq!(stats.health, 50.0);
    }

    #[test]
    fn non_positive_maxima_are_rejected() {
        let mut stats = PlayerStats::default();
        FieldMerge::apply(&mut stats, &patch(json!({ "maxArmor": 0 }), PLAYER_HUD_FIELDS), &[]);
        assert_eq!(stats.max_armor, 100.0);
    }

    #[test]
    fn player_data_rebuild_defaults_absent_flags() {
        let data: PlayerData = rebuild(json!({ "armed": true, "currentAmmo": -3, "voice": 0 }));
        assert!(data.armed);
        assert!(!data.talking);
        assert_eq!(data.current_ammo, 0);
        assert_eq!(data.voice, 0);
        assert_eq!(data.parachute, -1);
    }

    #[test]
    fn vehicle_rebuild_clamps_and_defaults_unit() {
        let data: VehicleData = rebuild(json!({ "nos": 180, "gearProgress": 45.5, "gear": 3, "speedUnit": "" }));
        assert_eq!(data.nos, 100.0);
        assert_eq!(data.gear_progress, 45.5);
        assert_eq!(data.gear, 3);
        assert_eq!(data.speed_unit, "MPH");
    }

    #[test]
    fn config_rebuild_tolerates_mistyped_flags() {
        let cfg: HudConfig = rebuild(json!({ "disableOxygen": "yes", "hudSettings": { "showVoice": false, "showFuel": 0 } }));
        assert!(!cfg.disable_oxygen);
        assert!(!cfg.hud_settings.show_voice);
        assert!(cfg.hud_settings.show_fuel);
    }
}
