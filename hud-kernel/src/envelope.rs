/**
 * ENVELOPE DECODER - Unwraps `{action, data}` messages from the host channel
 *
 * ROLE:
 * Turns each raw envelope into a typed `Command` the engine understands.
 * The set of actions is closed: anything else decodes to `None` and is
 * dropped without error.
 *
 * HOW IT WORKS:
 * - `Payload` is a read-only typed view over a JSON object; every getter
 *   returns `None` on a missing OR mis-typed key, never an error
 * - object-shaped actions with a non-object `data` decode to `None`
 * - per-slice narrowing is delegated to the reducer builders so absent keys
 *   land on the documented defaults
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{CompassData, GpsDistance, HudConfig, PlayerData, VehicleData};
use crate::reducer::{StatField, StatsPatch, WholesaleReplace, PLAYER_HUD_FIELDS, VEHICLE_HUD_FIELDS};
use crate::theme::{RawColors, StylePriority};

/// Every action the overlay reacts to.
pub const KNOWN_ACTIONS: &[&str] = &[
    "setVisible",
    "hudInitialize",
    "updatePlayerHud",
    "updateVehicleHud",
    "showAccount",
    "seatbeltToggle",
    "cruiseToggle",
    "loadThemeColors",
    "forceApplyThemeColors",
    "forceThemeColorsByDOM",
    "forceHudRefresh",
    "refreshAllComponents",
    "updateCompass",
    "updateGPSDistance",
    "toggleThemeDashboard",
];

/// Wire unit exchanged between host and overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self { action: action.into(), data }
    }
}

/// Typed view over an object payload. Mis-typed keys read as absent.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a>(&'a Map<String, Value>);

impl<'a> Payload<'a> {
    pub fn of(value: &'a Value) -> Option<Self> {
        value.as_object().map(Payload)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key)?.as_f64().filter(|n| n.is_finite())
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.number(key).map(|n| n.trunc() as i64)
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key)?.as_bool()
    }

    pub fn string(&self, key: &str) -> Option<&'a str> {
        self.0.get(key)?.as_str()
    }

    pub fn object(&self, key: &str) -> Option<Payload<'a>> {
        self.0.get(key).and_then(Payload::of)
    }

    pub fn colors(&self) -> RawColors {
        self.0.clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHudUpdate {
    pub player: PlayerData,
    pub stats: StatsPatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleHudUpdate {
    pub vehicle: VehicleData,
    pub stats: StatsPatch,
    /// `show` was present in the payload (even if false).
    pub show_present: bool,
}

/// Decoded, well-formed instruction for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetVisible(bool),
    HudInitialize { config: Option<HudConfig> },
    UpdatePlayerHud(PlayerHudUpdate),
    UpdateVehicleHud(VehicleHudUpdate),
    ShowAccount { kind: String, amount: f64 },
    SeatbeltToggle { enabled: bool },
    CruiseToggle { enabled: bool },
    LoadThemeColors(RawColors),
    ForceApplyThemeColors {
        colors: RawColors,
        override_css: bool,
        priority: StylePriority,
    },
    ForceThemeColorsByDom(RawColors),
    ForceHudRefresh,
    RefreshAllComponents,
    UpdateCompass(CompassData),
    UpdateGpsDistance(GpsDistance),
    ToggleThemeDashboard,
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::SetVisible(_) => "setVisible",
            Command::HudInitialize { .. } => "hudInitialize",
            Command::UpdatePlayerHud(_) => "updatePlayerHud",
            Command::UpdateVehicleHud(_) => "updateVehicleHud",
            Command::ShowAccount { .. } => "showAccount",
            Command::SeatbeltToggle { .. } => "seatbeltToggle",
            Command::CruiseToggle { .. } => "cruiseToggle",
            Command::LoadThemeColors(_) => "loadThemeColors",
            Command::ForceApplyThemeColors { .. } => "forceApplyThemeColors",
            Command::ForceThemeColorsByDom(_) => "forceThemeColorsByDOM",
            Command::ForceHudRefresh => "forceHudRefresh",
            Command::RefreshAllComponents => "refreshAllComponents",
            Command::UpdateCompass(_) => "updateCompass",
            Command::UpdateGpsDistance(_) => "updateGPSDistance",
            Command::ToggleThemeDashboard => "toggleThemeDashboard",
        }
    }
}

/// Decodes one envelope. Total: unknown or unusable input yields `None`.
pub fn decode(envelope: &Envelope) -> Option<Command> {
    let data = &envelope.data;
    let command = match envelope.action.as_str() {
        "setVisible" => Command::SetVisible(data.as_bool().unwrap_or(false)),
        "hudInitialize" => Command::HudInitialize {
            config: Payload::of(data)
                .and_then(|p| p.object("config"))
                .map(|cfg| HudConfig::rebuild(&cfg)),
        },
        "updatePlayerHud" => {
            let p = Payload::of(data)?;
            Command::UpdatePlayerHud(PlayerHudUpdate {
                player: PlayerData::rebuild(&p),
                stats: StatsPatch::from_payload(&p, PLAYER_HUD_FIELDS),
            })
        }
        "updateVehicleHud" => {
            let p = Payload::of(data)?;
            Command::UpdateVehicleHud(VehicleHudUpdate {
                vehicle: VehicleData::rebuild(&p),
                stats: StatsPatch::from_payload(&p, VEHICLE_HUD_FIELDS),
                show_present: p.contains("show"),
            })
        }
        "showAccount" => {
            let p = Payload::of(data)?;
            Command::ShowAccount {
                kind: p.string("type").unwrap_or_default().to_string(),
                amount: p.number("amount").unwrap_or(0.0),
            }
        }
        "seatbeltToggle" => {
            let p = Payload::of(data)?;
            Command::SeatbeltToggle { enabled: p.boolean("enabled").unwrap_or(false) }
        }
        "cruiseToggle" => {
            let p = Payload::of(data)?;
            Command::CruiseToggle { enabled: p.boolean("enabled").unwrap_or(false) }
        }
        "loadThemeColors" => Command::LoadThemeColors(Payload::of(data)?.colors()),
        "forceApplyThemeColors" => {
            let p = Payload::of(data)?;
            let colors = p.object("colors")?.colors();
            Command::ForceApplyThemeColors {
                colors,
                override_css: p.boolean("overrideCSS").unwrap_or(false),
                priority: StylePriority::parse(p.string("priority")),
            }
        }
        "forceThemeColorsByDOM" => Command::ForceThemeColorsByDom(Payload::of(data)?.colors()),
        "forceHudRefresh" => Command::ForceHudRefresh,
        "refreshAllComponents" => Command::RefreshAllComponents,
        "updateCompass" => Command::UpdateCompass(CompassData::rebuild(&Payload::of(data)?)),
        "updateGPSDistance" => Command::UpdateGpsDistance(GpsDistance::rebuild(&Payload::of(data)?)),
        "toggleThemeDashboard" => Command::ToggleThemeDashboard,
        other => {
            debug!("[envelope] ignoring unknown action {other:?}");
            return None;
        }
    };
    Some(command)
}

/// Decodes a raw transport payload (MQTT body, HTTP body).
pub fn decode_bytes(payload: &[u8]) -> Option<Command> {
    match serde_json::from_slice::<Envelope>(payload) {
        Ok(envelope) => decode(&envelope),
        Err(e) => {
            debug!("[envelope] dropping malformed envelope: {e}");
            None
        }
    }
}

/// Stat keys this command may write, for diagnostics.
pub fn owned_fields(command: &Command) -> &'static [StatField] {
    match command {
        Command::UpdatePlayerHud(_) => PLAYER_HUD_FIELDS,
        Command::UpdateVehicleHud(_) => VEHICLE_HUD_FIELDS,
        _ => &[],
    }
}
