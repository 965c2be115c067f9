/*!
Envelope builders

Produces the `{action, data}` messages the host pushes, as JSON values or
bytes, so tests and tools don't hand-write payloads.
*/

use anyhow::{anyhow, Result};
use hud_kernel::envelope::{decode, Command, Envelope};
use serde_json::{json, Value};

pub struct HudMessageBuilder;

impl HudMessageBuilder {
    pub fn envelope(action: &str, data: Value) -> Value {
        json!({ "action": action, "data": data })
    }

    pub fn bytes(action: &str, data: Value) -> Vec<u8> {
        Self::envelope(action, data).to_string().into_bytes()
    }

    /// Decoded form, failing for actions the kernel does not know.
    pub fn command(action: &str, data: Value) -> Result<Command> {
        decode(&Envelope::new(action, data)).ok_or_else(|| anyhow!("unknown action: {action}"))
    }

    pub fn set_visible(visible: bool) -> Value {
        Self::envelope("setVisible", json!(visible))
    }

    pub fn hud_initialize(config: Option<Value>) -> Value {
        match config {
            Some(config) => Self::envelope("hudInitialize", json!({ "config": config })),
            None => Self::envelope("hudInitialize", json!({})),
        }
    }

    pub fn player_hud(fields: Value) -> Value {
        Self::envelope("updatePlayerHud", fields)
    }

    pub fn vehicle_hud(fields: Value) -> Value {
        Self::envelope("updateVehicleHud", fields)
    }

    pub fn show_account(kind: &str, amount: f64) -> Value {
        Self::envelope("showAccount", json!({ "type": kind, "amount": amount }))
    }

    pub fn seatbelt(enabled: bool) -> Value {
        Self::envelope("seatbeltToggle", json!({ "enabled": enabled }))
    }

    pub fn cruise(enabled: bool) -> Value {
        Self::envelope("cruiseToggle", json!({ "enabled": enabled }))
    }

    pub fn compass(direction: &str, roads: &str, zone: &str) -> Value {
        Self::envelope(
            "updateCompass",
            json!({ "direction": direction, "roads": roads, "zone": zone }),
        )
    }

    pub fn load_theme_colors(colors: Value) -> Value {
        Self::envelope("loadThemeColors", colors)
    }

    pub fn force_theme_colors(colors: Value, priority: &str) -> Value {
        Self::envelope(
            "forceApplyThemeColors",
            json!({ "colors": colors, "overrideCSS": true, "priority": priority }),
        )
    }

    pub fn toggle_theme_dashboard() -> Value {
        Self::envelope("toggleThemeDashboard", Value::Null)
    }

    pub fn refresh_all_components() -> Value {
        Self::envelope("refreshAllComponents", Value::Null)
    }
}
