/**
 * THEME OVERRIDE STORE - Semantic color slots and their sources of truth
 *
 * ROLE:
 * Owns the single authoritative slot -> color map and decides, for every
 * slot, which source currently wins. Nothing else writes theme colors.
 *
 * HOW IT WORKS:
 * - four layers, highest first: forced override, remote-loaded, legacy
 *   fallback, built-in default
 * - a write to a layer never touches the other layers, so a late legacy
 *   fallback can only fill slots nobody else holds, and a late remote load
 *   still wins over an earlier fallback
 * - every color is checked against `#RRGGBB` one slot at a time; a bad slot
 *   is dropped and the others are kept
 * - the store only returns `StyleCommand`s; applying them is the job of a
 *   `StylePort` (see style.rs)
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Untrusted `slot -> color` object straight from a payload.
pub type RawColors = Map<String, Value>;

/// Explicit values held by one layer.
pub type SlotMap = BTreeMap<ThemeSlot, String>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ThemeError {
    #[error("unknown theme slot: {0}")]
    UnknownSlot(String),
    #[error("invalid color value: {0}")]
    InvalidColor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSlot {
    Health,
    Armor,
    Hunger,
    Thirst,
    Stamina,
    Oxygen,
    Ammo,
    Stress,
}

impl ThemeSlot {
    pub const ALL: [ThemeSlot; 8] = [
        ThemeSlot::Health,
        ThemeSlot::Armor,
        ThemeSlot::Hunger,
        ThemeSlot::Thirst,
        ThemeSlot::Stamina,
        ThemeSlot::Oxygen,
        ThemeSlot::Ammo,
        ThemeSlot::Stress,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ThemeSlot::Health => "health",
            ThemeSlot::Armor => "armor",
            ThemeSlot::Hunger => "hunger",
            ThemeSlot::Thirst => "thirst",
            ThemeSlot::Stamina => "stamina",
            ThemeSlot::Oxygen => "oxygen",
            ThemeSlot::Ammo => "ammo",
            ThemeSlot::Stress => "stress",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }

    /// Custom property the renderer reads, e.g. `--hud-health-color`.
    pub fn css_property(self) -> String {
        format!("--hud-{}-color", self.name())
    }

    pub fn default_color(self) -> &'static str {
        match self {
            ThemeSlot::Health => "#25d489",
            ThemeSlot::Armor => "#7ec8f7",
            ThemeSlot::Hunger => "#f59e0b",
            ThemeSlot::Thirst => "#06b6d4",
            ThemeSlot::Stamina => "#10b981",
            ThemeSlot::Oxygen => "#8b5cf6",
            ThemeSlot::Ammo => "#f97316",
            ThemeSlot::Stress => "#8b5cf6",
        }
    }
}

/// Strict `#RRGGBB` check.
pub fn is_valid_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Keeps the well-formed slots of a raw map, logs the rest.
pub fn validate_colors(raw: &RawColors) -> SlotMap {
    let mut valid = SlotMap::new();
    for (key, value) in raw {
        let Some(slot) = ThemeSlot::parse(key) else {
            debug!("[theme] ignoring unknown slot {key:?}");
            continue;
        };
        match value.as_str() {
            Some(color) if is_valid_color(color) => {
                valid.insert(slot, color.to_string());
            }
            _ => warn!("[theme] dropping invalid color for {key}: {value}"),
        }
    }
    valid
}

/// Full 8-slot theme, the shape persisted in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColorMap {
    pub health: String,
    pub armor: String,
    pub hunger: String,
    pub thirst: String,
    pub stamina: String,
    pub oxygen: String,
    pub ammo: String,
    pub stress: String,
}

impl Default for ThemeColorMap {
    fn default() -> Self {
        let mut map = Self {
            health: String::new(),
            armor: String::new(),
            hunger: String::new(),
            thirst: String::new(),
            stamina: String::new(),
            oxygen: String::new(),
            ammo: String::new(),
            stress: String::new(),
        };
        for slot in ThemeSlot::ALL {
            map.set(slot, slot.default_color().to_string());
        }
        map
    }
}

impl ThemeColorMap {
    pub fn get(&self, slot: ThemeSlot) -> &str {
        match slot {
            ThemeSlot::Health => &self.health,
            ThemeSlot::Armor => &self.armor,
            ThemeSlot::Hunger => &self.hunger,
            ThemeSlot::Thirst => &self.thirst,
            ThemeSlot::Stamina => &self.stamina,
            ThemeSlot::Oxygen => &self.oxygen,
            ThemeSlot::Ammo => &self.ammo,
            ThemeSlot::Stress => &self.stress,
        }
    }

    pub fn set(&mut self, slot: ThemeSlot, color: String) {
        let field = match slot {
            ThemeSlot::Health => &mut self.health,
            ThemeSlot::Armor => &mut self.armor,
            ThemeSlot::Hunger => &mut self.hunger,
            ThemeSlot::Thirst => &mut self.thirst,
            ThemeSlot::Stamina => &mut self.stamina,
            ThemeSlot::Oxygen => &mut self.oxygen,
            ThemeSlot::Ammo => &mut self.ammo,
            ThemeSlot::Stress => &mut self.stress,
        };
        *field = color;
    }

    /// Defaults overlaid with the given explicit values.
    pub fn from_slots(slots: &SlotMap) -> Self {
        let mut map = Self::default();
        for (slot, color) in slots {
            map.set(*slot, color.clone());
        }
        map
    }

    pub fn to_slots(&self) -> SlotMap {
        ThemeSlot::ALL
            .into_iter()
            .map(|slot| (slot, self.get(slot).to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePriority {
    Normal,
    Important,
}

impl StylePriority {
    /// Host `priority` string; absent means `important`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("important") => StylePriority::Important,
            Some(_) => StylePriority::Normal,
        }
    }
}

/// Instruction for the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleCommand {
    Set {
        slot: ThemeSlot,
        color: String,
        priority: StylePriority,
    },
    Remove {
        slot: ThemeSlot,
    },
}

/// Which layer currently provides a slot's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSource {
    Forced,
    Remote,
    Fallback,
    Default,
}

/// Result of a dashboard save: what to persist and what to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub colors: ThemeColorMap,
    pub commands: Vec<StyleCommand>,
}

#[derive(Debug, Default)]
pub struct ThemeStore {
    forced: SlotMap,
    remote: SlotMap,
    fallback: SlotMap,
    draft: Option<ThemeColorMap>,
    /// Slots the user changed in the open draft.
    draft_edits: BTreeSet<ThemeSlot>,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_of(&self, slot: ThemeSlot) -> ThemeSource {
        if self.forced.contains_key(&slot) {
            ThemeSource::Forced
        } else if self.remote.contains_key(&slot) {
            ThemeSource::Remote
        } else if self.fallback.contains_key(&slot) {
            ThemeSource::Fallback
        } else {
            ThemeSource::Default
        }
    }

    /// Winning layer of every slot.
    pub fn sources(&self) -> BTreeMap<ThemeSlot, ThemeSource> {
        ThemeSlot::ALL.into_iter().map(|slot| (slot, self.source_of(slot))).collect()
    }

    fn resolve(&self, slot: ThemeSlot) -> Option<&String> {
        self.forced
            .get(&slot)
            .or_else(|| self.remote.get(&slot))
            .or_else(|| self.fallback.get(&slot))
    }

    /// Slots that hold an explicit (non-default) value, resolved by precedence.
    pub fn held(&self) -> SlotMap {
        ThemeSlot::ALL
            .into_iter()
            .filter_map(|slot| self.resolve(slot).map(|c| (slot, c.clone())))
            .collect()
    }

    pub fn effective(&self) -> ThemeColorMap {
        ThemeColorMap::from_slots(&self.held())
    }

    fn set_effective(&self, slots: impl IntoIterator<Item = ThemeSlot>, priority: StylePriority) -> Vec<StyleCommand> {
        let effective = self.effective();
        slots
            .into_iter()
            .map(|slot| StyleCommand::Set {
                slot,
                color: effective.get(slot).to_string(),
                priority,
            })
            .collect()
    }

    /// `loadThemeColors`: host-pushed values from the remote store.
    pub fn load_from_message(&mut self, raw: &RawColors) -> Vec<StyleCommand> {
        let valid = validate_colors(raw);
        let touched: Vec<_> = valid.keys().copied().collect();
        self.remote.extend(valid);
        self.set_effective(touched, StylePriority::Important)
    }

    /// `forceApplyThemeColors`: explicit override, highest precedence.
    pub fn force_apply(&mut self, raw: &RawColors, override_css: bool, priority: StylePriority) -> Vec<StyleCommand> {
        let valid = validate_colors(raw);
        let mut commands = Vec::new();
        if override_css {
            commands.extend(valid.keys().map(|&slot| StyleCommand::Remove { slot }));
        }
        commands.extend(valid.iter().map(|(&slot, color)| StyleCommand::Set {
            slot,
            color: color.clone(),
            priority,
        }));
        self.forced.extend(valid);
        commands
    }

    /// `forceThemeColorsByDOM`: clear the properties, then re-set them.
    pub fn force_by_dom(&mut self, raw: &RawColors) -> Vec<StyleCommand> {
        self.force_apply(raw, true, StylePriority::Important)
    }

    /// Legacy local fallback: fills only slots no other layer holds.
    pub fn apply_legacy_fallback(&mut self, raw: &RawColors) -> Vec<StyleCommand> {
        let valid = validate_colors(raw);
        let mut filled = Vec::new();
        for (slot, color) in valid {
            if self.resolve(slot).is_none() {
                filled.push(slot);
            }
            self.fallback.entry(slot).or_insert(color);
        }
        self.set_effective(filled, StylePriority::Normal)
    }

    /// Dashboard activation read. Failures and empty reads keep the current state.
    pub fn apply_remote_fetch(&mut self, result: Result<Value, String>) -> Vec<StyleCommand> {
        let commands = match result {
            Ok(Value::Object(raw)) if !raw.is_empty() => {
                let valid = validate_colors(&raw);
                if valid.is_empty() {
                    warn!("[theme] remote theme had no valid colors, keeping current theme");
                    Vec::new()
                } else {
                    self.remote = ThemeColorMap::from_slots(&valid).to_slots();
                    self.set_effective(ThemeSlot::ALL, StylePriority::Normal)
                }
            }
            Ok(_) => {
                debug!("[theme] remote store returned no theme");
                Vec::new()
            }
            Err(e) => {
                warn!("[theme] failed to load remote theme: {e}");
                Vec::new()
            }
        };
        self.rebase_draft();
        commands
    }

    /// Fresh draft from the effective colors, keeping the user's edits.
    fn rebase_draft(&mut self) {
        let mut draft = self.effective();
        if let Some(previous) = &self.draft {
            for &slot in &self.draft_edits {
                draft.set(slot, previous.get(slot).to_string());
            }
        }
        self.draft = Some(draft);
    }

    /// Re-applies every explicitly held slot after a re-render.
    pub fn reassert(&self) -> Vec<StyleCommand> {
        self.held()
            .into_iter()
            .map(|(slot, color)| StyleCommand::Set {
                slot,
                color,
                priority: StylePriority::Important,
            })
            .collect()
    }

    pub fn open_draft(&mut self) {
        self.draft = Some(self.effective());
        self.draft_edits.clear();
    }

    pub fn close_draft(&mut self) {
        self.draft = None;
        self.draft_edits.clear();
    }

    pub fn draft(&self) -> Option<&ThemeColorMap> {
        self.draft.as_ref()
    }

    /// Edits the dashboard copy only; nothing is applied until save.
    pub fn set_draft_color(&mut self, slot: &str, color: &str) -> Result<(), ThemeError> {
        let slot = ThemeSlot::parse(slot).ok_or_else(|| ThemeError::UnknownSlot(slot.to_string()))?;
        if !is_valid_color(color) {
            return Err(ThemeError::InvalidColor(color.to_string()));
        }
        let effective = self.effective();
        self.draft.get_or_insert(effective).set(slot, color.to_string());
        self.draft_edits.insert(slot);
        Ok(())
    }

    /// Commits the draft as the new remote truth and applies it at top priority.
    pub fn save(&mut self) -> SaveOutcome {
        let colors = self.draft.take().unwrap_or_else(|| self.effective());
        self.draft_edits.clear();
        self.forced.clear();
        self.remote = colors.to_slots();
        SaveOutcome {
            commands: self.set_effective(ThemeSlot::ALL, StylePriority::Important),
            colors,
        }
    }

    /// Restores the built-in defaults everywhere above the fallback layer.
    pub fn reset(&mut self) -> SaveOutcome {
        let colors = ThemeColorMap::default();
        self.forced.clear();
        self.remote = colors.to_slots();
        if self.draft.is_some() {
            self.draft = Some(colors.clone());
        }
        self.draft_edits.clear();
        SaveOutcome {
            commands: self.set_effective(ThemeSlot::ALL, StylePriority::Normal),
            colors,
        }
    }
}
