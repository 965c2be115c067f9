//! Style application port.
//!
//! The theme store only produces [`StyleCommand`]s. Whatever renders the HUD
//! implements [`StylePort`]; the kernel itself keeps an in-memory
//! [`StyleSurface`] that mirrors the custom properties a renderer would hold.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::theme::{StyleCommand, StylePriority, ThemeSlot};

pub trait StylePort: Send {
    fn apply(&mut self, command: &StyleCommand);

    fn apply_all(&mut self, commands: &[StyleCommand]) {
        for command in commands {
            self.apply(command);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedStyle {
    pub value: String,
    pub priority: StylePriority,
}

/// Current custom properties, keyed by property name.
#[derive(Debug, Default, Clone, Serialize)]
pub struct StyleSurface {
    properties: BTreeMap<String, AppliedStyle>,
    writes: u64,
}

impl StyleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: ThemeSlot) -> Option<&AppliedStyle> {
        self.properties.get(&slot.css_property())
    }

    pub fn properties(&self) -> &BTreeMap<String, AppliedStyle> {
        &self.properties
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl StylePort for StyleSurface {
    fn apply(&mut self, command: &StyleCommand) {
        self.writes += 1;
        match command {
            StyleCommand::Set { slot, color, priority } => {
                self.properties.insert(
                    slot.css_property(),
                    AppliedStyle { value: color.clone(), priority: *priority },
                );
            }
            StyleCommand::Remove { slot } => {
                self.properties.remove(&slot.css_property());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_tracks_set_and_remove() {
        let mut surface = StyleSurface::new();
        surface.apply_all(&[
            StyleCommand::Set {
                slot: ThemeSlot::Health,
                color: "#101010".into(),
                priority: StylePriority::Important,
            },
            StyleCommand::Remove { slot: ThemeSlot::Armor },
        ]);
        assert_eq!(surface.get(ThemeSlot::Health).unwrap().value, "#101010");
        assert!(surface.properties().contains_key("--hud-health-color"));

        surface.apply(&StyleCommand::Remove { slot: ThemeSlot::Health });
        assert!(surface.get(ThemeSlot::Health).is_none());
        assert_eq!(surface.writes(), 3);
    }
}
