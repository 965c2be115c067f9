//! Continuous fire for the local control panel.
//!
//! Pulling the trigger fires one shot at once, then one per [`SHOT_INTERVAL`]
//! through the keyed `ShootTick` timer until the trigger is released or the
//! magazine is empty. An empty magazine releases the trigger by itself.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::scheduler::{Scheduler, TimerKey};

pub const SHOT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerInput {
    Shoot,
    ReleaseTrigger,
}

impl TriggerInput {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "shoot" => Some(TriggerInput::Shoot),
            "release-trigger" => Some(TriggerInput::ReleaseTrigger),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Trigger {
    held: bool,
}

impl Trigger {
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Starts firing. Returns true when a shot went off.
    pub fn pull(&mut self, ammo: &mut u32, now: Instant, timers: &mut Scheduler) -> bool {
        if self.held || *ammo == 0 {
            return false;
        }
        self.held = true;
        self.fire(ammo, now, timers);
        true
    }

    pub fn release(&mut self, timers: &mut Scheduler) -> bool {
        timers.cancel(TimerKey::ShootTick);
        std::mem::replace(&mut self.held, false)
    }

    /// Tick callback. Returns true when a shot went off.
    pub fn tick(&mut self, ammo: &mut u32, now: Instant, timers: &mut Scheduler) -> bool {
        if !self.held || *ammo == 0 {
            self.release(timers);
            return false;
        }
        self.fire(ammo, now, timers);
        true
    }

    fn fire(&mut self, ammo: &mut u32, now: Instant, timers: &mut Scheduler) {
        *ammo -= 1;
        if *ammo == 0 {
            debug!("[weapon] magazine empty");
            self.release(timers);
        } else {
            timers.start(TimerKey::ShootTick, now + SHOT_INTERVAL);
        }
    }
}
