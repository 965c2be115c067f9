//! Debounced visibility gates.
//!
//! A gate shows immediately and hides only after its input stayed inactive
//! for the whole hold time. The speedometer uses a slide-in phase instead of a
//! hide delay.

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::scheduler::{Scheduler, TimerKey};

pub const STRESS_BAR_HOLD: Duration = Duration::from_millis(400);
pub const SPEEDOMETER_SLIDE_IN: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateId {
    StressBar,
}

#[derive(Debug)]
pub struct VisibilityGate {
    id: GateId,
    hold: Duration,
    visible: bool,
}

impl VisibilityGate {
    pub fn new(id: GateId, hold: Duration) -> Self {
        Self { id, hold, visible: false }
    }

    pub fn stress_bar() -> Self {
        Self::new(GateId::StressBar, STRESS_BAR_HOLD)
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Feeds the current input. Returns true when visibility flipped.
    pub fn set_active(&mut self, active: bool, now: Instant, timers: &mut Scheduler) -> bool {
        let key = TimerKey::Gate(self.id);
        if active {
            timers.cancel(key);
            let changed = !self.visible;
            self.visible = true;
            changed
        } else {
            // An inactive frame while a hide is pending must not push it back.
            if self.visible && !timers.is_pending(key) {
                timers.start(key, now + self.hold);
            }
            false
        }
    }

    pub fn on_hold_elapsed(&mut self) -> bool {
        let changed = self.visible;
        self.visible = false;
        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeedometerPhase {
    #[default]
    Hidden,
    SlidingIn,
    Visible,
}

#[derive(Debug, Default)]
pub struct Speedometer {
    phase: SpeedometerPhase,
}

impl Speedometer {
    pub fn phase(&self) -> SpeedometerPhase {
        self.phase
    }

    pub fn set_shown(&mut self, show: bool, now: Instant, timers: &mut Scheduler) -> bool {
        match (show, self.phase) {
            (true, SpeedometerPhase::Hidden) => {
                self.phase = SpeedometerPhase::SlidingIn;
                timers.start(TimerKey::SpeedometerSettle, now + SPEEDOMETER_SLIDE_IN);
                true
            }
            (false, SpeedometerPhase::SlidingIn | SpeedometerPhase::Visible) => {
                self.phase = SpeedometerPhase::Hidden;
                timers.cancel(TimerKey::SpeedometerSettle);
                true
            }
            _ => false,
        }
    }

    pub fn on_settled(&mut self) -> bool {
        if self.phase == SpeedometerPhase::SlidingIn {
            self.phase = SpeedometerPhase::Visible;
            true
        } else {
            false
        }
    }
}
