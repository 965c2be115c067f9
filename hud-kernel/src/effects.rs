/**
 * TRANSIENT-EFFECT TRACKER - Time-boxed visual flags derived from stat deltas
 *
 * ROLE:
 * Compares each merged frame with the previous one and starts short-lived
 * effects (damage flash, heal glow, falling armor segments, shot recoil).
 * Consumers only ever see the boolean/positional `EffectProjection`.
 *
 * HOW IT WORKS:
 * - every effect gets a fresh monotonic id and an expiry timer keyed by it
 * - a retrigger of the same kind (and segment) cancels the running effect and
 *   its timer before inserting the new one, and bumps the pulse counter
 * - loss and gain of health are mutually exclusive
 */

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::PlayerStats;
use crate::scheduler::{Scheduler, TimerKey};

pub const ARMOR_SEGMENTS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EffectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    HealthLoss,
    HealthGain,
    FallingSegment,
    ArmorGain,
    AmmoShot,
}

impl EffectKind {
    pub fn duration(self) -> Duration {
        match self {
            EffectKind::HealthLoss | EffectKind::FallingSegment => Duration::from_millis(600),
            EffectKind::HealthGain | EffectKind::ArmorGain => Duration::from_millis(1000),
            EffectKind::AmmoShot => Duration::from_millis(150),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransientEffect {
    pub id: EffectId,
    pub kind: EffectKind,
    pub position: Option<u8>,
    pub started_at: Instant,
}

/// What the presentation layer reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectProjection {
    pub health_loss: bool,
    pub health_gain: bool,
    pub armor_gain: bool,
    pub ammo_shot: bool,
    pub falling_segments: Vec<u8>,
    /// Bumped on every retrigger so a running animation can restart.
    pub pulse: u64,
}

#[derive(Debug, Default)]
pub struct EffectTracker {
    active: BTreeMap<EffectId, TransientEffect>,
    next_id: u64,
    pulse: u64,
}

impl EffectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the effects implied by a health/armor change.
    pub fn observe_stats(&mut self, prev: &PlayerStats, curr: &PlayerStats, now: Instant, timers: &mut Scheduler) {
        if curr.health < prev.health {
            self.clear_kind(EffectKind::HealthGain, timers);
            self.trigger(EffectKind::HealthLoss, None, now, timers);
        } else if curr.health > prev.health {
            self.clear_kind(EffectKind::HealthLoss, timers);
            self.trigger(EffectKind::HealthGain, None, now, timers);
        }

        if curr.armor < prev.armor {
            for position in falling_segments(prev.armor, curr.armor, curr.max_armor) {
                self.trigger(EffectKind::FallingSegment, Some(position), now, timers);
            }
        } else if curr.armor > prev.armor {
            self.trigger(EffectKind::ArmorGain, None, now, timers);
        }
    }

    pub fn observe_ammo(&mut self, prev: u32, curr: u32, now: Instant, timers: &mut Scheduler) {
        if curr < prev {
            self.trigger(EffectKind::AmmoShot, None, now, timers);
        }
    }

    /// Expiry callback. False when the id was already replaced or cleared.
    pub fn expire(&mut self, id: EffectId) -> bool {
        self.active.remove(&id).is_some()
    }

    pub fn active(&self) -> impl Iterator<Item = &TransientEffect> {
        self.active.values()
    }

    pub fn projection(&self) -> EffectProjection {
        let mut view = EffectProjection { pulse: self.pulse, ..Default::default() };
        for effect in self.active.values() {
            match effect.kind {
                EffectKind::HealthLoss => view.health_loss = true,
                EffectKind::HealthGain => view.health_gain = true,
                EffectKind::ArmorGain => view.armor_gain = true,
                EffectKind::AmmoShot => view.ammo_shot = true,
                EffectKind::FallingSegment => view.falling_segments.extend(effect.position),
            }
        }
        view.falling_segments.sort_unstable();
        view
    }

    fn trigger(&mut self, kind: EffectKind, position: Option<u8>, now: Instant, timers: &mut Scheduler) -> EffectId {
        let running: Vec<EffectId> = self
            .active
            .values()
            .filter(|e| e.kind == kind && e.position == position)
            .map(|e| e.id)
            .collect();
        if !running.is_empty() {
            self.pulse += 1;
            for id in running {
                self.active.remove(&id);
                timers.cancel(TimerKey::EffectExpiry(id));
            }
        }

        self.next_id += 1;
        let id = EffectId(self.next_id);
        self.active.insert(id, TransientEffect { id, kind, position, started_at: now });
        timers.start(TimerKey::EffectExpiry(id), now + kind.duration());
        debug!("[effects] started {kind:?} {position:?} as {id:?}");
        id
    }

    fn clear_kind(&mut self, kind: EffectKind, timers: &mut Scheduler) {
        self.active.retain(|id, e| {
            let keep = e.kind != kind;
            if !keep {
                timers.cancel(TimerKey::EffectExpiry(*id));
            }
            keep
        });
    }
}

/// Segment indices that emptied between two armor values.
pub fn falling_segments(prev: f64, curr: f64, max_armor: f64) -> std::ops::Range<u8> {
    if max_armor <= 0.0 {
        return 0..0;
    }
    let seg = max_armor / f64::from(ARMOR_SEGMENTS);
    let index = |v: f64| ((v.max(0.0) / seg).ceil() as u8).min(ARMOR_SEGMENTS);
    index(curr)..index(prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(health: f64, armor: f64) -> PlayerStats {
        PlayerStats { health, armor, ..Default::default() }
    }

    #[test]
    fn armor_drop_emits_one_effect_per_emptied_segment() {
        assert_eq!(falling_segments(85.0, 55.0, 100.0), 3..5);
        assert_eq!(falling_segments(100.0, 0.0, 100.0), 0..5);
        assert_eq!(falling_segments(41.0, 40.0, 100.0), 2..3);
        assert!(falling_segments(40.0, 39.0, 100.0).is_empty());
    }

    #[test]
    fn health_loss_and_gain_exclude_each_other() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut fx = EffectTracker::new();

        fx.observe_stats(&stats(100.0, 0.0), &stats(60.0, 0.0), t0, &mut timers);
        assert!(fx.projection().health_loss);

        fx.observe_stats(&stats(60.0, 0.0), &stats(70.0, 0.0), t0, &mut timers);
        let view = fx.projection();
        assert!(view.health_gain);
        assert!(!view.health_loss);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn retrigger_replaces_effect_and_timer() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(300);
        let mut timers = Scheduler::new();
        let mut fx = EffectTracker::new();

        fx.observe_ammo(30, 29, t0, &mut timers);
        let first = fx.active().next().unwrap().id;
        fx.observe_ammo(29, 28, t1, &mut timers);
        let second = fx.active().next().unwrap().clone();

        assert_ne!(first, second.id);
        assert_eq!(second.started_at, t1);
        assert!(!timers.is_pending(TimerKey::EffectExpiry(first)));
        assert_eq!(timers.deadline(TimerKey::EffectExpiry(second.id)), Some(t1 + Duration::from_millis(150)));
        assert_eq!(fx.projection().pulse, 1);
        assert!(!fx.expire(first));
        assert!(fx.expire(second.id));
        assert!(!fx.projection().ammo_shot);
    }

    #[test]
    fn falling_segments_project_by_position() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut fx = EffectTracker::new();
        fx.observe_stats(&stats(100.0, 85.0), &stats(100.0, 55.0), t0, &mut timers);
        assert_eq!(fx.projection().falling_segments, vec![3, 4]);
        assert_eq!(timers.len(), 2);
    }

    #[test]
    fn ids_are_unique() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut fx = EffectTracker::new();
        fx.observe_stats(&stats(100.0, 100.0), &stats(50.0, 0.0), t0, &mut timers);
        fx.observe_ammo(10, 9, t0, &mut timers);
        let mut ids: Vec<_> = fx.active().map(|e| e.id).collect();
        let n = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), n);
        assert_eq!(n, 7);
    }
}
