//! Keyed deadline queue owning every deferred callback of the engine.
//!
//! Starting a key that is already pending replaces its deadline, so a key is
//! never scheduled twice. The runtime sleeps until [`Scheduler::next_deadline`]
//! and then drains due keys in deadline order.

use std::collections::HashMap;
use std::time::Instant;

use crate::effects::EffectId;
use crate::visibility::GateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    AccountHide,
    EffectExpiry(EffectId),
    LegacyFallback,
    Gate(GateId),
    SpeedometerSettle,
    DriveTick,
    ShootTick,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: HashMap<TimerKey, (Instant, u64)>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` at `at`. Returns true when an earlier deadline was replaced.
    pub fn start(&mut self, key: TimerKey, at: Instant) -> bool {
        self.seq += 1;
        self.pending.insert(key, (at, self.seq)).is_some()
    }

    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn deadline(&self, key: TimerKey) -> Option<Instant> {
        self.pending.get(&key).map(|(at, _)| *at)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(at, _)| *at).min()
    }

    /// Removes and returns the earliest key due at `now`, with its deadline.
    /// Ties fire in the order they were armed.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerKey, Instant)> {
        let (key, at) = self
            .pending
            .iter()
            .filter(|(_, (at, _))| *at <= now)
            .min_by_key(|(_, (at, seq))| (*at, *seq))
            .map(|(key, (at, _))| (*key, *at))?;
        self.pending.remove(&key);
        Some((key, at))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
