/**
 * VEHICLE KINEMATICS SIMULATOR - Local speed/RPM integrator
 *
 * ROLE:
 * Stands in for the host as the source of truth for `speed` and `rpm` when
 * the kernel runs with `authority: local` (control panel mode).
 *
 * HOW IT WORKS:
 * - one state at a time: Accelerating, Braking, Coasting (or Idle at rest)
 * - a single `DriveTick` timer, re-armed every 100ms while not idle
 * - every state change cancels the pending tick and re-arms it from now
 * - coasting that reaches rest (speed 0, idle rpm) drops to Idle and stops
 *   ticking until the next input
 */

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::PlayerStats;
use crate::scheduler::{Scheduler, TimerKey};

pub const TICK: Duration = Duration::from_millis(100);
pub const MAX_SPEED: f64 = 200.0;
const IDLE_RPM_MOVING: f64 = 0.2;
const IDLE_RPM_STOPPED: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveState {
    #[default]
    Idle,
    Accelerating,
    Braking,
    Coasting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriveInput {
    Accelerate,
    Brake,
    ReleaseAccelerate,
    ReleaseBrake,
    /// Releases whichever pedal is held.
    Release,
}

impl DriveInput {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "accelerate" => Some(DriveInput::Accelerate),
            "brake" => Some(DriveInput::Brake),
            "release-accelerate" => Some(DriveInput::ReleaseAccelerate),
            "release-brake" => Some(DriveInput::ReleaseBrake),
            "release" => Some(DriveInput::Release),
            _ => None,
        }
    }
}

fn floor_rpm(speed: f64) -> f64 {
    if speed > 0.0 {
        IDLE_RPM_MOVING
    } else {
        IDLE_RPM_STOPPED
    }
}

/// One integration step. Pure.
pub fn step(state: DriveState, speed: f64, rpm: f64) -> (f64, f64) {
    match state {
        DriveState::Idle => (speed, rpm),
        DriveState::Accelerating => {
            let speed = (speed + 5.0).min(MAX_SPEED);
            let rpm = (rpm + (0.025 - rpm * 0.01).max(0.01)).min(1.0);
            (speed, rpm)
        }
        DriveState::Braking => {
            let speed = (speed - (speed * 0.15).max(8.0)).max(0.0);
            (speed, (rpm - 0.02).max(floor_rpm(speed)))
        }
        DriveState::Coasting => {
            let speed = (speed - (speed * 0.02).max(1.0)).max(0.0);
            (speed, (rpm - 0.008).max(floor_rpm(speed)))
        }
    }
}

#[derive(Debug, Default)]
pub struct Simulator {
    state: DriveState,
}

impl Simulator {
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Engine start: begin coasting from whatever the stats hold.
    pub fn start(&mut self, now: Instant, timers: &mut Scheduler) {
        self.enter(DriveState::Coasting, now, timers);
    }

    /// Applies a control input. Returns true when the state changed.
    pub fn input(&mut self, input: DriveInput, now: Instant, timers: &mut Scheduler) -> bool {
        let next = match (input, self.state) {
            (DriveInput::Accelerate, _) => DriveState::Accelerating,
            (DriveInput::Brake, _) => DriveState::Braking,
            (DriveInput::ReleaseAccelerate, DriveState::Accelerating)
            | (DriveInput::ReleaseBrake, DriveState::Braking)
            | (DriveInput::Release, DriveState::Accelerating | DriveState::Braking) => DriveState::Coasting,
            _ => self.state,
        };
        if next == self.state {
            return false;
        }
        self.enter(next, now, timers);
        true
    }

    /// Tick callback. Returns true when speed or rpm moved.
    pub fn tick(&mut self, stats: &mut PlayerStats, now: Instant, timers: &mut Scheduler) -> bool {
        let (speed, rpm) = step(self.state, stats.speed, stats.rpm);
        let moved = speed != stats.speed || rpm != stats.rpm;
        stats.speed = speed;
        stats.rpm = rpm;

        if self.state == DriveState::Coasting && speed == 0.0 && rpm <= IDLE_RPM_STOPPED {
            debug!("[sim] vehicle at rest");
            self.state = DriveState::Idle;
        } else if self.state != DriveState::Idle {
            timers.start(TimerKey::DriveTick, now + TICK);
        }
        moved
    }

    pub fn stop(&mut self, timers: &mut Scheduler) {
        timers.cancel(TimerKey::DriveTick);
        self.state = DriveState::Idle;
    }

    fn enter(&mut self, state: DriveState, now: Instant, timers: &mut Scheduler) {
        debug!("[sim] {:?} -> {:?}", self.state, state);
        self.state = state;
        timers.cancel(TimerKey::DriveTick);
        timers.start(TimerKey::DriveTick, now + TICK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sim: &mut Simulator, stats: &mut PlayerStats, timers: &mut Scheduler, ticks: usize) {
        for _ in 0..ticks {
            let (key, at) = timers.pop_due(Instant::now() + Duration::from_secs(3600)).unwrap();
            assert_eq!(key, TimerKey::DriveTick);
            sim.tick(stats, at, timers);
        }
    }

    #[test]
    fn ten_accelerate_ticks_reach_fifty() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut sim = Simulator::default();
        let mut stats = PlayerStats::default();

        sim.input(DriveInput::Accelerate, t0, &mut timers);
        run(&mut sim, &mut stats, &mut timers, 10);
        assert_eq!(stats.speed, 50.0);
        assert!(stats.rpm > 0.2 && stats.rpm <= 1.0);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn speed_is_capped() {
        let (speed, rpm) = step(DriveState::Accelerating, 198.0, 0.999);
        assert_eq!(speed, MAX_SPEED);
        assert_eq!(rpm, 1.0);
    }

    #[test]
    fn braking_floors_at_zero_and_idle_rpm() {
        assert_eq!(step(DriveState::Braking, 5.0, 0.16), (0.0, 0.15));
        let (speed, rpm) = step(DriveState::Braking, 100.0, 0.9);
        assert_eq!(speed, 85.0);
        assert!((rpm - 0.88).abs() < 1e-9);
    }

    #[test]
    fn coasting_decays_slowly() {
        let (speed, rpm) = step(DriveState::Coasting, 100.0, 0.5);
        assert_eq!(speed, 98.0);
        assert!((rpm - 0.492).abs() < 1e-9);
        assert_eq!(step(DriveState::Coasting, 10.0, 0.1), (9.0, 0.2));
    }

    #[test]
    fn brake_cancels_acceleration() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut sim = Simulator::default();
        let mut stats = PlayerStats::default();

        sim.input(DriveInput::Accelerate, t0, &mut timers);
        run(&mut sim, &mut stats, &mut timers, 4);
        assert!(sim.input(DriveInput::Brake, t0, &mut timers));
        assert_eq!(timers.len(), 1);
        run(&mut sim, &mut stats, &mut timers, 1);
        assert_eq!(stats.speed, 12.0);
        assert_eq!(sim.state(), DriveState::Braking);
    }

    #[test]
    fn repeated_input_is_a_no_op() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut sim = Simulator::default();
        assert!(sim.input(DriveInput::Accelerate, t0, &mut timers));
        assert!(!sim.input(DriveInput::Accelerate, t0 + TICK / 2, &mut timers));
        assert_eq!(timers.deadline(TimerKey::DriveTick), Some(t0 + TICK));
    }

    #[test]
    fn releasing_the_other_pedal_does_nothing() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut sim = Simulator::default();
        sim.input(DriveInput::Accelerate, t0, &mut timers);
        assert!(!sim.input(DriveInput::ReleaseBrake, t0, &mut timers));
        assert!(sim.input(DriveInput::Release, t0, &mut timers));
        assert_eq!(sim.state(), DriveState::Coasting);
    }

    #[test]
    fn coasting_to_rest_stops_ticking() {
        let t0 = Instant::now();
        let mut timers = Scheduler::new();
        let mut sim = Simulator::default();
        let mut stats = PlayerStats { speed: 2.0, rpm: 0.16, ..Default::default() };
        sim.start(t0, &mut timers);
        let mut ticks = 0;
        while let Some((_, at)) = timers.pop_due(t0 + Duration::from_secs(60)) {
            sim.tick(&mut stats, at, &mut timers);
            ticks += 1;
            assert!(ticks < 50, "simulator never settled");
        }
        assert_eq!(stats.speed, 0.0);
        assert_eq!(stats.rpm, 0.15);
        assert_eq!(sim.state(), DriveState::Idle);
        assert!(timers.is_empty());
    }

    #[test]
    fn parses_control_routes() {
        assert_eq!(DriveInput::parse("release-brake"), Some(DriveInput::ReleaseBrake));
        assert_eq!(DriveInput::parse("nitro"), None);
    }
}
