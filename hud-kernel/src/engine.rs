/**
 * SYNC ENGINE - Single owner of the HUD state
 *
 * ROLE:
 * Applies decoded commands, local control inputs and timer firings to the
 * canonical slices, strictly one at a time. It never does I/O: each step
 * returns an `Outbox` the runtime flushes.
 *
 * HOW IT WORKS:
 * - the caller passes `now` explicitly, so the engine is fully deterministic
 * - deferred work goes through one keyed `Scheduler`; `fire_due` drains it
 *   in deadline order, each firing processed at its own deadline
 * - after the render pass of a re-rendering step the runtime asks for
 *   `reassert_theme()`, which re-applies every explicitly held color
 *
 * FLUSH ORDER (runtime):
 * bridge calls -> style commands -> snapshot publish -> theme reassert -> notices
 */

use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::bridge::BridgeCall;
use crate::config::Authority;
use crate::effects::EffectTracker;
use crate::envelope::{owned_fields, Command, PlayerHudUpdate, VehicleHudUpdate};
use crate::kinematics::{DriveInput, Simulator};
use crate::models::{
    AccountData, CompassData, GpsDistance, HudConfig, HudSnapshot, PlayerData, PlayerStats, VehicleData,
};
use crate::reducer::{FieldMerge, StatField};
use crate::scheduler::{Scheduler, TimerKey};
use crate::theme::{RawColors, StyleCommand, ThemeColorMap, ThemeStore};
use crate::visibility::{GateId, Speedometer, VisibilityGate};
use crate::weapon::{Trigger, TriggerInput};

pub const ACCOUNT_VISIBLE_FOR: Duration = Duration::from_secs(3);
pub const LEGACY_FALLBACK_DELAY: Duration = Duration::from_secs(5);

/// Theme dashboard actions coming from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    SetColor { slot: String, color: String },
    Save,
    Reset,
    Close,
}

/// Everything the engine consumes, in delivery order.
#[derive(Debug, Clone)]
pub enum Input {
    Command(Command),
    /// Answer to the `getThemeColors` call tagged with `generation`.
    ThemeFetched { generation: u64, result: Result<Value, String> },
    Drive(DriveInput),
    Trigger(TriggerInput),
    Dashboard(DashboardAction),
    Escape,
    Shutdown,
}

/// Broadcast to subscribers after the render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ThemeChanged(ThemeColorMap),
}

#[derive(Debug, Default, PartialEq)]
pub struct Outbox {
    pub calls: Vec<BridgeCall>,
    pub style: Vec<StyleCommand>,
    pub notices: Vec<Notice>,
    pub rerender: bool,
    pub reassert_theme: bool,
}

impl Outbox {
    pub fn merge(&mut self, other: Outbox) {
        self.calls.extend(other.calls);
        self.style.extend(other.style);
        self.notices.extend(other.notices);
        self.rerender |= other.rerender;
        self.reassert_theme |= other.reassert_theme;
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.style.is_empty() && self.notices.is_empty() && !self.rerender
    }

    fn render(&mut self) {
        self.rerender = true;
        self.reassert_theme = true;
    }
}

pub struct Engine {
    authority: Authority,
    running: bool,
    visible: bool,
    config: HudConfig,
    stats: PlayerStats,
    player: PlayerData,
    vehicle: VehicleData,
    account: AccountData,
    compass: CompassData,
    gps: GpsDistance,
    effects: EffectTracker,
    theme: ThemeStore,
    stress_bar: VisibilityGate,
    speedometer: Speedometer,
    simulator: Simulator,
    trigger: Trigger,
    dashboard_open: bool,
    theme_fetch_generation: u64,
    legacy_theme: Option<RawColors>,
    timers: Scheduler,
}

impl Engine {
    /// Boots the engine: arms the legacy fallback grace timer and, in local
    /// mode, starts the simulator coasting.
    pub fn new(authority: Authority, legacy_theme: Option<RawColors>, now: Instant) -> Self {
        let mut engine = Self {
            authority,
            running: true,
            visible: false,
            config: HudConfig::default(),
            stats: PlayerStats::default(),
            player: PlayerData::default(),
            vehicle: VehicleData::default(),
            account: AccountData::default(),
            compass: CompassData::default(),
            gps: GpsDistance::default(),
            effects: EffectTracker::new(),
            theme: ThemeStore::new(),
            stress_bar: VisibilityGate::stress_bar(),
            speedometer: Speedometer::default(),
            simulator: Simulator::default(),
            trigger: Trigger::default(),
            dashboard_open: false,
            theme_fetch_generation: 0,
            legacy_theme,
            timers: Scheduler::new(),
        };
        if engine.legacy_theme.is_some() {
            engine.timers.start(TimerKey::LegacyFallback, now + LEGACY_FALLBACK_DELAY);
        }
        if authority == Authority::Local {
            engine.simulator.start(now, &mut engine.timers);
        }
        engine
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_timer_pending(&self, key: TimerKey) -> bool {
        self.timers.is_pending(key)
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn handle(&mut self, input: Input, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        if !self.running {
            debug!("[engine] dropping input after shutdown");
            return out;
        }
        match input {
            Input::Command(command) => self.apply_command(command, now, &mut out),
            Input::ThemeFetched { generation, result } => self.theme_fetched(generation, result, &mut out),
            Input::Drive(drive) => self.drive(drive, now, &mut out),
            Input::Trigger(trigger) => self.pull_trigger(trigger, now, &mut out),
            Input::Dashboard(action) => self.dashboard(action, &mut out),
            Input::Escape => {
                if self.dashboard_open {
                    self.close_dashboard(&mut out);
                } else {
                    out.calls.push(BridgeCall::HideFrame);
                }
            }
            Input::Shutdown => self.shutdown(),
        }
        out
    }

    /// Runs every timer due at `now`, each at its own deadline.
    pub fn fire_due(&mut self, now: Instant) -> Outbox {
        let mut out = Outbox::default();
        while let Some((key, at)) = self.timers.pop_due(now) {
            self.fire(key, at, &mut out);
        }
        out
    }

    /// Explicitly held colors, to re-apply after a render pass.
    pub fn reassert_theme(&self) -> Vec<StyleCommand> {
        self.theme.reassert()
    }

    pub fn shutdown(&mut self) {
        info!("[engine] shutting down, clearing {} timers", self.timers.len());
        self.simulator.stop(&mut self.timers);
        self.trigger.release(&mut self.timers);
        self.timers.clear();
        self.running = false;
    }

    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            visible: self.visible,
            config: self.config.clone(),
            stats: self.stats.clone(),
            player: self.player.clone(),
            vehicle: self.vehicle.clone(),
            account: self.account.clone(),
            compass: self.compass.clone(),
            gps: self.gps.clone(),
            effects: self.effects.projection(),
            stress_bar_visible: self.stress_bar.visible(),
            speedometer: self.speedometer.phase(),
            theme_dashboard_open: self.dashboard_open,
            theme: self.theme.effective(),
            theme_sources: self.theme.sources(),
        }
    }

    fn apply_command(&mut self, command: Command, now: Instant, out: &mut Outbox) {
        debug!("[engine] {} owns {:?}", command.action(), owned_fields(&command));
        match command {
            Command::SetVisible(visible) => self.visible = visible,
            Command::HudInitialize { config } => {
                self.visible = true;
                if let Some(config) = config {
                    self.config = config;
                }
                self.update_stress_gate(now);
            }
            Command::UpdatePlayerHud(update) => self.update_player(update, now),
            Command::UpdateVehicleHud(update) => self.update_vehicle(update, now),
            Command::ShowAccount { kind, amount } => {
                self.account = AccountData { kind, amount, visible: true };
                self.timers.start(TimerKey::AccountHide, now + ACCOUNT_VISIBLE_FOR);
            }
            Command::SeatbeltToggle { enabled } => FieldMerge::set_seatbelt(&mut self.stats, enabled),
            Command::CruiseToggle { enabled } => self.vehicle.cruise = enabled,
            Command::LoadThemeColors(colors) => out.style = self.theme.load_from_message(&colors),
            Command::ForceApplyThemeColors { colors, override_css, priority } => {
                out.style = self.theme.force_apply(&colors, override_css, priority);
            }
            Command::ForceThemeColorsByDom(colors) => out.style = self.theme.force_by_dom(&colors),
            Command::ForceHudRefresh | Command::RefreshAllComponents => {}
            Command::UpdateCompass(compass) => self.compass = compass,
            Command::UpdateGpsDistance(gps) => self.gps = gps,
            Command::ToggleThemeDashboard => {
                if self.dashboard_open {
                    self.close_dashboard(out);
                } else {
                    self.open_dashboard(out);
                }
            }
        }
        out.render();
    }

    fn update_player(&mut self, update: PlayerHudUpdate, now: Instant) {
        let prev_stats = self.stats.clone();
        let prev_ammo = self.player.current_ammo;

        self.player = update.player;
        FieldMerge::apply(&mut self.stats, &update.stats, &[]);

        self.effects.observe_stats(&prev_stats, &self.stats, now, &mut self.timers);
        self.effects.observe_ammo(prev_ammo, self.player.current_ammo, now, &mut self.timers);
        self.update_stress_gate(now);
    }

    fn update_vehicle(&mut self, update: VehicleHudUpdate, now: Instant) {
        let skip: &[StatField] = match self.authority {
            Authority::Host => &[],
            Authority::Local => &[StatField::Speed, StatField::Rpm],
        };
        self.vehicle = update.vehicle;
        FieldMerge::apply(&mut self.stats, &update.stats, skip);
        if update.show_present {
            self.speedometer.set_shown(self.vehicle.show, now, &mut self.timers);
        }
    }

    fn update_stress_gate(&mut self, now: Instant) {
        let active = self.stats.stress > 0.0;
        self.stress_bar.set_active(active, now, &mut self.timers);
    }

    fn drive(&mut self, input: DriveInput, now: Instant, out: &mut Outbox) {
        if self.authority != Authority::Local {
            debug!("[engine] ignoring {input:?}, host owns speed");
            return;
        }
        if self.simulator.input(input, now, &mut self.timers) {
            out.rerender = true;
        }
    }

    fn pull_trigger(&mut self, input: TriggerInput, now: Instant, out: &mut Outbox) {
        if self.authority != Authority::Local {
            debug!("[engine] ignoring {input:?}, host owns ammo");
            return;
        }
        match input {
            TriggerInput::Shoot => {
                let prev = self.player.current_ammo;
                if self.trigger.pull(&mut self.player.current_ammo, now, &mut self.timers) {
                    self.shot_fired(prev, now, out);
                }
            }
            TriggerInput::ReleaseTrigger => {
                self.trigger.release(&mut self.timers);
            }
        }
    }

    fn shot_fired(&mut self, prev_ammo: u32, now: Instant, out: &mut Outbox) {
        self.effects.observe_ammo(prev_ammo, self.player.current_ammo, now, &mut self.timers);
        out.render();
    }

    fn open_dashboard(&mut self, out: &mut Outbox) {
        self.dashboard_open = true;
        self.theme_fetch_generation += 1;
        self.theme.open_draft();
        out.calls.push(BridgeCall::SetNuiFocus { has_focus: true, has_cursor: true });
        out.calls.push(BridgeCall::GetThemeColors { generation: self.theme_fetch_generation });
    }

    /// Applies a remote read only if it answers the request of the dashboard
    /// session that is still open.
    fn theme_fetched(&mut self, generation: u64, result: Result<Value, String>, out: &mut Outbox) {
        if !self.dashboard_open || generation != self.theme_fetch_generation {
            debug!(
                "[engine] dropping stale theme read (generation {generation}, current {}, open {})",
                self.theme_fetch_generation, self.dashboard_open
            );
            return;
        }
        out.style = self.theme.apply_remote_fetch(result);
        out.render();
    }

    fn close_dashboard(&mut self, out: &mut Outbox) {
        self.dashboard_open = false;
        self.theme_fetch_generation += 1;
        self.theme.close_draft();
        out.calls.push(BridgeCall::SetNuiFocus { has_focus: false, has_cursor: false });
        out.render();
    }

    fn dashboard(&mut self, action: DashboardAction, out: &mut Outbox) {
        if !self.dashboard_open {
            warn!("[engine] dashboard action {action:?} while dashboard is closed");
            return;
        }
        match action {
            DashboardAction::SetColor { slot, color } => {
                if let Err(e) = self.theme.set_draft_color(&slot, &color) {
                    warn!("[engine] rejected draft color: {e}");
                }
            }
            DashboardAction::Save => {
                let saved = self.theme.save();
                out.calls.push(BridgeCall::SaveThemeColors(saved.colors.clone()));
                out.style = saved.commands;
                out.notices.push(Notice::ThemeChanged(saved.colors));
                self.close_dashboard(out);
            }
            DashboardAction::Reset => {
                let reset = self.theme.reset();
                out.calls.push(BridgeCall::SaveThemeColors(reset.colors.clone()));
                out.style = reset.commands;
                out.notices.push(Notice::ThemeChanged(reset.colors));
                out.render();
            }
            DashboardAction::Close => self.close_dashboard(out),
        }
    }

    fn fire(&mut self, key: TimerKey, at: Instant, out: &mut Outbox) {
        match key {
            TimerKey::AccountHide => {
                self.account.visible = false;
                out.render();
            }
            TimerKey::EffectExpiry(id) => {
                if self.effects.expire(id) {
                    out.render();
                }
            }
            TimerKey::LegacyFallback => {
                if let Some(colors) = self.legacy_theme.take() {
                    let style = self.theme.apply_legacy_fallback(&colors);
                    if !style.is_empty() {
                        info!("[engine] applied {} legacy theme slots", style.len());
                        out.style.extend(style);
                        out.render();
                    }
                }
            }
            TimerKey::Gate(GateId::StressBar) => {
                if self.stress_bar.on_hold_elapsed() {
                    out.render();
                }
            }
            TimerKey::SpeedometerSettle => {
                if self.speedometer.on_settled() {
                    out.render();
                }
            }
            TimerKey::DriveTick => {
                if self.simulator.tick(&mut self.stats, at, &mut self.timers) {
                    out.render();
                }
            }
            TimerKey::ShootTick => {
                let prev = self.player.current_ammo;
                if self.trigger.tick(&mut self.player.current_ammo, at, &mut self.timers) {
                    self.shot_fired(prev, at, out);
                }
            }
        }
    }
}
