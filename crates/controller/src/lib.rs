//! Water level regulation: the initial fill, the closed-loop regulator used
//! while the level sensor is trusted, and the predictive regulator used in rescue.

mod pumps;

pub use pumps::PumpBank;

use mailbox::{BoilerConfig, Mailbox, Message};
use safety::{FailureRegistry, Readings};
use tracing::debug;

/// Length of one control cycle in seconds; rates are scaled by it.
pub const TICK_SECONDS: f64 = 5.0;

/// Extra litres kept above N1 when deciding the level is comfortably high.
pub const LOW_LEVEL_MARGIN: f64 = 3.0;

/// What the initial fill routine did this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillStep {
    /// At or above N2: valve open, pumps closed.
    Draining,
    /// At or below N1: valve closed, all pumps open.
    Filling,
    /// In band with a pump still running: stop everything.
    Settling,
    /// In band and quiet: PROGRAM_READY sent.
    Ready,
}

/// Which closed-loop (or predictive) branch fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Hold,
    Drain,
    Fill,
    Idle,
}

#[derive(Clone, Debug)]
pub struct LevelController {
    valve_open: bool,
    target: usize,
    pumps_on: usize,
    prev_level: f64,
    bank: PumpBank,
}

impl LevelController {
    pub fn new(cfg: &BoilerConfig) -> Self {
        let n1 = cfg.minimal_normal_level;
        let n2 = cfg.maximal_normal_level;
        Self {
            valve_open: false,
            target: cfg.initial_pump_target(),
            pumps_on: 0,
            prev_level: n1 + (n2 - n1) / 2.0,
            bank: PumpBank::new(cfg.pump_count()),
        }
    }

    pub fn valve_open(&self) -> bool {
        self.valve_open
    }

    /// Number of pumps (from index 0) the regulator wants open.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Number of pumps actually commanded open.
    pub fn pumps_on(&self) -> usize {
        self.pumps_on
    }

    pub fn prev_level(&self) -> f64 {
        self.prev_level
    }

    pub fn commanded(&self) -> &[bool] {
        self.bank.commanded()
    }

    /// Brings the boiler into [N1, N2] before the units are declared ready.
    pub fn fill(
        &mut self,
        cfg: &BoilerConfig,
        readings: &Readings,
        registry: &FailureRegistry,
        out: &mut Mailbox,
    ) -> FillStep {
        let level = readings.level;
        let step = if level >= cfg.maximal_normal_level {
            self.set_valve(true, out);
            self.bank.close_from(0, registry, &readings.pumps, out);
            FillStep::Draining
        } else if level <= cfg.minimal_normal_level {
            self.set_valve(false, out);
            self.bank
                .open_below(cfg.pump_count(), registry, &readings.pumps, out);
            FillStep::Filling
        } else if readings.any_pump_open() {
            self.set_valve(false, out);
            self.bank.close_reported_open(&readings.pumps, out);
            FillStep::Settling
        } else {
            out.send(Message::ProgramReady);
            FillStep::Ready
        };
        self.pumps_on = self.bank.open_count();
        debug!(level, ?step, pumps_on = self.pumps_on, "fill");
        step
    }

    /// Closed-loop regulation on the measured level.
    ///
    /// The pump target moves by at most one per tick, and only in the direction
    /// the level trend calls for.
    pub fn regulate(
        &mut self,
        cfg: &BoilerConfig,
        readings: &Readings,
        registry: &FailureRegistry,
        out: &mut Mailbox,
    ) -> Branch {
        let level = readings.level;
        let horizon = cfg.maximal_steam_rate * TICK_SECONDS;
        let cap = cfg.total_capacity(self.target);
        let n1 = cfg.minimal_normal_level;
        let n2 = cfg.maximal_normal_level;
        let rising = level > self.prev_level;
        let falling = level < self.prev_level;

        let branch = if level + cap <= n2 && level - horizon - LOW_LEVEL_MARGIN >= n1 {
            self.set_valve(false, out);
            if rising {
                self.step_down();
            }
            self.bank.close_from(self.target, registry, &readings.pumps, out);
            Branch::Hold
        } else if level + cap >= n2 {
            self.set_valve(true, out);
            if rising {
                self.step_down();
            }
            self.bank.close_from(self.target, registry, &readings.pumps, out);
            Branch::Drain
        } else if level - horizon - LOW_LEVEL_MARGIN <= n1 {
            self.set_valve(false, out);
            if falling {
                self.step_up(cfg);
            }
            self.bank
                .open_below(self.fill_reach(cfg), registry, &readings.pumps, out);
            Branch::Fill
        } else {
            Branch::Idle
        };

        self.pumps_on = self.bank.open_count();
        self.prev_level = level;
        debug!(
            level,
            ?branch,
            target = self.target,
            pumps_on = self.pumps_on,
            valve_open = self.valve_open,
            "regulate"
        );
        branch
    }

    /// Open-loop regulation on an estimated level, for when the level sensor is
    /// not trusted. Returns the estimate for the next tick.
    pub fn regulate_predicted(
        &mut self,
        cfg: &BoilerConfig,
        predicted: f64,
        readings: &Readings,
        registry: &FailureRegistry,
        out: &mut Mailbox,
    ) -> f64 {
        let horizon = readings.steam * TICK_SECONDS;
        let cap = cfg.total_capacity(self.target);

        let branch = if predicted - horizon < cfg.minimal_normal_level {
            self.step_up(cfg);
            self.bank
                .open_below(self.fill_reach(cfg), registry, &readings.pumps, out);
            Branch::Fill
        } else if predicted + cap > cfg.maximal_normal_level {
            self.step_down();
            self.bank.close_from(self.target, registry, &readings.pumps, out);
            Branch::Drain
        } else {
            Branch::Idle
        };

        self.pumps_on = self.bank.open_count();
        let next = predicted - horizon + cfg.total_capacity(self.pumps_on) * TICK_SECONDS;
        debug!(
            predicted,
            next,
            ?branch,
            target = self.target,
            pumps_on = self.pumps_on,
            "regulate on prediction"
        );
        next
    }

    fn set_valve(&mut self, open: bool, out: &mut Mailbox) {
        if self.valve_open != open {
            self.valve_open = open;
            out.send(Message::Valve);
        }
    }

    fn step_down(&mut self) {
        self.target = self.target.saturating_sub(1);
    }

    fn step_up(&mut self, cfg: &BoilerConfig) {
        self.target = (self.target + 1).min(cfg.pump_count());
    }

    // A zero target still drives pump 0 when filling.
    fn fill_reach(&self, cfg: &BoilerConfig) -> usize {
        self.target.max(1).min(cfg.pump_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BoilerConfig {
        BoilerConfig::default()
    }

    fn readings(level: f64, steam: f64, pumps: &[bool]) -> Readings {
        Readings {
            level,
            steam,
            pumps: pumps.to_vec(),
            controllers: pumps.to_vec(),
        }
    }

    fn sent(out: &Mailbox) -> Vec<Message> {
        out.iter().copied().collect()
    }

    #[test]
    fn starts_closed_with_midpoint_history() {
        let c = cfg();
        let lc = LevelController::new(&c);
        assert!(!lc.valve_open());
        assert_eq!(lc.target(), 0);
        assert_eq!(lc.prev_level(), 500.0);
        assert_eq!(lc.commanded(), &[false, false]);
    }

    #[test]
    fn fill_below_n1_opens_every_pump() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        let step = lc.fill(&c, &readings(150.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(step, FillStep::Filling);
        assert_eq!(sent(&out), vec![Message::OpenPump(0), Message::OpenPump(1)]);
        assert_eq!(lc.pumps_on(), 2);
    }

    #[test]
    fn fill_above_n2_opens_valve_once() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        assert_eq!(
            lc.fill(&c, &readings(850.0, 0.0, &[false, false]), &reg, &mut out),
            FillStep::Draining
        );
        assert_eq!(sent(&out), vec![Message::Valve]);

        out.clear();
        lc.fill(&c, &readings(820.0, 0.0, &[false, false]), &reg, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn fill_in_band_settles_then_reports_ready() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        lc.fill(&c, &readings(150.0, 0.0, &[false, false]), &reg, &mut out);

        out.clear();
        let step = lc.fill(&c, &readings(400.0, 0.0, &[true, true]), &reg, &mut out);
        assert_eq!(step, FillStep::Settling);
        assert_eq!(sent(&out), vec![Message::ClosePump(0), Message::ClosePump(1)]);

        out.clear();
        let step = lc.fill(&c, &readings(400.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(step, FillStep::Ready);
        assert_eq!(sent(&out), vec![Message::ProgramReady]);
    }

    #[test]
    fn falling_level_near_n1_adds_a_pump() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        let branch = lc.regulate(&c, &readings(400.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(branch, Branch::Fill);
        assert_eq!(lc.target(), 1);
        assert_eq!(sent(&out), vec![Message::OpenPump(0)]);
        assert_eq!(lc.prev_level(), 400.0);
    }

    #[test]
    fn zero_target_still_drives_pump_zero_when_filling() {
        // midpoint 250 is already under N1 + 5W + 3, and a flat level keeps the target at 0
        let c = BoilerConfig {
            maximal_normal_level: 300.0,
            ..cfg()
        };
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        let branch = lc.regulate(&c, &readings(250.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(branch, Branch::Fill);
        assert_eq!(lc.target(), 0);
        assert_eq!(sent(&out), vec![Message::OpenPump(0)]);
        assert_eq!(lc.pumps_on(), 1);
    }

    #[test]
    fn high_rising_level_opens_valve_and_sheds_a_pump() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        lc.regulate(&c, &readings(400.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(lc.target(), 1);

        out.clear();
        let branch = lc.regulate(&c, &readings(850.0, 0.0, &[true, false]), &reg, &mut out);
        assert_eq!(branch, Branch::Drain);
        assert!(lc.valve_open());
        assert_eq!(lc.target(), 0);
        assert_eq!(sent(&out), vec![Message::Valve, Message::ClosePump(0)]);
    }

    #[test]
    fn comfortable_level_closes_valve() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        lc.regulate(&c, &readings(850.0, 0.0, &[false, false]), &reg, &mut out);
        assert!(lc.valve_open());

        out.clear();
        let branch = lc.regulate(&c, &readings(700.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(branch, Branch::Hold);
        assert!(!lc.valve_open());
        assert_eq!(sent(&out), vec![Message::Valve]);
    }

    // Pins the 5 s horizon and the 3 litre margin: with W = 50 the hold/fill
    // boundary sits at N1 + 250 + 3 = 453.
    #[test]
    fn hold_fill_boundary_is_pinned() {
        let c = cfg();
        let reg = FailureRegistry::new(2);

        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        assert_eq!(
            lc.regulate(&c, &readings(453.0, 0.0, &[false, false]), &reg, &mut out),
            Branch::Hold
        );

        let mut lc = LevelController::new(&c);
        assert_eq!(
            lc.regulate(&c, &readings(452.0, 0.0, &[false, false]), &reg, &mut out),
            Branch::Fill
        );
    }

    #[test]
    fn predicted_level_integrates_inflow_minus_steam() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();

        // 300 - 2*5 = 290 >= 200 and 300 + 0 <= 800: no branch, no pumps
        let idle = readings(0.0, 2.0, &[false, false]);
        let next = lc.regulate_predicted(&c, 300.0, &idle, &reg, &mut out);
        assert_eq!(next, 290.0);
        assert!(out.is_empty());

        // 205 - 10 < 200: one more pump, and its 4 L/s over 5 s is credited
        let next = lc.regulate_predicted(&c, 205.0, &idle, &reg, &mut out);
        assert_eq!(lc.target(), 1);
        assert_eq!(lc.pumps_on(), 1);
        assert_eq!(next, 205.0 - 10.0 + 20.0);
        assert_eq!(sent(&out), vec![Message::OpenPump(0)]);
    }

    #[test]
    fn predicted_high_level_sheds_pumps() {
        let c = cfg();
        let reg = FailureRegistry::new(2);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        lc.regulate_predicted(&c, 100.0, &readings(0.0, 0.0, &[false, false]), &reg, &mut out);
        lc.regulate_predicted(&c, 100.0, &readings(0.0, 0.0, &[true, false]), &reg, &mut out);
        assert_eq!(lc.target(), 2);
        assert_eq!(lc.pumps_on(), 2);

        out.clear();
        let both_open = readings(0.0, 0.0, &[true, true]);
        let next = lc.regulate_predicted(&c, 795.0, &both_open, &reg, &mut out);
        assert_eq!(lc.target(), 1);
        assert_eq!(sent(&out), vec![Message::ClosePump(1)]);
        assert_eq!(next, 795.0 + 20.0);
    }

    #[test]
    fn stuck_failed_pump_is_skipped_when_filling() {
        let c = cfg();
        let mut reg = FailureRegistry::new(2);
        reg.mark_pump_failed(0);
        let mut lc = LevelController::new(&c);
        let mut out = Mailbox::new();
        lc.regulate(&c, &readings(300.0, 0.0, &[false, false]), &reg, &mut out);
        assert_eq!(lc.target(), 1);
        assert!(out.is_empty());
        assert_eq!(lc.pumps_on(), 0);
    }
}
