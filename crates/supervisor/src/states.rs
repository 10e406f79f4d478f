//! Mode handlers and the detector wrappers they share.
//!
//! Every detector here records what it found in the failure registry and
//! emits the detection message the first time a unit is found failed. The
//! handlers only sequence detectors and stop at the first fatal outcome.

use crate::context::TickContext;
use crate::{OperatingMode, SteamBoilerController};
use controller::FillStep;
use mailbox::{Message, Mode};
use safety::repair::{self, Promotion};
use safety::{MeasuringVerdict, RepairReport};
use tracing::{debug, warn};

impl SteamBoilerController {
    pub(crate) fn initialisation(&mut self, ctx: &mut TickContext<'_>) {
        if self.level_sensor(ctx) {
            self.emergency_stop(ctx);
            return;
        }

        if ctx.received(&Message::SteamBoilerWaiting) {
            if ctx.readings.steam != 0.0 {
                warn!(steam = ctx.readings.steam, "steam reported before the boiler started");
                self.registry.mark_steam_failed();
                ctx.send(Message::SteamFailureDetection);
                self.emergency_stop(ctx);
                return;
            }
            let step = self
                .levels
                .fill(&self.config, &ctx.readings, &self.registry, ctx.outbound);
            if step == FillStep::Ready {
                debug!(level = ctx.readings.level, "boiler filled, waiting for units");
            }
        } else if ctx.received(&Message::PhysicalUnitsReady) {
            let pump = self.pump_check(ctx);
            let controller = self.controller_check(ctx);
            if pump.is_some() || controller.is_some() {
                self.transition(OperatingMode::Degraded, ctx);
            } else {
                self.transition(OperatingMode::Normal, ctx);
            }
        }
    }

    pub(crate) fn normal(&mut self, ctx: &mut TickContext<'_>) {
        let level_failed = self.level_sensor(ctx);
        let steam_failed = self.steam_sensor(ctx);
        let within = self.config.within_limits(ctx.readings.level);
        match safety::classify_measuring(Mode::Normal, level_failed, steam_failed, within) {
            MeasuringVerdict::EmergencyStop => return self.emergency_stop(ctx),
            MeasuringVerdict::Degraded => return self.transition(OperatingMode::Degraded, ctx),
            MeasuringVerdict::Rescue => return self.enter_rescue(ctx),
            MeasuringVerdict::Healthy => {}
        }

        if self.pump_check(ctx).is_some() || self.controller_check(ctx).is_some() {
            self.transition(OperatingMode::Degraded, ctx);
            return;
        }

        if !self.limits_hold(ctx) {
            return;
        }

        self.levels
            .regulate(&self.config, &ctx.readings, &self.registry, ctx.outbound);
    }

    pub(crate) fn degraded(&mut self, ctx: &mut TickContext<'_>) {
        self.observe_repairs(ctx);
        let level_failed = self.level_sensor(ctx);
        let steam_failed = self.steam_sensor(ctx);

        if level_failed && !steam_failed {
            self.enter_rescue(ctx);
            return;
        }

        if ctx.received(&Message::SteamOutcomeFailureAcknowledgement) && level_failed {
            self.emergency_stop(ctx);
            return;
        }

        let acknowledged = self
            .registry
            .failed_pumps()
            .any(|i| ctx.received(&Message::PumpFailureAcknowledgement(i)));
        if acknowledged {
            if self.limits_hold(ctx) {
                self.levels
                    .regulate(&self.config, &ctx.readings, &self.registry, ctx.outbound);
            }
            return;
        }

        if !self.limits_hold(ctx) {
            return;
        }

        if repair::from_degraded(&self.registry) == Some(Promotion::Normal) {
            self.transition(OperatingMode::Normal, ctx);
        }
    }

    fn enter_rescue(&mut self, ctx: &mut TickContext<'_>) {
        let predicted_level = self.levels.prev_level();
        self.transition(OperatingMode::Rescue { predicted_level }, ctx);
        self.rescue(ctx, predicted_level);
    }

    pub(crate) fn rescue(&mut self, ctx: &mut TickContext<'_>, predicted_level: f64) {
        let repairs = self.observe_repairs(ctx);

        let steam_failed = self.steam_sensor(ctx);
        let controller = self.controller_check(ctx);
        if steam_failed || controller.is_some() {
            self.emergency_stop(ctx);
            return;
        }

        let mismatch = self.pump_check(ctx);
        match repair::from_rescue(&self.registry, &repairs, mismatch) {
            Some(Promotion::Degraded) => return self.transition(OperatingMode::Degraded, ctx),
            Some(Promotion::Normal) => return self.transition(OperatingMode::Normal, ctx),
            None => {}
        }

        if ctx.received(&Message::LevelFailureAcknowledgement) {
            let next = self.levels.regulate_predicted(
                &self.config,
                predicted_level,
                &ctx.readings,
                &self.registry,
                ctx.outbound,
            );
            self.mode = OperatingMode::Rescue {
                predicted_level: next,
            };
        }
    }

    /// Level sensor health: a failing reading latches the level entry until a repair.
    fn level_sensor(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let level = ctx.readings.level;
        if safety::level_sensor_failed(&self.config, level) && self.registry.mark_level_failed() {
            warn!(level, "level sensor failure");
            ctx.send(Message::LevelFailureDetection);
        }
        self.registry.level().is_failed()
    }

    fn steam_sensor(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let steam = ctx.readings.steam;
        if safety::steam_sensor_failed(&self.config, steam) && self.registry.mark_steam_failed() {
            warn!(steam, "steam sensor failure");
            ctx.send(Message::SteamFailureDetection);
        }
        self.registry.steam().is_failed()
    }

    fn pump_check(&mut self, ctx: &mut TickContext<'_>) -> Option<usize> {
        let pump = safety::find_pump_failure(self.levels.commanded(), &ctx.readings.pumps)?;
        if self.registry.mark_pump_failed(pump) {
            warn!(pump, "pump failure");
            ctx.send(Message::PumpFailureDetection(pump));
        }
        Some(pump)
    }

    fn controller_check(&mut self, ctx: &mut TickContext<'_>) -> Option<usize> {
        let pump =
            safety::find_pump_controller_failure(&ctx.readings.pumps, &ctx.readings.controllers)?;
        if self.registry.mark_controller_failed(pump) {
            warn!(pump, "pump controller failure");
            ctx.send(Message::PumpControlFailureDetection(pump));
        }
        Some(pump)
    }

    /// Stops the boiler when the measured level is past M1 or M2.
    fn limits_hold(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let level = ctx.readings.level;
        if self.config.within_limits(level) {
            return true;
        }
        warn!(level, "water level outside safety limits");
        self.emergency_stop(ctx);
        false
    }

    fn observe_repairs(&mut self, ctx: &mut TickContext<'_>) -> RepairReport {
        if let Some(report) = &ctx.repairs {
            return report.clone();
        }
        let report = repair::observe(ctx.inbound, &mut self.registry);
        for ack in report.acknowledgements() {
            ctx.send(ack);
        }
        ctx.repairs = Some(report.clone());
        report
    }
}
