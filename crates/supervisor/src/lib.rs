//! Mode state machine for the steam boiler controller.
//!
//! ```text
//!  INITIALISATION ──[units ready]──▶ NORMAL ◀──[repaired]── DEGRADED
//!        │                            │  ▲                    ▲  │
//!        │                     [level lost] [level repaired]  │  │
//!        │                            ▼  │                    │  │
//!        │                          RESCUE ──[level repaired]─┘  │
//!        │                                                       │
//!  any mode ──[transmission failure | limit crossed]──▶ EMERGENCY_STOP
//! ```
//!
//! One call to [`SteamBoilerController::clock`] is one 5 second cycle: the
//! inbound batch is checked and parsed, the handler for the current mode runs,
//! and every command it decides on lands in the outbound batch.

pub mod context;
mod states;

pub use context::TickContext;

use controller::LevelController;
use mailbox::{BoilerConfig, ConfigError, Mailbox, Message, Mode};
use safety::{transmission, FailureRegistry};
use tracing::{info, warn};

/// The operating mode together with the data only that mode needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperatingMode {
    Initialisation,
    Normal,
    Degraded,
    Rescue { predicted_level: f64 },
    EmergencyStop,
}

impl OperatingMode {
    pub fn mode(self) -> Mode {
        match self {
            OperatingMode::Initialisation => Mode::Initialisation,
            OperatingMode::Normal => Mode::Normal,
            OperatingMode::Degraded => Mode::Degraded,
            OperatingMode::Rescue { .. } => Mode::Rescue,
            OperatingMode::EmergencyStop => Mode::EmergencyStop,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SteamBoilerController {
    config: BoilerConfig,
    mode: OperatingMode,
    levels: LevelController,
    registry: FailureRegistry,
}

impl SteamBoilerController {
    pub fn new(config: BoilerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            levels: LevelController::new(&config),
            registry: FailureRegistry::new(config.pump_count()),
            mode: OperatingMode::Initialisation,
            config,
        })
    }

    pub fn config(&self) -> &BoilerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn registry(&self) -> &FailureRegistry {
        &self.registry
    }

    pub fn levels(&self) -> &LevelController {
        &self.levels
    }

    /// Estimated water level while in RESCUE.
    pub fn predicted_level(&self) -> Option<f64> {
        match self.mode {
            OperatingMode::Rescue { predicted_level } => Some(predicted_level),
            _ => None,
        }
    }

    pub fn status_message(&self) -> String {
        self.mode().name().to_string()
    }

    /// Runs one control cycle.
    pub fn clock(&mut self, inbound: &Mailbox, outbound: &mut Mailbox) {
        let readings = match transmission::check(&self.config, inbound) {
            Ok(readings) => readings,
            Err(fault) => {
                warn!(%fault, "transmission failure");
                self.force_stop(outbound);
                return;
            }
        };

        let mut ctx = TickContext::new(inbound, outbound, readings);
        match self.mode {
            OperatingMode::Initialisation => {
                self.initialisation(&mut ctx);
                if self.mode == OperatingMode::Initialisation {
                    ctx.send(Message::Mode(Mode::Initialisation));
                }
            }
            OperatingMode::Normal => self.normal(&mut ctx),
            OperatingMode::Degraded => self.degraded(&mut ctx),
            OperatingMode::Rescue { predicted_level } => self.rescue(&mut ctx, predicted_level),
            OperatingMode::EmergencyStop => {}
        }
    }

    /// Convenience form of [`clock`](Self::clock) returning a fresh batch.
    pub fn tick(&mut self, inbound: &Mailbox) -> Mailbox {
        let mut outbound = Mailbox::new();
        self.clock(inbound, &mut outbound);
        outbound
    }

    /// Moves to `next`, announcing the new mode when it differs from the current one.
    /// Nothing leaves EMERGENCY_STOP.
    fn transition(&mut self, next: OperatingMode, ctx: &mut TickContext<'_>) {
        if self.mode.mode().is_terminal() {
            return;
        }
        let from = self.mode.mode();
        self.mode = next;
        if from != next.mode() {
            info!("mode transition: {} -> {}", from, next.mode());
            ctx.send(Message::Mode(next.mode()));
        }
    }

    fn emergency_stop(&mut self, ctx: &mut TickContext<'_>) {
        self.transition(OperatingMode::EmergencyStop, ctx);
    }

    // Transmission failures announce the stop even when already stopped.
    fn force_stop(&mut self, outbound: &mut Mailbox) {
        if !self.mode.mode().is_terminal() {
            info!("mode transition: {} -> {}", self.mode.mode(), Mode::EmergencyStop);
        }
        self.mode = OperatingMode::EmergencyStop;
        outbound.send(Message::Mode(Mode::EmergencyStop));
    }
}
