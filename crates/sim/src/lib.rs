//! Simulated steam boiler and its physical units.
//!
//! The plant answers the controller the way the real units would: it asks to
//! be started, acknowledges every failure the controller detects, and keeps
//! announcing repairs until they are acknowledged.

mod sensor;

pub use sensor::{Sensor, SensorFault};

use mailbox::{BoilerConfig, Mailbox, Message, Mode};
use serde::{Deserialize, Serialize};

/// Seconds of physics per control cycle.
const TICK_SECONDS: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantParams {
    /// Evacuation valve outflow, litres per second.
    pub valve_rate: f64,
    /// Steam output once the boiler runs, litres per second.
    pub steam_target: f64,
    /// Steam output change per tick while ramping.
    pub steam_ramp: f64,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            valve_rate: 10.0,
            steam_target: 2.0,
            steam_ramp: 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpFault {
    #[default]
    None,
    StuckOpen,
    StuckClosed,
    /// The pump obeys but its flow controller reports the opposite.
    ControllerLies,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PumpUnit {
    pub open: bool,
    pub fault: PumpFault,
    commanded: bool,
}

impl PumpUnit {
    fn settle(&mut self) {
        self.open = match self.fault {
            PumpFault::StuckOpen => true,
            PumpFault::StuckClosed => false,
            PumpFault::None | PumpFault::ControllerLies => self.commanded,
        };
    }

    fn flowing(&self) -> bool {
        match self.fault {
            PumpFault::ControllerLies => !self.open,
            _ => self.open,
        }
    }
}

/// Start-up handshake as seen from the physical units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Waiting,
    Signalled,
    Running,
}

/// What a unit tells the controller about its own failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Report {
    #[default]
    Quiet,
    Acknowledging,
    Repairing,
}

impl Report {
    fn detected(&mut self) {
        if *self == Report::Quiet {
            *self = Report::Acknowledging;
        }
    }

    fn repaired(&mut self) {
        if *self == Report::Acknowledging {
            *self = Report::Repairing;
        }
    }

    fn acknowledged(&mut self) {
        if *self == Report::Repairing {
            *self = Report::Quiet;
        }
    }

    fn message(self, ack: Message, repaired: Message) -> Option<Message> {
        match self {
            Report::Quiet => None,
            Report::Acknowledging => Some(ack),
            Report::Repairing => Some(repaired),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoilerPlant {
    pub config: BoilerConfig,
    pub params: PlantParams,
    pub level: f64,
    pub steam: f64,
    pub valve_open: bool,
    pub pumps: Vec<PumpUnit>,
    pub level_sensor: Sensor,
    pub steam_sensor: Sensor,
    /// Drops the last pump-controller reading from every batch.
    pub lose_transmission: bool,
    protocol: Protocol,
    stopped: bool,
    level_report: Report,
    steam_report: Report,
    pump_reports: Vec<Report>,
    controller_reports: Vec<Report>,
}

impl BoilerPlant {
    pub fn new(config: BoilerConfig, level: f64, seed: u64) -> Self {
        let p = config.pump_count();
        Self {
            params: PlantParams::default(),
            level,
            steam: 0.0,
            valve_open: false,
            pumps: vec![PumpUnit::default(); p],
            level_sensor: Sensor::new(seed ^ 0xA1),
            steam_sensor: Sensor::new(seed ^ 0xB2),
            lose_transmission: false,
            protocol: Protocol::Waiting,
            stopped: false,
            level_report: Report::Quiet,
            steam_report: Report::Quiet,
            pump_reports: vec![Report::Quiet; p],
            controller_reports: vec![Report::Quiet; p],
            config,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn open_pumps(&self) -> usize {
        self.pumps.iter().filter(|p| p.open).count()
    }

    /// Batch the units send for the coming tick.
    pub fn inbound(&mut self) -> Mailbox {
        let level = self.level_sensor.read(self.level);
        let steam = self.steam_sensor.read(self.steam);
        let pumps: Vec<bool> = self.pumps.iter().map(|p| p.open).collect();
        let mut controllers: Vec<bool> = self.pumps.iter().map(PumpUnit::flowing).collect();
        if self.lose_transmission {
            controllers.pop();
        }
        let mut batch = Mailbox::with_readings(level, steam, &pumps, &controllers);

        match self.protocol {
            Protocol::Waiting => batch.send(Message::SteamBoilerWaiting),
            Protocol::Signalled => {
                batch.send(Message::PhysicalUnitsReady);
                self.protocol = Protocol::Running;
            }
            Protocol::Running => {}
        }

        batch.extend(self.level_report.message(
            Message::LevelFailureAcknowledgement,
            Message::LevelRepaired,
        ));
        batch.extend(self.steam_report.message(
            Message::SteamOutcomeFailureAcknowledgement,
            Message::SteamRepaired,
        ));
        for (i, r) in self.pump_reports.iter().enumerate() {
            batch.extend(r.message(
                Message::PumpFailureAcknowledgement(i),
                Message::PumpRepaired(i),
            ));
        }
        for (i, r) in self.controller_reports.iter().enumerate() {
            batch.extend(r.message(
                Message::PumpControlFailureAcknowledgement(i),
                Message::PumpControlRepaired(i),
            ));
        }
        batch
    }

    /// Applies the controller's commands, then integrates one tick of physics.
    pub fn apply(&mut self, outbound: &Mailbox) {
        for msg in outbound {
            match *msg {
                Message::Valve => self.valve_open = !self.valve_open,
                Message::OpenPump(i) => self.command_pump(i, true),
                Message::ClosePump(i) => self.command_pump(i, false),
                Message::ProgramReady if self.protocol == Protocol::Waiting => {
                    self.protocol = Protocol::Signalled;
                }
                Message::Mode(Mode::EmergencyStop) => self.stopped = true,
                Message::LevelFailureDetection => self.level_report.detected(),
                Message::SteamFailureDetection => self.steam_report.detected(),
                Message::PumpFailureDetection(i) => {
                    if let Some(r) = self.pump_reports.get_mut(i) {
                        r.detected();
                    }
                }
                Message::PumpControlFailureDetection(i) => {
                    if let Some(r) = self.controller_reports.get_mut(i) {
                        r.detected();
                    }
                }
                Message::LevelRepairedAcknowledgement => self.level_report.acknowledged(),
                Message::SteamRepairedAcknowledgement => self.steam_report.acknowledged(),
                Message::PumpRepairedAcknowledgement(i) => {
                    if let Some(r) = self.pump_reports.get_mut(i) {
                        r.acknowledged();
                    }
                }
                Message::PumpControlRepairedAcknowledgement(i) => {
                    if let Some(r) = self.controller_reports.get_mut(i) {
                        r.acknowledged();
                    }
                }
                _ => {}
            }
        }
        self.step();
    }

    /// One tick of water balance.
    pub fn step(&mut self) {
        let running = self.protocol == Protocol::Running && !self.stopped;
        let target = if running { self.params.steam_target } else { 0.0 };
        self.steam = if self.steam < target {
            (self.steam + self.params.steam_ramp).min(target)
        } else {
            (self.steam - self.params.steam_ramp).max(target)
        };

        let inflow: f64 = self
            .pumps
            .iter()
            .zip(&self.config.pump_capacities)
            .filter(|(p, _)| p.open)
            .map(|(_, c)| c)
            .sum();
        let valve = if self.valve_open { self.params.valve_rate } else { 0.0 };
        let net = (inflow - self.steam - valve) * TICK_SECONDS;
        self.level = (self.level + net).clamp(0.0, self.config.capacity);
    }

    pub fn fail_level_sensor(&mut self, fault: SensorFault) {
        self.level_sensor.fault = fault;
    }

    pub fn repair_level_sensor(&mut self) {
        self.level_sensor.fault = SensorFault::None;
        self.level_report.repaired();
    }

    pub fn fail_steam_sensor(&mut self, fault: SensorFault) {
        self.steam_sensor.fault = fault;
    }

    pub fn repair_steam_sensor(&mut self) {
        self.steam_sensor.fault = SensorFault::None;
        self.steam_report.repaired();
    }

    pub fn fail_pump(&mut self, i: usize, fault: PumpFault) {
        if let Some(p) = self.pumps.get_mut(i) {
            p.fault = fault;
            p.settle();
        }
    }

    /// Clears the pump's fault; it resumes following its last command.
    pub fn repair_pump(&mut self, i: usize) {
        if let Some(p) = self.pumps.get_mut(i) {
            p.fault = PumpFault::None;
            p.settle();
        }
        if let Some(r) = self.pump_reports.get_mut(i) {
            r.repaired();
        }
        if let Some(r) = self.controller_reports.get_mut(i) {
            r.repaired();
        }
    }

    fn command_pump(&mut self, i: usize, open: bool) {
        if let Some(p) = self.pumps.get_mut(i) {
            p.commanded = open;
            p.settle();
        }
    }
}
