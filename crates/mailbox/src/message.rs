use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode of the controller, as announced in `MODE` messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Initialisation,
    Normal,
    Degraded,
    Rescue,
    EmergencyStop,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Initialisation => "INITIALISATION",
            Mode::Normal => "NORMAL",
            Mode::Degraded => "DEGRADED",
            Mode::Rescue => "RESCUE",
            Mode::EmergencyStop => "EMERGENCY_STOP",
        }
    }

    /// EMERGENCY_STOP has no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Mode::EmergencyStop)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field-less tag of a [`Message`], used for counting and matching by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    // Physical units -> program
    Level,
    Steam,
    PumpState,
    PumpControlState,
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    PumpRepaired,
    PumpControlRepaired,
    SteamRepaired,
    LevelRepaired,
    PumpFailureAcknowledgement,
    PumpControlFailureAcknowledgement,
    SteamOutcomeFailureAcknowledgement,
    LevelFailureAcknowledgement,
    // Program -> physical units
    Mode,
    Valve,
    OpenPump,
    ClosePump,
    ProgramReady,
    LevelFailureDetection,
    SteamFailureDetection,
    PumpFailureDetection,
    PumpControlFailureDetection,
    PumpRepairedAcknowledgement,
    PumpControlRepairedAcknowledgement,
    SteamRepairedAcknowledgement,
    LevelRepairedAcknowledgement,
}

/// One message exchanged with the physical units during a tick.
///
/// Pump-indexed variants carry the pump number (`0..P`). Readings carry the
/// raw value as transmitted; rounding is the receiver's business.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Level(f64),
    Steam(f64),
    PumpState { pump: usize, open: bool },
    PumpControlState { pump: usize, flowing: bool },
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    PumpRepaired(usize),
    PumpControlRepaired(usize),
    SteamRepaired,
    LevelRepaired,
    PumpFailureAcknowledgement(usize),
    PumpControlFailureAcknowledgement(usize),
    SteamOutcomeFailureAcknowledgement,
    LevelFailureAcknowledgement,

    Mode(Mode),
    Valve,
    OpenPump(usize),
    ClosePump(usize),
    ProgramReady,
    LevelFailureDetection,
    SteamFailureDetection,
    PumpFailureDetection(usize),
    PumpControlFailureDetection(usize),
    PumpRepairedAcknowledgement(usize),
    PumpControlRepairedAcknowledgement(usize),
    SteamRepairedAcknowledgement,
    LevelRepairedAcknowledgement,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Level(_) => MessageKind::Level,
            Message::Steam(_) => MessageKind::Steam,
            Message::PumpState { .. } => MessageKind::PumpState,
            Message::PumpControlState { .. } => MessageKind::PumpControlState,
            Message::SteamBoilerWaiting => MessageKind::SteamBoilerWaiting,
            Message::PhysicalUnitsReady => MessageKind::PhysicalUnitsReady,
            Message::PumpRepaired(_) => MessageKind::PumpRepaired,
            Message::PumpControlRepaired(_) => MessageKind::PumpControlRepaired,
            Message::SteamRepaired => MessageKind::SteamRepaired,
            Message::LevelRepaired => MessageKind::LevelRepaired,
            Message::PumpFailureAcknowledgement(_) => MessageKind::PumpFailureAcknowledgement,
            Message::PumpControlFailureAcknowledgement(_) => {
                MessageKind::PumpControlFailureAcknowledgement
            }
            Message::SteamOutcomeFailureAcknowledgement => {
                MessageKind::SteamOutcomeFailureAcknowledgement
            }
            Message::LevelFailureAcknowledgement => MessageKind::LevelFailureAcknowledgement,
            Message::Mode(_) => MessageKind::Mode,
            Message::Valve => MessageKind::Valve,
            Message::OpenPump(_) => MessageKind::OpenPump,
            Message::ClosePump(_) => MessageKind::ClosePump,
            Message::ProgramReady => MessageKind::ProgramReady,
            Message::LevelFailureDetection => MessageKind::LevelFailureDetection,
            Message::SteamFailureDetection => MessageKind::SteamFailureDetection,
            Message::PumpFailureDetection(_) => MessageKind::PumpFailureDetection,
            Message::PumpControlFailureDetection(_) => MessageKind::PumpControlFailureDetection,
            Message::PumpRepairedAcknowledgement(_) => MessageKind::PumpRepairedAcknowledgement,
            Message::PumpControlRepairedAcknowledgement(_) => {
                MessageKind::PumpControlRepairedAcknowledgement
            }
            Message::SteamRepairedAcknowledgement => MessageKind::SteamRepairedAcknowledgement,
            Message::LevelRepairedAcknowledgement => MessageKind::LevelRepairedAcknowledgement,
        }
    }
}
