//! Failure detection for the boiler's physical units.
//!
//! The detectors here are pure: they classify readings and report what they
//! found. Emitting detection messages and changing mode is the caller's job.

pub mod registry;
pub mod repair;
pub mod transmission;

pub use registry::{FailureRegistry, UnitHealth};
pub use repair::{Promotion, RepairReport};
pub use transmission::{Readings, TransmissionFault};

use mailbox::{BoilerConfig, Mode};

/// Level readings outside `[0, capacity)` cannot come from a working sensor.
pub fn level_sensor_failed(cfg: &BoilerConfig, level: f64) -> bool {
    !level.is_finite() || level < 0.0 || level >= cfg.capacity
}

/// Steam readings outside `[0, W]` cannot come from a working sensor.
pub fn steam_sensor_failed(cfg: &BoilerConfig, steam: f64) -> bool {
    !steam.is_finite() || steam < 0.0 || steam > cfg.maximal_steam_rate
}

/// Outcome of looking at both measuring units together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasuringVerdict {
    Healthy,
    EmergencyStop,
    Degraded,
    Rescue,
}

/// Combines level and steam sensor failures for the current mode.
///
/// Losing both sensors, or the level sensor before the boiler is running, is
/// fatal. A lost steam sensor degrades unless the level is already past a
/// limit. A lost level sensor in NORMAL sends the controller to RESCUE.
pub fn classify_measuring(
    mode: Mode,
    level_failed: bool,
    steam_failed: bool,
    level_within_limits: bool,
) -> MeasuringVerdict {
    let initialising = mode == Mode::Initialisation;
    if (level_failed && initialising) || (level_failed && steam_failed) {
        MeasuringVerdict::EmergencyStop
    } else if steam_failed && !initialising && !level_within_limits {
        MeasuringVerdict::EmergencyStop
    } else if steam_failed && !initialising {
        MeasuringVerdict::Degraded
    } else if level_failed && mode == Mode::Normal {
        MeasuringVerdict::Rescue
    } else {
        MeasuringVerdict::Healthy
    }
}

/// First pump (in index order) whose reported state disagrees with the last command.
pub fn find_pump_failure(commanded: &[bool], reported: &[bool]) -> Option<usize> {
    first_disagreement(commanded, reported)
}

/// First pump whose controller disagrees with the pump's own reported state.
pub fn find_pump_controller_failure(pumps: &[bool], controllers: &[bool]) -> Option<usize> {
    first_disagreement(pumps, controllers)
}

fn first_disagreement(a: &[bool], b: &[bool]) -> Option<usize> {
    a.iter().zip(b).position(|(x, y)| x != y)
}
