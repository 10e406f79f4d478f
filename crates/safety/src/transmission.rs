use mailbox::{BoilerConfig, Mailbox, Message, MessageKind};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransmissionFault {
    #[error("expected {expected} {kind:?} message(s), received {found}")]
    Count {
        kind: MessageKind,
        expected: usize,
        found: usize,
    },
    #[error("{kind:?} message names pump {pump} but the boiler has {pumps} pump(s)")]
    UnknownPump {
        kind: MessageKind,
        pump: usize,
        pumps: usize,
    },
    #[error("{kind:?} message for pump {pump} received twice")]
    DuplicatePump { kind: MessageKind, pump: usize },
}

/// Readings extracted from a well-formed batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Readings {
    /// Water level, rounded half-up to whole litres.
    pub level: f64,
    pub steam: f64,
    /// Reported physical state of each pump (open = true).
    pub pumps: Vec<bool>,
    /// Reported state of each pump controller (water flowing = true).
    pub controllers: Vec<bool>,
}

impl Readings {
    pub fn any_pump_open(&self) -> bool {
        self.pumps.iter().any(|&open| open)
    }
}

/// Rounds to the nearest whole unit, halves towards positive infinity.
pub fn round_level(raw: f64) -> f64 {
    (raw + 0.5).floor()
}

/// Checks that the batch carries exactly one level reading, one steam reading and
/// one state message per pump and per pump controller, then extracts them.
///
/// Each kind is checked on its own; the first kind found wrong is reported.
pub fn check(config: &BoilerConfig, batch: &Mailbox) -> Result<Readings, TransmissionFault> {
    let pumps = config.pump_count();
    expect_count(batch, MessageKind::Level, 1)?;
    expect_count(batch, MessageKind::Steam, 1)?;
    expect_count(batch, MessageKind::PumpState, pumps)?;
    expect_count(batch, MessageKind::PumpControlState, pumps)?;

    let mut level = 0.0;
    let mut steam = 0.0;
    let mut pump_states: Vec<Option<bool>> = vec![None; pumps];
    let mut controller_states: Vec<Option<bool>> = vec![None; pumps];

    for msg in batch {
        match *msg {
            Message::Level(v) => level = round_level(v),
            Message::Steam(v) => steam = v,
            Message::PumpState { pump, open } => {
                place(&mut pump_states, MessageKind::PumpState, pump, open)?
            }
            Message::PumpControlState { pump, flowing } => place(
                &mut controller_states,
                MessageKind::PumpControlState,
                pump,
                flowing,
            )?,
            _ => {}
        }
    }

    // Counts matched and no slot was written twice, so every slot is filled.
    Ok(Readings {
        level,
        steam,
        pumps: pump_states.into_iter().map(|s| s.unwrap_or(false)).collect(),
        controllers: controller_states
            .into_iter()
            .map(|s| s.unwrap_or(false))
            .collect(),
    })
}

fn expect_count(
    batch: &Mailbox,
    kind: MessageKind,
    expected: usize,
) -> Result<(), TransmissionFault> {
    let found = batch.count(kind);
    if found != expected {
        return Err(TransmissionFault::Count {
            kind,
            expected,
            found,
        });
    }
    Ok(())
}

fn place(
    slots: &mut [Option<bool>],
    kind: MessageKind,
    pump: usize,
    value: bool,
) -> Result<(), TransmissionFault> {
    let pumps = slots.len();
    let slot = slots
        .get_mut(pump)
        .ok_or(TransmissionFault::UnknownPump { kind, pump, pumps })?;
    if slot.is_some() {
        return Err(TransmissionFault::DuplicatePump { kind, pump });
    }
    *slot = Some(value);
    Ok(())
}
