//! Per-tick state threaded through every mode handler.
//!
//! A `TickContext` lives for exactly one call to
//! [`SteamBoilerController::clock`](crate::SteamBoilerController::clock). It
//! holds the inbound batch, the outbound batch being built, and the readings
//! parsed once the transmission check passed.

use mailbox::{Mailbox, Message};
use safety::{Readings, RepairReport};

pub struct TickContext<'a> {
    pub inbound: &'a Mailbox,
    pub readings: Readings,
    pub(crate) outbound: &'a mut Mailbox,
    /// Repairs seen this tick. Filled on first use so a handler chain that
    /// passes through two modes observes the notifications only once.
    pub(crate) repairs: Option<RepairReport>,
}

impl<'a> TickContext<'a> {
    pub fn new(inbound: &'a Mailbox, outbound: &'a mut Mailbox, readings: Readings) -> Self {
        Self {
            inbound,
            readings,
            outbound,
            repairs: None,
        }
    }

    pub fn send(&mut self, msg: Message) {
        self.outbound.send(msg);
    }

    pub fn received(&self, msg: &Message) -> bool {
        self.inbound.contains(msg)
    }
}
