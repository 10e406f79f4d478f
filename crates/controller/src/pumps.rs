use mailbox::{Mailbox, Message};
use safety::FailureRegistry;

/// Last command issued to each pump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PumpBank {
    commanded: Vec<bool>,
}

impl PumpBank {
    pub fn new(pump_count: usize) -> Self {
        Self {
            commanded: vec![false; pump_count],
        }
    }

    pub fn commanded(&self) -> &[bool] {
        &self.commanded
    }

    fn len(&self) -> usize {
        self.commanded.len()
    }

    pub fn open_count(&self) -> usize {
        self.commanded.iter().filter(|&&open| open).count()
    }

    /// Opens pumps `0..n`.
    pub fn open_below(
        &mut self,
        n: usize,
        registry: &FailureRegistry,
        reported: &[bool],
        out: &mut Mailbox,
    ) {
        for i in 0..n.min(self.len()) {
            self.command(i, true, registry, reported, out);
        }
    }

    /// Closes pumps `n..P`, leaving `0..n` as they are.
    pub fn close_from(
        &mut self,
        n: usize,
        registry: &FailureRegistry,
        reported: &[bool],
        out: &mut Mailbox,
    ) {
        for i in n..self.len() {
            self.command(i, false, registry, reported, out);
        }
    }

    /// Sends a close to every pump reported open, whatever it was last told.
    pub fn close_reported_open(&mut self, reported: &[bool], out: &mut Mailbox) {
        for (i, &open) in reported.iter().enumerate().take(self.len()) {
            if open {
                self.commanded[i] = false;
                out.send(Message::ClosePump(i));
            }
        }
    }

    /// A healthy pump takes every new command. A failed pump is only re-commanded
    /// when it already sits in the wanted position, so its command matches reality.
    fn command(
        &mut self,
        i: usize,
        open: bool,
        registry: &FailureRegistry,
        reported: &[bool],
        out: &mut Mailbox,
    ) {
        if self.commanded[i] == open {
            return;
        }
        let failed = registry.pump(i).is_failed();
        if failed && reported.get(i).copied() != Some(open) {
            return;
        }
        self.commanded[i] = open;
        out.send(if open {
            Message::OpenPump(i)
        } else {
            Message::ClosePump(i)
        });
    }
}
