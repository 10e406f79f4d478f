//! Message model shared by the controller and the physical units.
//!
//! Every tick the physical units deliver one [`Mailbox`] of readings and
//! notifications, and the controller answers with one [`Mailbox`] of commands.

mod characteristics;
mod message;

pub use characteristics::{BoilerConfig, ConfigError};
pub use message::{Message, MessageKind, Mode};

use serde::{Deserialize, Serialize};

/// An ordered batch of messages for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mailbox {
    messages: Vec<Message>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// The periodic part of a physical-units batch: one level reading, one steam
    /// reading, then one state message per pump and per pump controller.
    pub fn with_readings(level: f64, steam: f64, pumps: &[bool], controllers: &[bool]) -> Self {
        let mut b = Self::new();
        b.send(Message::Level(level));
        b.send(Message::Steam(steam));
        for (pump, &open) in pumps.iter().enumerate() {
            b.send(Message::PumpState { pump, open });
        }
        for (pump, &flowing) in controllers.iter().enumerate() {
            b.send(Message::PumpControlState { pump, flowing });
        }
        b
    }

    pub fn send(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn contains(&self, msg: &Message) -> bool {
        self.messages.iter().any(|m| m == msg)
    }

    pub fn count(&self, kind: MessageKind) -> usize {
        self.messages.iter().filter(|m| m.kind() == kind).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn retain(&mut self, f: impl FnMut(&Message) -> bool) {
        self.messages.retain(f);
    }
}

impl FromIterator<Message> for Mailbox {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl Extend<Message> for Mailbox {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        self.messages.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Mailbox {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
