//! Repair notifications and the promotion decision table.

use crate::registry::FailureRegistry;
use mailbox::{Mailbox, Message};
use tracing::info;

/// Units whose registry entry went from failed to healthy during this tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub pumps: Vec<usize>,
    pub controllers: Vec<usize>,
    pub steam: bool,
    pub level: bool,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.pumps.is_empty() && self.controllers.is_empty() && !self.steam && !self.level
    }

    /// Acknowledgements owed to the physical units, one per repaired unit.
    pub fn acknowledgements(&self) -> impl Iterator<Item = Message> + '_ {
        let pumps = self
            .pumps
            .iter()
            .map(|&n| Message::PumpRepairedAcknowledgement(n));
        let controllers = self
            .controllers
            .iter()
            .map(|&n| Message::PumpControlRepairedAcknowledgement(n));
        let steam = self.steam.then_some(Message::SteamRepairedAcknowledgement);
        let level = self.level.then_some(Message::LevelRepairedAcknowledgement);
        pumps.chain(controllers).chain(steam).chain(level)
    }
}

/// Applies every repair notification in `inbound` to the registry.
///
/// A notification for a unit that is not marked failed changes nothing and is
/// left out of the report, so a repeated notification is never acknowledged twice.
pub fn observe(inbound: &Mailbox, registry: &mut FailureRegistry) -> RepairReport {
    let mut report = RepairReport::default();
    for msg in inbound {
        match *msg {
            Message::PumpRepaired(n) if registry.repair_pump(n) => {
                info!(pump = n, "pump repaired");
                report.pumps.push(n);
            }
            Message::PumpControlRepaired(n) if registry.repair_controller(n) => {
                info!(pump = n, "pump controller repaired");
                report.controllers.push(n);
            }
            Message::SteamRepaired if registry.repair_steam() => {
                info!("steam sensor repaired");
                report.steam = true;
            }
            Message::LevelRepaired if registry.repair_level() => {
                info!("level sensor repaired");
                report.level = true;
            }
            _ => {}
        }
    }
    report
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Promotion {
    Normal,
    Degraded,
}

/// DEGRADED returns to NORMAL once nothing is awaiting repair.
pub fn from_degraded(registry: &FailureRegistry) -> Option<Promotion> {
    (!registry.outstanding()).then_some(Promotion::Normal)
}

/// RESCUE is left only on a level repair. Anything else still broken, including
/// a pump found misbehaving this tick, lands in DEGRADED instead of NORMAL.
pub fn from_rescue(
    registry: &FailureRegistry,
    repairs: &RepairReport,
    pump_mismatch: Option<usize>,
) -> Option<Promotion> {
    if !repairs.level {
        return None;
    }
    if pump_mismatch.is_some() || registry.outstanding() {
        Some(Promotion::Degraded)
    } else {
        Some(Promotion::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(msgs: &[Message]) -> Mailbox {
        msgs.iter().copied().collect()
    }

    #[test]
    fn repair_of_failed_pump_is_acknowledged_once() {
        let mut reg = FailureRegistry::new(2);
        reg.mark_pump_failed(0);
        let inbound = batch(&[Message::PumpRepaired(0)]);

        let first = observe(&inbound, &mut reg);
        assert_eq!(first.pumps, vec![0]);
        assert_eq!(
            first.acknowledgements().collect::<Vec<_>>(),
            vec![Message::PumpRepairedAcknowledgement(0)]
        );

        let second = observe(&inbound, &mut reg);
        assert!(second.is_empty());
        assert_eq!(second.acknowledgements().count(), 0);
    }

    #[test]
    fn repair_of_healthy_unit_is_ignored() {
        let mut reg = FailureRegistry::new(2);
        let inbound = batch(&[Message::SteamRepaired, Message::PumpControlRepaired(1)]);
        assert!(observe(&inbound, &mut reg).is_empty());
    }

    #[test]
    fn all_repairs_in_a_batch_are_applied() {
        let mut reg = FailureRegistry::new(3);
        reg.mark_pump_failed(0);
        reg.mark_pump_failed(2);
        reg.mark_controller_failed(1);
        reg.mark_steam_failed();
        let inbound = batch(&[
            Message::PumpRepaired(2),
            Message::SteamRepaired,
            Message::PumpControlRepaired(1),
            Message::PumpRepaired(0),
        ]);
        let report = observe(&inbound, &mut reg);
        assert_eq!(report.pumps, vec![2, 0]);
        assert_eq!(report.controllers, vec![1]);
        assert!(report.steam);
        assert!(!reg.outstanding());
        assert_eq!(
            report.acknowledgements().collect::<Vec<_>>(),
            vec![
                Message::PumpRepairedAcknowledgement(2),
                Message::PumpRepairedAcknowledgement(0),
                Message::PumpControlRepairedAcknowledgement(1),
                Message::SteamRepairedAcknowledgement,
            ]
        );
    }

    #[test]
    fn degraded_promotes_only_when_clear() {
        let mut reg = FailureRegistry::new(2);
        reg.mark_pump_failed(0);
        reg.mark_steam_failed();
        assert_eq!(from_degraded(&reg), None);
        reg.repair_pump(0);
        assert_eq!(from_degraded(&reg), None);
        reg.repair_steam();
        assert_eq!(from_degraded(&reg), Some(Promotion::Normal));
    }

    #[test]
    fn rescue_needs_a_level_repair() {
        let reg = FailureRegistry::new(2);
        assert_eq!(from_rescue(&reg, &RepairReport::default(), None), None);
    }

    #[test]
    fn rescue_goes_to_normal_when_level_was_the_only_failure() {
        let mut reg = FailureRegistry::new(2);
        reg.mark_level_failed();
        let report = observe(&batch(&[Message::LevelRepaired]), &mut reg);
        assert_eq!(from_rescue(&reg, &report, None), Some(Promotion::Normal));
        assert_eq!(
            report.acknowledgements().collect::<Vec<_>>(),
            vec![Message::LevelRepairedAcknowledgement]
        );
    }

    #[test]
    fn rescue_goes_to_degraded_while_a_pump_is_broken() {
        let mut reg = FailureRegistry::new(2);
        reg.mark_level_failed();
        reg.mark_pump_failed(1);
        let report = observe(&batch(&[Message::LevelRepaired]), &mut reg);
        assert_eq!(from_rescue(&reg, &report, None), Some(Promotion::Degraded));

        let mut clean = FailureRegistry::new(2);
        clean.mark_level_failed();
        let report = observe(&batch(&[Message::LevelRepaired]), &mut clean);
        assert_eq!(from_rescue(&clean, &report, Some(0)), Some(Promotion::Degraded));
    }
}
