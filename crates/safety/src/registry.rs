/// Health of a single physical unit as last established by a detector or a repair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitHealth {
    #[default]
    Healthy,
    Failed,
}

impl UnitHealth {
    pub fn is_failed(self) -> bool {
        self == UnitHealth::Failed
    }
}

/// Which units are currently considered failed.
///
/// Detectors mark units failed; only repair notifications mark them healthy
/// again. Every mark/repair reports whether the entry actually changed, so
/// detection and acknowledgement messages go out once per failure episode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRegistry {
    pumps: Vec<UnitHealth>,
    controllers: Vec<UnitHealth>,
    steam: UnitHealth,
    level: UnitHealth,
}

impl FailureRegistry {
    pub fn new(pump_count: usize) -> Self {
        Self {
            pumps: vec![UnitHealth::Healthy; pump_count],
            controllers: vec![UnitHealth::Healthy; pump_count],
            steam: UnitHealth::Healthy,
            level: UnitHealth::Healthy,
        }
    }

    pub fn pump(&self, i: usize) -> UnitHealth {
        self.pumps.get(i).copied().unwrap_or_default()
    }

    pub fn steam(&self) -> UnitHealth {
        self.steam
    }

    pub fn level(&self) -> UnitHealth {
        self.level
    }

    pub fn mark_pump_failed(&mut self, i: usize) -> bool {
        set(self.pumps.get_mut(i), UnitHealth::Failed)
    }

    pub fn mark_controller_failed(&mut self, i: usize) -> bool {
        set(self.controllers.get_mut(i), UnitHealth::Failed)
    }

    pub fn mark_steam_failed(&mut self) -> bool {
        set(Some(&mut self.steam), UnitHealth::Failed)
    }

    pub fn mark_level_failed(&mut self) -> bool {
        set(Some(&mut self.level), UnitHealth::Failed)
    }

    pub fn repair_pump(&mut self, i: usize) -> bool {
        set(self.pumps.get_mut(i), UnitHealth::Healthy)
    }

    pub fn repair_controller(&mut self, i: usize) -> bool {
        set(self.controllers.get_mut(i), UnitHealth::Healthy)
    }

    pub fn repair_steam(&mut self) -> bool {
        set(Some(&mut self.steam), UnitHealth::Healthy)
    }

    pub fn repair_level(&mut self) -> bool {
        set(Some(&mut self.level), UnitHealth::Healthy)
    }

    pub fn all_pumps_healthy(&self) -> bool {
        self.pumps.iter().all(|h| !h.is_failed())
    }

    pub fn all_controllers_healthy(&self) -> bool {
        self.controllers.iter().all(|h| !h.is_failed())
    }

    pub fn failed_pumps(&self) -> impl Iterator<Item = usize> + '_ {
        self.pumps
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_failed())
            .map(|(i, _)| i)
    }

    /// True while any unit awaits a repair notification.
    pub fn outstanding(&self) -> bool {
        !self.all_pumps_healthy()
            || !self.all_controllers_healthy()
            || self.steam.is_failed()
            || self.level.is_failed()
    }
}

fn set(slot: Option<&mut UnitHealth>, to: UnitHealth) -> bool {
    match slot {
        Some(h) if *h != to => {
            *h = to;
            true
        }
        _ => false,
    }
}
