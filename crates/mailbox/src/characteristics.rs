use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Physical characteristics of the boiler, fixed for the lifetime of a controller.
///
/// Levels are in litres, rates in litres per second. The pump count is the
/// length of `pump_capacities`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoilerConfig {
    pub capacity: f64,
    /// N1
    pub minimal_normal_level: f64,
    /// N2
    pub maximal_normal_level: f64,
    /// M1
    pub minimal_limit_level: f64,
    /// M2
    pub maximal_limit_level: f64,
    /// W
    pub maximal_steam_rate: f64,
    pub pump_capacities: Vec<f64>,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            capacity: 1000.0,
            minimal_normal_level: 200.0,
            maximal_normal_level: 800.0,
            minimal_limit_level: 100.0,
            maximal_limit_level: 900.0,
            maximal_steam_rate: 50.0,
            pump_capacities: vec![4.0, 4.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("minimal normal level ({0}) must not be negative")]
    NegativeNormalLevel(f64),
    #[error("minimal limit level ({0}) must not be negative")]
    NegativeLimitLevel(f64),
    #[error("minimal normal level ({n1}) must be below maximal normal level ({n2})")]
    EmptyNormalBand { n1: f64, n2: f64 },
    #[error("maximal normal level ({n2}) exceeds maximal limit level ({m2})")]
    NormalAboveLimit { n2: f64, m2: f64 },
    #[error("minimal limit level ({m1}) exceeds minimal normal level ({n1})")]
    LimitAboveNormal { m1: f64, n1: f64 },
    #[error("maximal limit level ({m2}) exceeds capacity ({capacity})")]
    LimitAboveCapacity { m2: f64, capacity: f64 },
    #[error("maximal steam rate must be positive, got {0}")]
    NonPositiveSteamRate(f64),
    #[error("capacity of pump {pump} must not be negative, got {value}")]
    NegativePumpCapacity { pump: usize, value: f64 },
}

impl BoilerConfig {
    pub fn pump_count(&self) -> usize {
        self.pump_capacities.len()
    }

    /// Sum of the capacities of pumps `0..n` (litres per second). `n` is clamped to the pump count.
    pub fn total_capacity(&self, n: usize) -> f64 {
        self.pump_capacities.iter().take(n).sum()
    }

    pub fn within_limits(&self, level: f64) -> bool {
        level >= self.minimal_limit_level && level <= self.maximal_limit_level
    }

    /// Smallest pump index at which the cumulative capacity exceeds the maximal
    /// steam rate, or 0 when the whole bank never does.
    pub fn initial_pump_target(&self) -> usize {
        let mut total = 0.0;
        for (i, cap) in self.pump_capacities.iter().enumerate() {
            if total < self.maximal_steam_rate {
                total += cap;
            }
            if total > self.maximal_steam_rate {
                return i;
            }
        }
        0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("capacity", self.capacity),
            ("minimal_normal_level", self.minimal_normal_level),
            ("maximal_normal_level", self.maximal_normal_level),
            ("minimal_limit_level", self.minimal_limit_level),
            ("maximal_limit_level", self.maximal_limit_level),
            ("maximal_steam_rate", self.maximal_steam_rate),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        let (n1, n2) = (self.minimal_normal_level, self.maximal_normal_level);
        let (m1, m2) = (self.minimal_limit_level, self.maximal_limit_level);

        if n1 < 0.0 {
            return Err(ConfigError::NegativeNormalLevel(n1));
        }
        if m1 < 0.0 {
            return Err(ConfigError::NegativeLimitLevel(m1));
        }
        if n1 >= n2 {
            return Err(ConfigError::EmptyNormalBand { n1, n2 });
        }
        if n2 > m2 {
            return Err(ConfigError::NormalAboveLimit { n2, m2 });
        }
        if m1 > n1 {
            return Err(ConfigError::LimitAboveNormal { m1, n1 });
        }
        if m2 > self.capacity {
            return Err(ConfigError::LimitAboveCapacity {
                m2,
                capacity: self.capacity,
            });
        }
        if self.maximal_steam_rate <= 0.0 {
            return Err(ConfigError::NonPositiveSteamRate(self.maximal_steam_rate));
        }
        for (pump, &value) in self.pump_capacities.iter().enumerate() {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite {
                    field: "pump_capacities",
                    value,
                });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativePumpCapacity { pump, value });
            }
        }
        Ok(())
    }
}
