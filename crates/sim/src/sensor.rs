use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SensorFault {
    None,
    Stuck { value: f64 },
    Bias { value: f64 },
    /// Offset growing by `per_tick` every reading.
    Drift { per_tick: f64 },
    /// Every `n`th reading is lost (NaN).
    DropoutEvery { n: u64 },
}

#[derive(Clone, Debug)]
pub struct Sensor {
    pub noise_std: f64,
    pub fault: SensorFault,
    rng: StdRng,
    step_count: u64,
}

impl Sensor {
    pub fn new(seed: u64) -> Self {
        Self {
            noise_std: 0.0,
            fault: SensorFault::None,
            rng: StdRng::seed_from_u64(seed),
            step_count: 0,
        }
    }

    pub fn read(&mut self, true_value: f64) -> f64 {
        self.step_count += 1;

        let mut v = match self.fault {
            SensorFault::None => true_value,
            SensorFault::Stuck { value } => return value,
            SensorFault::Bias { value } => true_value + value,
            SensorFault::Drift { per_tick } => true_value + per_tick * self.step_count as f64,
            SensorFault::DropoutEvery { n } => {
                if n > 0 && self.step_count % n == 0 {
                    return f64::NAN;
                }
                true_value
            }
        };

        if self.noise_std > 0.0 {
            if let Ok(normal) = Normal::new(0.0, self.noise_std) {
                v += normal.sample(&mut self.rng);
            }
        }

        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_noiseless_sensor_reads_truth() {
        let mut s = Sensor::new(1);
        assert_eq!(s.read(412.0), 412.0);
    }

    #[test]
    fn stuck_sensor_ignores_noise() {
        let mut s = Sensor::new(1);
        s.noise_std = 3.0;
        s.fault = SensorFault::Stuck { value: -1.0 };
        assert_eq!(s.read(412.0), -1.0);
    }

    #[test]
    fn drift_accumulates_per_reading() {
        let mut s = Sensor::new(1);
        s.fault = SensorFault::Drift { per_tick: 2.0 };
        assert_eq!(s.read(100.0), 102.0);
        assert_eq!(s.read(100.0), 104.0);
    }

    #[test]
    fn dropout_loses_every_nth_reading() {
        let mut s = Sensor::new(1);
        s.fault = SensorFault::DropoutEvery { n: 2 };
        assert_eq!(s.read(5.0), 5.0);
        assert!(s.read(5.0).is_nan());
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let mut a = Sensor::new(7);
        let mut b = Sensor::new(7);
        a.noise_std = 1.0;
        b.noise_std = 1.0;
        assert_eq!(a.read(500.0), b.read(500.0));
    }
}
