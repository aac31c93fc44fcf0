//! Randomized send cadence
//!
//! Each wait is drawn independently and uniformly from whole seconds in
//! `[min, max]`. The spread is the only thing keeping nodes from announcing
//! in lockstep.
use std::time::Duration;

use rand::Rng;

use crate::config_error;
use crate::error::Result;

pub const DEFAULT_MIN_DELAY_SECS: u64 = 1;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomSchedule {
    min_secs: u64,
    max_secs: u64,
}

impl RandomSchedule {
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self> {
        if min_secs > max_secs {
            return Err(config_error!(
                "Minimum delay {}s exceeds maximum delay {}s",
                min_secs,
                max_secs
            ));
        }
        Ok(Self { min_secs, max_secs })
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_secs)
    }

    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(rng.gen_range(self.min_secs..=self.max_secs))
    }
}

impl Default for RandomSchedule {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_DELAY_SECS,
            max_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_delays_stay_within_inclusive_bounds() {
        let schedule = RandomSchedule::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5_000 {
            let delay = schedule.next_delay(&mut rng);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_secs(30));
            seen_min |= delay == Duration::from_secs(1);
            seen_max |= delay == Duration::from_secs(30);
        }
        assert!(seen_min && seen_max, "both bounds should be reachable");
    }

    #[test]
    fn test_fixed_schedule() {
        let schedule = RandomSchedule::new(5, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(schedule.next_delay(&mut rng), Duration::from_secs(5));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(RandomSchedule::new(10, 2).is_err());
    }
}
