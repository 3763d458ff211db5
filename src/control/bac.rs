//! Breath-alcohol evaluation.
//!
//! Maps the averaged sensor reading onto a BAC scaled by 100 000
//! (0.08 % ⇒ 8000) and decides pass/fail against the legal limit.
//!
//! ```text
//!   avg <= floor  ⇒  0
//!   otherwise     ⇒  numerator × (avg − floor) / denominator   (u64, floor)
//! ```
//!
//! The evaluator latches its first result for the episode; later calls
//! return the latched value until [`BacEvaluator::reset`].

use crate::config::InterlockConfig;

/// BAC scaled by 100 000.
pub type BacValue = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// One completed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacReading {
    pub average: u16,
    pub bac: BacValue,
    pub verdict: Verdict,
}

impl BacReading {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Convert an averaged raw reading to a BAC value.
pub fn bac_from_average(average: u16, config: &InterlockConfig) -> BacValue {
    if average <= config.sensor_floor || config.bac_scale_denominator == 0 {
        return 0;
    }
    let excess = u64::from(average - config.sensor_floor);
    let scaled = config.bac_scale_numerator.saturating_mul(excess) / config.bac_scale_denominator;
    BacValue::try_from(scaled).unwrap_or(BacValue::MAX)
}

/// Pass iff `bac <= legal_limit`.
pub fn verdict_for(bac: BacValue, config: &InterlockConfig) -> Verdict {
    if bac <= config.legal_limit {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// Full evaluation of an averaged reading.
pub fn evaluate(average: u16, config: &InterlockConfig) -> BacReading {
    let bac = bac_from_average(average, config);
    BacReading {
        average,
        bac,
        verdict: verdict_for(bac, config),
    }
}

/// Once-per-episode evaluation latch.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacEvaluator {
    latched: Option<BacReading>,
}

impl BacEvaluator {
    pub const fn new() -> Self {
        Self { latched: None }
    }

    /// Evaluate on the first call of the episode; return the latched
    /// reading on every later call. The `bool` is `true` when this call
    /// produced a fresh reading.
    pub fn evaluate_once(&mut self, average: u16, config: &InterlockConfig) -> (BacReading, bool) {
        match self.latched {
            Some(reading) => (reading, false),
            None => {
                let reading = evaluate(average, config);
                self.latched = Some(reading);
                (reading, true)
            }
        }
    }

    /// Clear the latch for a new episode.
    pub fn reset(&mut self) {
        self.latched = None;
    }

    pub fn latched(&self) -> Option<BacReading> {
        self.latched
    }
}
