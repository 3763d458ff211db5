//! System configuration parameters
//!
//! All tunable parameters for the interlock. Defaults reproduce the
//! reference calibration; a JSON document can override any subset of
//! fields (the binary reads one from `INTERLOCK_CONFIG_JSON` at build time).

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest driver name that fits the greeting line after `HELLO `.
pub const DRIVER_NAME_CAP: usize = 10;
/// Longest contact number that fits the lockout line.
pub const CONTACT_DIGITS_CAP: usize = 6;

/// Name greeted on the welcome screen unless overridden.
pub const DEFAULT_DRIVER_NAME: &str = "JULIA!";
const _: () = assert!(DEFAULT_DRIVER_NAME.len() <= DRIVER_NAME_CAP);

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterlockConfig {
    // --- Timer ---
    /// Tick rate of the multi-rate timer (Hz).
    pub timer_clock_hz: u32,
    /// Full indicator PWM period (timer ticks).
    pub pwm_period_ticks: u32,
    /// Fraction of the PWM period the indicator is high (0 < d < 1).
    pub pwm_duty_factor: f32,
    /// Delay between an episode start and its evaluation (timer ticks).
    pub evaluation_delay_ticks: u32,

    // --- Sampling ---
    /// Sample clock period (milliseconds).
    pub sample_interval_ms: u32,
    /// Conversions triggered per sample tick.
    pub conversions_per_sample: u8,

    // --- BAC calibration ---
    /// Averaged reading at or below which the BAC is zero.
    pub sensor_floor: u16,
    /// Highest BAC (×100 000) that still passes.
    pub legal_limit: u32,
    pub bac_scale_numerator: u64,
    pub bac_scale_denominator: u64,

    // --- Session ---
    /// Completed evaluations allowed before lockout.
    pub max_attempts: u8,

    // --- Display ---
    pub driver_name: String<DRIVER_NAME_CAP>,
    pub contact_digits: Vec<u8, CONTACT_DIGITS_CAP>,

    // --- Input ---
    pub button_debounce_ms: u32,
}

impl Default for InterlockConfig {
    fn default() -> Self {
        Self {
            timer_clock_hz: 30_000_000, // 30 MHz main clock
            pwm_period_ticks: 30_000,   // 1 ms
            pwm_duty_factor: 0.2,
            evaluation_delay_ticks: 120_000_000, // 4 s

            sample_interval_ms: 1000,
            conversions_per_sample: 2,

            sensor_floor: 2050,
            legal_limit: 8999,
            bac_scale_numerator: 16_716,
            bac_scale_denominator: 40_900_000,

            max_attempts: 3,

            driver_name: String::try_from(DEFAULT_DRIVER_NAME).unwrap_or_default(),
            contact_digits: Vec::from_slice(&[8, 2, 9, 4]).unwrap_or_default(),

            button_debounce_ms: 50,
        }
    }
}

impl InterlockConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults and
    /// validate the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.timer_clock_hz < 1000 {
            return Err(Error::Config("timer_clock_hz below 1 kHz"));
        }
        if self.pwm_period_ticks < 2 {
            return Err(Error::Config("pwm_period_ticks too short"));
        }
        if !(self.pwm_duty_factor > 0.0 && self.pwm_duty_factor < 1.0) {
            return Err(Error::Config("pwm_duty_factor must be in (0, 1)"));
        }
        if self.pwm_high_ticks() == 0 || self.pwm_low_ticks() == 0 {
            return Err(Error::Config("pwm duty rounds to a zero-length phase"));
        }
        if self.evaluation_delay_ticks == 0 {
            return Err(Error::Config("evaluation_delay_ticks is zero"));
        }
        if self.sample_interval_ms == 0 {
            return Err(Error::Config("sample_interval_ms is zero"));
        }
        if self.conversions_per_sample == 0 {
            return Err(Error::Config("conversions_per_sample is zero"));
        }
        if self.sensor_floor > crate::sensors::breath::ADC_MAX {
            return Err(Error::Config("sensor_floor above ADC range"));
        }
        if self.bac_scale_denominator == 0 {
            return Err(Error::Config("bac_scale_denominator is zero"));
        }
        // Keep numerator × (ADC_MAX - floor) inside u64.
        if self
            .bac_scale_numerator
            .checked_mul(u64::from(crate::sensors::breath::ADC_MAX))
            .is_none()
        {
            return Err(Error::Config("bac_scale_numerator overflows"));
        }
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts is zero"));
        }
        if self.contact_digits.iter().any(|&d| d > 9) {
            return Err(Error::Config("contact_digits must be 0-9"));
        }
        Ok(())
    }

    /// Indicator high time per PWM period (timer ticks), truncated.
    pub fn pwm_high_ticks(&self) -> u32 {
        (self.pwm_period_ticks as f32 * self.pwm_duty_factor) as u32
    }

    /// Indicator low time per PWM period (timer ticks), truncated on its
    /// own, so the two phases may sum to one tick short of the period.
    pub fn pwm_low_ticks(&self) -> u32 {
        (self.pwm_period_ticks as f32 * (1.0 - self.pwm_duty_factor)) as u32
    }

    /// Reload used for the PWM channel before the indicator is enabled.
    pub fn pwm_initial_ticks(&self) -> u32 {
        self.pwm_period_ticks / 2
    }
}
