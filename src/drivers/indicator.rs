//! Headlight indicator PWM generator.
//!
//! Software PWM on timer channel 0. Each expiry toggles the output and
//! queues the reload for the interval *after* the next one:
//!
//! | Edge    | Reload written          |
//! |---------|-------------------------|
//! | rising  | `period × (1 − duty)`   |
//! | falling | `period × duty`         |
//!
//! Because the timer applies a reload only at its next expiry, the
//! interval that follows a rising edge is the one written at the previous
//! falling edge, so in steady state the output is high for
//! `period × duty` ticks.

use crate::app::ports::{IndicatorOutput, TimerControl};
use crate::config::InterlockConfig;
use crate::scheduler::Channel;

#[derive(Debug, Clone)]
pub struct IndicatorPwm {
    level: bool,
    high_ticks: u32,
    low_ticks: u32,
    initial_ticks: u32,
    toggles: u32,
}

impl IndicatorPwm {
    pub fn new(config: &InterlockConfig) -> Self {
        Self {
            level: false,
            high_ticks: config.pwm_high_ticks(),
            low_ticks: config.pwm_low_ticks(),
            initial_ticks: config.pwm_initial_ticks(),
            toggles: 0,
        }
    }

    /// Service one channel-0 expiry.
    ///
    /// While `enabled`, toggle and queue the opposite phase's reload.
    /// Otherwise force the output low and leave the reload untouched.
    pub fn step(&mut self, enabled: bool, hw: &mut (impl TimerControl + IndicatorOutput)) -> bool {
        if !enabled {
            self.force_low(hw);
            return false;
        }

        self.level = !self.level;
        self.toggles = self.toggles.wrapping_add(1);
        hw.set_indicator(self.level);
        let reload = if self.level {
            self.low_ticks
        } else {
            self.high_ticks
        };
        hw.set_reload(Channel::Pwm, reload);
        self.level
    }

    /// Drive low; the next enabled step starts with a rising edge.
    pub fn force_low(&mut self, out: &mut impl IndicatorOutput) {
        self.level = false;
        out.set_indicator(false);
    }

    /// Forget the current phase (used when the channel is re-armed).
    pub fn reset(&mut self) {
        self.level = false;
    }

    pub fn level(&self) -> bool {
        self.level
    }

    pub fn initial_ticks(&self) -> u32 {
        self.initial_ticks
    }

    pub fn toggles(&self) -> u32 {
        self.toggles
    }
}
