//! Dual-channel sample scheduler.
//!
//! One repeating timer with two channels sharing an interrupt:
//!
//! | Channel | Role                        | Reference interval     |
//! |---------|-----------------------------|------------------------|
//! | 0 `Pwm` | indicator PWM generator     | 15 000 → 6 000/24 000  |
//! | 1 `EvaluationDelay` | breath evaluation trigger | 120 000 000 (4 s) |
//!
//! The shared interrupt reports both channels through [`PendingFlags`];
//! channel 0 is always serviced first and channel 1 is implied by any
//! other pending bit.
//!
//! The sample clock (1 s) restarts together with the two channels so every
//! episode samples, toggles, and evaluates from a known phase.

use log::info;

use crate::app::ports::{IndicatorOutput, TimerControl};
use crate::config::InterlockConfig;
use crate::drivers::indicator::IndicatorPwm;

// ---------------------------------------------------------------------------
// Channel identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    Pwm = 0,
    EvaluationDelay = 1,
}

impl Channel {
    pub const ALL: [Self; 2] = [Self::Pwm, Self::EvaluationDelay];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit for this channel in the shared interrupt flag register.
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::Pwm),
            1 => Some(Self::EvaluationDelay),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pending interrupt flags
// ---------------------------------------------------------------------------

/// Snapshot of the shared interrupt flag register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingFlags(u8);

impl PendingFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn with(self, channel: Channel) -> Self {
        Self(self.0 | channel.mask())
    }

    pub const fn without(self, channel: Channel) -> Self {
        Self(self.0 & !channel.mask())
    }

    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & channel.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The channel an interrupt with these flags belongs to: channel 0 if
    /// its bit is set, otherwise channel 1.
    pub const fn decode(self) -> Option<Channel> {
        if self.is_empty() {
            None
        } else if self.contains(Channel::Pwm) {
            Some(Channel::Pwm)
        } else {
            Some(Channel::EvaluationDelay)
        }
    }
}

// ---------------------------------------------------------------------------
// SampleScheduler
// ---------------------------------------------------------------------------

/// Owns the channel programming and the PWM generator on channel 0.
#[derive(Debug)]
pub struct SampleScheduler {
    pwm: IndicatorPwm,
    evaluation_delay_ticks: u32,
    sample_interval_ms: u32,
    evaluation_armed: bool,
    restarts: u32,
}

impl SampleScheduler {
    pub fn new(config: &InterlockConfig) -> Self {
        Self {
            pwm: IndicatorPwm::new(config),
            evaluation_delay_ticks: config.evaluation_delay_ticks,
            sample_interval_ms: config.sample_interval_ms,
            evaluation_armed: false,
            restarts: 0,
        }
    }

    /// Re-arm both channels and the sample clock from a clean phase.
    pub fn restart(&mut self, timer: &mut impl TimerControl) {
        self.pwm.reset();
        timer.arm(Channel::Pwm, self.pwm.initial_ticks());
        timer.arm(Channel::EvaluationDelay, self.evaluation_delay_ticks);
        timer.restart_sample_clock(self.sample_interval_ms);
        self.evaluation_armed = true;
        self.restarts = self.restarts.saturating_add(1);
        info!(
            "SCHED: restart #{} (pwm={} ticks, eval={} ticks, sample={}ms)",
            self.restarts,
            self.pwm.initial_ticks(),
            self.evaluation_delay_ticks,
            self.sample_interval_ms
        );
    }

    /// Channel 0 service: toggle while enabled, otherwise hold low.
    pub fn pwm_step(&mut self, enabled: bool, hw: &mut (impl TimerControl + IndicatorOutput)) {
        self.pwm.step(enabled, hw);
    }

    /// Drive the indicator low and restart the PWM pattern at a rising edge.
    pub fn indicator_off(&mut self, out: &mut impl IndicatorOutput) {
        self.pwm.force_low(out);
    }

    /// Stop the evaluation channel; the PWM channel keeps running.
    pub fn halt_evaluation(&mut self, timer: &mut impl TimerControl) {
        if self.evaluation_armed {
            timer.disarm(Channel::EvaluationDelay);
            self.evaluation_armed = false;
            info!("SCHED: evaluation channel halted");
        }
    }

    pub fn evaluation_armed(&self) -> bool {
        self.evaluation_armed
    }

    pub fn indicator_level(&self) -> bool {
        self.pwm.level()
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}
