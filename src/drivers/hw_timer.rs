//! Multi-rate timer: two repeating channels plus the sample clock.
//!
//! ## Reload semantics
//!
//! Each channel behaves like a repeating down-counter with a reload
//! register. `arm` loads the counter immediately; `set_reload` only
//! latches the value that will be loaded at the next expiry. An interrupt
//! handler that rewrites the reload therefore shapes the interval *after*
//! the one that just started.
//!
//! ## Dual-target design
//!
//! On ESP-IDF each channel is a one-shot `esp_timer` that re-starts itself
//! from its callback with the interval latched in its [`ChannelLatch`], and
//! the sample clock is a periodic `esp_timer`. A channel callback raises its
//! flag and then runs the hook installed with [`set_expiry_hook`], so the
//! channels are serviced in the esp_timer task at their own rate. The
//! sample clock only counts expiries; the main loop drains them.
//!
//! On host/test the same semantics are simulated tick-by-tick through
//! [`ChannelCounter`]; [`MultiRateTimer::step`] advances simulated time to
//! the next expiry.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::app::ports::TimerControl;
use crate::config::InterlockConfig;
use crate::scheduler::{Channel, PendingFlags};

// ---------------------------------------------------------------------------
// ChannelLatch
// ---------------------------------------------------------------------------

/// Armed flag and latched interval shared between a channel's owner and its
/// expiry callback.
///
/// `disarm` clears the flag before the timer is stopped. A callback that was
/// already running when the stop landed may still restart the one-shot, but
/// the expiry that follows finds the latch disarmed and is dropped.
#[derive(Debug)]
pub struct ChannelLatch {
    armed: AtomicBool,
    next: AtomicU32,
}

impl ChannelLatch {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            next: AtomicU32::new(0),
        }
    }

    /// Latch `interval` and mark the channel live.
    pub fn arm(&self, interval: u32) {
        self.next.store(interval, Ordering::Release);
        self.armed.store(true, Ordering::Release);
    }

    pub fn set_reload(&self, interval: u32) {
        self.next.store(interval, Ordering::Release);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Called on expiry: the interval to restart with, or `None` if the
    /// channel was disarmed and the expiry must be ignored.
    pub fn on_expiry(&self) -> Option<u32> {
        self.is_armed().then(|| self.next.load(Ordering::Acquire))
    }
}

impl Default for ChannelLatch {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ChannelCounter
// ---------------------------------------------------------------------------

/// One repeating down-counter with a deferred reload register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelCounter {
    armed: bool,
    remaining: u32,
    reload: u32,
}

impl ChannelCounter {
    /// Load `ticks` into both the counter and the reload register.
    pub fn arm(&mut self, ticks: u32) {
        let ticks = ticks.max(1);
        self.armed = true;
        self.remaining = ticks;
        self.reload = ticks;
    }

    /// Latch the interval loaded at the next expiry.
    pub fn set_reload(&mut self, ticks: u32) {
        self.reload = ticks.max(1);
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Ticks until the next expiry, if armed.
    pub fn remaining(&self) -> Option<u32> {
        self.armed.then_some(self.remaining)
    }

    pub fn reload(&self) -> u32 {
        self.reload
    }

    /// Count down by `ticks` (never more than [`remaining`](Self::remaining)).
    /// Returns `true` on expiry, after loading the latched reload.
    pub fn advance(&mut self, ticks: u32) -> bool {
        if !self.armed {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(ticks);
        if self.remaining == 0 {
            self.remaining = self.reload;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

/// Deterministic tick simulator used on the host.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct MultiRateTimer {
    clock_hz: u32,
    channels: [ChannelCounter; 2],
    sample_clock: ChannelCounter,
    pending: PendingFlags,
    samples_due: u32,
    elapsed: u64,
}

#[cfg(not(target_os = "espidf"))]
impl MultiRateTimer {
    pub fn new(config: &InterlockConfig) -> Self {
        Self {
            clock_hz: config.timer_clock_hz,
            channels: [ChannelCounter::default(); 2],
            sample_clock: ChannelCounter::default(),
            pending: PendingFlags::empty(),
            samples_due: 0,
            elapsed: 0,
        }
    }

    /// Advance simulated time to the next expiry, or by `max_ticks` if
    /// nothing expires sooner. Returns the ticks actually advanced.
    pub fn step(&mut self, max_ticks: u32) -> u32 {
        let advance = self
            .channels
            .iter()
            .chain(core::iter::once(&self.sample_clock))
            .filter_map(ChannelCounter::remaining)
            .fold(max_ticks, u32::min);

        for channel in Channel::ALL {
            if self.channels[channel.index()].advance(advance) {
                self.pending = self.pending.with(channel);
            }
        }
        if self.sample_clock.advance(advance) {
            self.samples_due = self.samples_due.saturating_add(1);
        }

        self.elapsed += u64::from(advance);
        advance
    }

    /// Total simulated ticks since construction.
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed
    }

    pub fn counter(&self, channel: Channel) -> &ChannelCounter {
        &self.channels[channel.index()]
    }

    pub fn sample_clock_armed(&self) -> bool {
        self.sample_clock.is_armed()
    }
}

#[cfg(not(target_os = "espidf"))]
impl TimerControl for MultiRateTimer {
    fn arm(&mut self, channel: Channel, ticks: u32) {
        self.channels[channel.index()].arm(ticks);
        self.pending = self.pending.without(channel);
    }

    fn set_reload(&mut self, channel: Channel, ticks: u32) {
        self.channels[channel.index()].set_reload(ticks);
    }

    fn disarm(&mut self, channel: Channel) {
        self.channels[channel.index()].disarm();
        self.pending = self.pending.without(channel);
    }

    fn acknowledge(&mut self, channel: Channel) {
        self.pending = self.pending.without(channel);
    }

    fn pending(&self) -> PendingFlags {
        self.pending
    }

    fn restart_sample_clock(&mut self, period_ms: u32) {
        let ticks = u64::from(period_ms) * u64::from(self.clock_hz) / 1000;
        self.sample_clock
            .arm(u32::try_from(ticks).unwrap_or(u32::MAX));
        self.samples_due = 0;
    }

    fn take_sample_due(&mut self) -> bool {
        if self.samples_due == 0 {
            return false;
        }
        self.samples_due -= 1;
        true
    }
}

// ---------------------------------------------------------------------------
// ESP-IDF implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
use core::sync::atomic::AtomicU8;

#[cfg(target_os = "espidf")]
use std::sync::OnceLock;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{error, info};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init::{InitError, check};

/// Raised channel flags, written from the esp_timer task.
#[cfg(target_os = "espidf")]
static RAISED: AtomicU8 = AtomicU8::new(0);
/// Outstanding sample-clock expiries.
#[cfg(target_os = "espidf")]
static SAMPLES_DUE: AtomicU32 = AtomicU32::new(0);
/// Per-channel latch; intervals in microseconds.
#[cfg(target_os = "espidf")]
static LATCHES: [ChannelLatch; 2] = [ChannelLatch::new(), ChannelLatch::new()];
/// Runs in the esp_timer task after a channel flag is raised.
#[cfg(target_os = "espidf")]
static EXPIRY_HOOK: OnceLock<fn()> = OnceLock::new();

#[cfg(target_os = "espidf")]
static mut PWM_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut EVAL_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut SAMPLE_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: the handles are written once in `MultiRateTimer::start()` before
/// any timer is started, and never again.
#[cfg(target_os = "espidf")]
unsafe fn channel_handle(channel: Channel) -> esp_timer_handle_t {
    match channel {
        Channel::Pwm => unsafe { PWM_TIMER },
        Channel::EvaluationDelay => unsafe { EVAL_TIMER },
    }
}

/// SAFETY: same invariants as `channel_handle()`.
#[cfg(target_os = "espidf")]
unsafe fn sample_handle() -> esp_timer_handle_t {
    unsafe { SAMPLE_TIMER }
}

/// Install the function that services raised channels. Only the first call
/// takes effect.
#[cfg(target_os = "espidf")]
pub fn set_expiry_hook(hook: fn()) {
    if EXPIRY_HOOK.set(hook).is_err() {
        log::warn!("hw_timer: expiry hook already installed");
    }
}

/// `true` if `rc` is `ESP_OK`; logs the failure otherwise.
#[cfg(target_os = "espidf")]
fn esp_ok(rc: esp_err_t, op: &str, channel: Channel) -> bool {
    if rc == ESP_OK {
        return true;
    }
    error!("hw_timer: {} failed on {:?} (rc={})", op, channel, rc);
    false
}

/// Stop `handle`. An already-expired one-shot reports
/// `ESP_ERR_INVALID_STATE`, which is not an error here.
#[cfg(target_os = "espidf")]
unsafe fn stop_timer(handle: esp_timer_handle_t, channel: Channel) {
    // SAFETY: caller passes a handle created in start().
    let rc = unsafe { esp_timer_stop(handle) };
    if rc != ESP_ERR_INVALID_STATE {
        esp_ok(rc, "esp_timer_stop", channel);
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn channel_expired_cb(arg: *mut core::ffi::c_void) {
    let Some(channel) = Channel::from_index(arg as usize) else {
        return;
    };
    // Repeat with the interval latched before this expiry.
    let Some(next_us) = LATCHES[channel.index()].on_expiry() else {
        return;
    };
    // SAFETY: handle initialised in start(); restarting a one-shot timer
    // from its own callback is permitted by esp_timer.
    let rc = unsafe { esp_timer_start_once(channel_handle(channel), u64::from(next_us)) };
    esp_ok(rc, "esp_timer_start_once", channel);
    RAISED.fetch_or(channel.mask(), Ordering::AcqRel);
    if let Some(hook) = EXPIRY_HOOK.get() {
        hook();
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sample_clock_cb(_arg: *mut core::ffi::c_void) {
    SAMPLES_DUE.fetch_add(1, Ordering::AcqRel);
}

/// esp_timer-backed multi-rate timer.
#[cfg(target_os = "espidf")]
#[derive(Debug)]
pub struct MultiRateTimer {
    clock_hz: u32,
}

#[cfg(target_os = "espidf")]
impl MultiRateTimer {
    pub fn new(config: &InterlockConfig) -> Self {
        Self {
            clock_hz: config.timer_clock_hz,
        }
    }

    /// Create the three esp_timers. Call once at boot, before any `arm`.
    pub fn start(&mut self) -> Result<(), InitError> {
        // SAFETY: the handle statics are written here once, from the main
        // task, before any callback can fire.
        unsafe {
            Self::create(
                channel_expired_cb,
                Channel::Pwm.index(),
                b"pwm\0",
                &raw mut PWM_TIMER,
            )?;
            Self::create(
                channel_expired_cb,
                Channel::EvaluationDelay.index(),
                b"eval\0",
                &raw mut EVAL_TIMER,
            )?;
            Self::create(sample_clock_cb, 0, b"sample\0", &raw mut SAMPLE_TIMER)?;
        }
        info!("hw_timer: pwm + eval + sample timers created");
        Ok(())
    }

    unsafe fn create(
        callback: unsafe extern "C" fn(*mut core::ffi::c_void),
        arg: usize,
        name: &'static [u8],
        out: *mut esp_timer_handle_t,
    ) -> Result<(), InitError> {
        let args = esp_timer_create_args_t {
            callback: Some(callback),
            arg: arg as *mut core::ffi::c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: name.as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        // SAFETY: `out` points at one of the handle statics.
        check(unsafe { esp_timer_create(&args, out) }, InitError::Timer)
    }

    fn ticks_to_us(&self, ticks: u32) -> u32 {
        let us = (u64::from(ticks) * 1_000_000 / u64::from(self.clock_hz)).max(1);
        u32::try_from(us).unwrap_or(u32::MAX)
    }
}

#[cfg(target_os = "espidf")]
impl TimerControl for MultiRateTimer {
    fn arm(&mut self, channel: Channel, ticks: u32) {
        let us = self.ticks_to_us(ticks);
        let latch = &LATCHES[channel.index()];
        latch.arm(us);
        // SAFETY: handle initialised in start().
        let rc = unsafe {
            let handle = channel_handle(channel);
            stop_timer(handle, channel);
            esp_timer_start_once(handle, u64::from(us))
        };
        if !esp_ok(rc, "esp_timer_start_once", channel) {
            // No expiry is coming; report the channel idle.
            latch.disarm();
        }
        RAISED.fetch_and(!channel.mask(), Ordering::AcqRel);
    }

    fn set_reload(&mut self, channel: Channel, ticks: u32) {
        LATCHES[channel.index()].set_reload(self.ticks_to_us(ticks));
    }

    fn disarm(&mut self, channel: Channel) {
        LATCHES[channel.index()].disarm();
        // SAFETY: see arm().
        unsafe {
            stop_timer(channel_handle(channel), channel);
        }
        RAISED.fetch_and(!channel.mask(), Ordering::AcqRel);
    }

    fn acknowledge(&mut self, channel: Channel) {
        RAISED.fetch_and(!channel.mask(), Ordering::AcqRel);
    }

    fn pending(&self) -> PendingFlags {
        PendingFlags::from_bits(RAISED.load(Ordering::Acquire))
    }

    fn restart_sample_clock(&mut self, period_ms: u32) {
        SAMPLES_DUE.store(0, Ordering::Release);
        // SAFETY: handle initialised in start().
        unsafe {
            let handle = sample_handle();
            let rc = esp_timer_stop(handle);
            if rc != ESP_OK && rc != ESP_ERR_INVALID_STATE {
                error!("hw_timer: sample clock stop failed (rc={})", rc);
            }
            let rc = esp_timer_start_periodic(handle, u64::from(period_ms) * 1000);
            if rc != ESP_OK {
                error!("hw_timer: sample clock start failed (rc={})", rc);
            }
        }
    }

    fn take_sample_due(&mut self) -> bool {
        SAMPLES_DUE
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}
