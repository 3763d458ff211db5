//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the display, the headlight pin, the multi-rate timer, and the
//! alcohol sensor, exposing them through the four hardware ports. This is
//! the only place the service's I/O meets a driver. On non-espidf targets
//! the timer and sensor fall back to their simulation back-ends, and the
//! display is usually a [`TextDisplay`](super::text_display::TextDisplay).

use embedded_hal::digital::OutputPin;

use crate::app::ports::{CharacterDisplay, IndicatorOutput, SensorConversion, TimerControl};
use crate::drivers::hw_timer::MultiRateTimer;
use crate::scheduler::{Channel, PendingFlags};
use crate::sensors::alcohol::AlcoholSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<D, P> {
    display: D,
    headlights: P,
    headlights_on: bool,
    timer: MultiRateTimer,
    sensor: AlcoholSensor,
}

impl<D, P> HardwareAdapter<D, P>
where
    D: CharacterDisplay,
    P: OutputPin,
{
    pub fn new(display: D, headlights: P, timer: MultiRateTimer, sensor: AlcoholSensor) -> Self {
        Self {
            display,
            headlights,
            headlights_on: false,
            timer,
            sensor,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn timer(&self) -> &MultiRateTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut MultiRateTimer {
        &mut self.timer
    }

    pub fn sensor_mut(&mut self) -> &mut AlcoholSensor {
        &mut self.sensor
    }

    pub fn headlights(&self) -> &P {
        &self.headlights
    }

    /// Last level written to the headlight pin.
    pub fn headlights_on(&self) -> bool {
        self.headlights_on
    }
}

// ── CharacterDisplay ──────────────────────────────────────────

impl<D: CharacterDisplay, P> CharacterDisplay for HardwareAdapter<D, P> {
    fn clear(&mut self) {
        self.display.clear();
    }

    fn new_line(&mut self) {
        self.display.new_line();
    }

    fn move_cursor(&mut self) {
        self.display.move_cursor();
    }

    fn write_char(&mut self, c: char) {
        self.display.write_char(c);
    }

    fn write_digit(&mut self, n: u8) {
        self.display.write_digit(n);
    }
}

// ── SensorConversion ──────────────────────────────────────────

impl<D, P> SensorConversion for HardwareAdapter<D, P> {
    fn convert(&mut self) -> u16 {
        self.sensor.convert()
    }
}

// ── IndicatorOutput ───────────────────────────────────────────

impl<D, P: OutputPin> IndicatorOutput for HardwareAdapter<D, P> {
    fn set_indicator(&mut self, on: bool) {
        // A pin error leaves the recorded level untouched so the next
        // toggle retries from the real state.
        if self.headlights.set_state(on.into()).is_ok() {
            self.headlights_on = on;
        }
    }
}

// ── TimerControl ──────────────────────────────────────────────

impl<D, P> TimerControl for HardwareAdapter<D, P> {
    fn arm(&mut self, channel: Channel, ticks: u32) {
        self.timer.arm(channel, ticks);
    }

    fn set_reload(&mut self, channel: Channel, ticks: u32) {
        self.timer.set_reload(channel, ticks);
    }

    fn disarm(&mut self, channel: Channel) {
        self.timer.disarm(channel);
    }

    fn acknowledge(&mut self, channel: Channel) {
        self.timer.acknowledge(channel);
    }

    fn pending(&self) -> PendingFlags {
        self.timer.pending()
    }

    fn restart_sample_clock(&mut self, period_ms: u32) {
        self.timer.restart_sample_clock(period_ms);
    }

    fn take_sample_due(&mut self) -> bool {
        self.timer.take_sample_due()
    }
}
