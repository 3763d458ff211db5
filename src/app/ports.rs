//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ InterlockService (domain)
//! ```
//!
//! Driven adapters (display, sensor, indicator, timer, event sink)
//! implement these traits. The [`InterlockService`](super::service::InterlockService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and runs unchanged against the host simulation in tests.

use crate::scheduler::{Channel, PendingFlags};

// ───────────────────────────────────────────────────────────────
// Character display (driven adapter: domain → LCD)
// ───────────────────────────────────────────────────────────────

/// Two-line character display. Calls have no return value; a display that
/// misbehaves must not stall the session.
pub trait CharacterDisplay {
    /// Blank the display and home the cursor.
    fn clear(&mut self);

    /// Move the cursor to the start of the second line.
    fn new_line(&mut self);

    /// Advance the cursor one cell without writing (renders a space).
    fn move_cursor(&mut self);

    /// Write one character at the cursor and advance.
    fn write_char(&mut self, c: char);

    /// Write a decimal digit `0..=9` at the cursor and advance.
    fn write_digit(&mut self, n: u8);
}

// ───────────────────────────────────────────────────────────────
// Sensor conversion (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Synchronous trigger-and-read of the breath sensor.
pub trait SensorConversion {
    /// Start a conversion, wait for it, and return the raw result.
    fn convert(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Indicator output (driven adapter: domain → headlights)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorOutput {
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Timer control (driven adapter: domain ↔ multi-rate timer)
// ───────────────────────────────────────────────────────────────

/// Two-channel repeating timer plus the periodic sample clock.
///
/// Reload semantics follow a multi-rate timer: [`arm`](Self::arm) loads
/// the counter immediately, [`set_reload`](Self::set_reload) only takes
/// effect at the channel's next expiry.
pub trait TimerControl {
    /// Load `ticks` now and start the channel repeating at that interval.
    fn arm(&mut self, channel: Channel, ticks: u32);

    /// Queue `ticks` as the interval that starts at the next expiry.
    fn set_reload(&mut self, channel: Channel, ticks: u32);

    /// Stop the channel. Its pending flag is cleared.
    fn disarm(&mut self, channel: Channel);

    /// Clear the channel's pending interrupt flag.
    fn acknowledge(&mut self, channel: Channel);

    /// Channels with an unacknowledged expiry.
    fn pending(&self) -> PendingFlags;

    /// Restart the sample clock from a clean phase.
    fn restart_sample_clock(&mut self, period_ms: u32);

    /// Consume one sample-clock expiry, if any is outstanding.
    fn take_sample_due(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Combined hardware bound
// ───────────────────────────────────────────────────────────────

/// Everything the service drives. Implemented automatically for any type
/// that provides all four hardware ports, which avoids a double mutable
/// borrow while keeping each port boundary explicit.
pub trait InterlockHardware:
    CharacterDisplay + SensorConversion + IndicatorOutput + TimerControl
{
}

impl<T> InterlockHardware for T where
    T: CharacterDisplay + SensorConversion + IndicatorOutput + TimerControl
{
}
