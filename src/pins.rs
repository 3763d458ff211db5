//! GPIO / peripheral pin assignments for the interlock board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// User button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button that starts, retries, and ends a session.
pub const BUTTON_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Headlights indicator
// ---------------------------------------------------------------------------

/// Digital output driven by the software PWM on timer channel 0.
/// HIGH = lamps on.
pub const HEADLIGHT_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Alcohol sensor: Analog (ADC1)
// ---------------------------------------------------------------------------

/// MQ-3 alcohol sensor: analog voltage via resistive divider.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const BREATH_ADC_GPIO: i32 = 5;
pub const BREATH_ADC_CHANNEL: u32 = 4;

// ---------------------------------------------------------------------------
// HD44780 character LCD (8-bit parallel)
// ---------------------------------------------------------------------------

pub const LCD_RS_GPIO: i32 = 1;
pub const LCD_RW_GPIO: i32 = 2;
pub const LCD_EN_GPIO: i32 = 3;
/// D0..D7, least-significant bit first.
pub const LCD_DATA_GPIO: [i32; 8] = [6, 7, 8, 9, 10, 11, 12, 13];
