//! HD44780 character LCD, 8-bit parallel bus.
//!
//! Generic over `embedded_hal` pins and delay so the same driver runs on
//! ESP-IDF `PinDriver`s and on host mocks. Pin errors are swallowed: a
//! flaky display must never stall the session, and the port trait has no
//! error channel.
//!
//! | Command | Byte   |
//! |---------|--------|
//! | Function set (8-bit, 2 lines, 5×8) | `0x38` |
//! | Display on, cursor off | `0x0C` |
//! | Clear + home | `0x01` |
//! | Cursor to line 2 | `0xC0` |
//! | Shift cursor right | `0x14` |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::CharacterDisplay;

pub const CMD_FUNCTION_SET: u8 = 0x38;
pub const CMD_DISPLAY_ON: u8 = 0x0C;
pub const CMD_CLEAR: u8 = 0x01;
pub const CMD_LINE_TWO: u8 = 0xC0;
pub const CMD_CURSOR_RIGHT: u8 = 0x14;

/// Settle time after power-up before the first command (µs).
const POWER_UP_US: u32 = 40_000;
/// Execution time of clear/home (µs).
const CLEAR_US: u32 = 2_000;
/// Execution time of every other instruction (µs).
const INSTRUCTION_US: u32 = 50;
const ENABLE_PULSE_US: u32 = 1;

pub struct Hd44780<P, D> {
    rs: P,
    rw: P,
    en: P,
    data: [P; 8],
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    pub fn new(rs: P, rw: P, en: P, data: [P; 8], delay: D) -> Self {
        Self {
            rs,
            rw,
            en,
            data,
            delay,
        }
    }

    /// Power-up sequence: 8-bit two-line mode, display on, cleared.
    pub fn init(&mut self) {
        self.delay.delay_us(POWER_UP_US);
        self.command(CMD_FUNCTION_SET);
        self.command(CMD_DISPLAY_ON);
        self.command(CMD_CLEAR);
    }

    pub fn command(&mut self, byte: u8) {
        self.write_byte(false, byte);
        let settle = if byte == CMD_CLEAR { CLEAR_US } else { INSTRUCTION_US };
        self.delay.delay_us(settle);
    }

    pub fn data(&mut self, byte: u8) {
        self.write_byte(true, byte);
        self.delay.delay_us(INSTRUCTION_US);
    }

    fn write_byte(&mut self, register_select: bool, byte: u8) {
        let _ = self.rs.set_state(register_select.into());
        let _ = self.rw.set_low();
        for (bit, pin) in self.data.iter_mut().enumerate() {
            let _ = pin.set_state((byte & (1 << bit) != 0).into());
        }
        let _ = self.en.set_high();
        self.delay.delay_us(ENABLE_PULSE_US);
        let _ = self.en.set_low();
    }

    /// Release the pins and delay provider.
    pub fn release(self) -> (P, P, P, [P; 8], D) {
        (self.rs, self.rw, self.en, self.data, self.delay)
    }
}

impl<P: OutputPin, D: DelayNs> CharacterDisplay for Hd44780<P, D> {
    fn clear(&mut self) {
        self.command(CMD_CLEAR);
    }

    fn new_line(&mut self) {
        self.command(CMD_LINE_TWO);
    }

    fn move_cursor(&mut self) {
        self.command(CMD_CURSOR_RIGHT);
    }

    fn write_char(&mut self, c: char) {
        // The character ROM is ASCII-compatible below 0x80.
        let byte = if c.is_ascii() { c as u8 } else { b'?' };
        self.data(byte);
    }

    fn write_digit(&mut self, n: u8) {
        self.data(b'0' + n.min(9));
    }
}
