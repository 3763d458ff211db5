//! ISR-debounced push-button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up. GPIO fires on falling edge;
//! the ISR records the raw timestamp into an atomic, and [`ButtonDriver::tick`]
//! (called from the main loop) runs the debounce state machine.
//!
//! One [`ButtonEvent::Press`] is reported per physical press: the button
//! must still be down once the debounce window closes, and must be released
//! before the next edge is accepted.

use core::sync::atomic::{AtomicU32, Ordering};

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
/// Written by the ISR, read by the main loop.
static BUTTON_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Settling { since_ms: u32 },
    /// Reported; waiting for release.
    Held,
}

pub struct ButtonDriver {
    gpio: i32,
    debounce_ms: u32,
    state: DebounceState,
    last_isr_ms: u32,
    presses: u32,
}

impl ButtonDriver {
    pub fn new(gpio: i32, debounce_ms: u32) -> Self {
        Self {
            gpio,
            debounce_ms,
            state: DebounceState::Idle,
            last_isr_ms: 0,
            presses: 0,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Presses reported so far.
    pub fn presses(&self) -> u32 {
        self.presses
    }

    /// Call from the main loop. `now_ms` is the current monotonic time.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let isr_ms = BUTTON_ISR_TIMESTAMP.load(Ordering::Acquire);
        self.step(now_ms, isr_ms, self.is_pressed_hw())
    }

    /// Debounce step on an explicit edge timestamp and pin level.
    fn step(&mut self, now_ms: u32, isr_ms: u32, pressed: bool) -> Option<ButtonEvent> {
        let new_edge = isr_ms != 0 && isr_ms != self.last_isr_ms;

        match self.state {
            DebounceState::Idle => {
                if new_edge {
                    self.last_isr_ms = isr_ms;
                    self.state = DebounceState::Settling { since_ms: now_ms };
                }
                None
            }

            DebounceState::Settling { since_ms } => {
                // Bounces during the window are absorbed.
                self.last_isr_ms = isr_ms;
                if now_ms.wrapping_sub(since_ms) < self.debounce_ms {
                    return None;
                }
                if pressed {
                    self.state = DebounceState::Held;
                    self.presses = self.presses.wrapping_add(1);
                    Some(ButtonEvent::Press)
                } else {
                    self.state = DebounceState::Idle;
                    None
                }
            }

            DebounceState::Held => {
                // Edges while held are contact bounce.
                self.last_isr_ms = isr_ms;
                if !pressed {
                    self.state = DebounceState::Idle;
                }
                None
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn is_pressed_hw(&self) -> bool {
        !crate::drivers::hw_init::button_level()
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_pressed_hw(&self) -> bool {
        false
    }
}

/// ISR handler: register this on the button GPIO falling edge.
/// Safe to call from interrupt context (lock-free atomic store).
pub fn button_isr_handler(now_ms: u32) {
    // Zero means "no edge yet"; nudge a boot-time edge past it.
    BUTTON_ISR_TIMESTAMP.store(now_ms.max(1), Ordering::Release);
}
