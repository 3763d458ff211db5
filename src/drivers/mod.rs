//! Peripheral drivers, hardware initialisation, and the timer back-ends.

pub mod button;
pub mod hw_init;
pub mod hw_timer;
pub mod indicator;
pub mod lcd;
