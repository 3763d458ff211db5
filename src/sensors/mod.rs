//! Sensor subsystem: the breath sampling pipeline and the alcohol sensor
//! driver that feeds it.
//!
//! [`alcohol::AlcoholSensor`] is the only hardware source; everything in
//! [`breath`] is pure and runs identically on the host.

pub mod alcohol;
pub mod breath;
