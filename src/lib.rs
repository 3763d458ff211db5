//! Breath-alcohol ignition interlock firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod faults;
pub mod fsm;
pub mod messages;
pub mod pins;
pub mod scheduler;

// Hardware-facing modules. Each one carries a host simulation so the
// crate builds and tests off-target.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;
