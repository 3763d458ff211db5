//! Breath-alcohol evaluation.

pub mod bac;
