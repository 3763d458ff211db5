//! MQ-3 alcohol sensor driver.
//!
//! Reads the sensor's analog output through an ESP32-S3 ADC channel.
//! No calibration happens here; the raw 12-bit value goes straight into
//! the sample buffer and [`crate::control::bac`] converts the average.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the breath channel of ADC1 via the oneshot API
//! (initialised by hw_init).
//! On host/test: returns an injectable per-instance value.

use crate::app::ports::SensorConversion;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

pub struct AlcoholSensor {
    conversions: u32,
    last_raw: u16,
    #[cfg(not(target_os = "espidf"))]
    sim_raw: u16,
}

impl Default for AlcoholSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl AlcoholSensor {
    pub fn new() -> Self {
        Self {
            conversions: 0,
            last_raw: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_raw: 0,
        }
    }

    /// Value the next simulated conversions return.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_raw(&mut self, raw: u16) {
        self.sim_raw = raw;
    }

    /// Total conversions performed since construction.
    pub fn conversions(&self) -> u32 {
        self.conversions
    }

    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::read_breath()
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        self.sim_raw
    }
}

impl SensorConversion for AlcoholSensor {
    fn convert(&mut self) -> u16 {
        self.conversions = self.conversions.saturating_add(1);
        self.last_raw = self.read_adc();
        self.last_raw
    }
}
