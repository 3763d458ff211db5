//! Board bring-up: breath ADC, button input, and the GPIO interrupt.
//!
//! Runs once from `main()` before the service starts. The LCD bus and the
//! headlight pin are claimed as `esp-idf-hal` `PinDriver`s in `main()`, so
//! only the peripherals that are read from raw sys calls live here.

use core::fmt;

use crate::pins;

/// Which bring-up step failed, with the ESP-IDF return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    Adc(i32),
    ButtonInput(i32),
    ButtonIsr(i32),
    Timer(i32),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (step, rc) = match self {
            Self::Adc(rc) => ("breath ADC setup", rc),
            Self::ButtonInput(rc) => ("button GPIO setup", rc),
            Self::ButtonIsr(rc) => ("button interrupt hookup", rc),
            Self::Timer(rc) => ("esp_timer creation", rc),
        };
        write!(f, "{step} failed (rc={rc})")
    }
}

impl core::error::Error for InitError {}

/// Map an ESP-IDF return code onto `Ok` or the given step's error.
pub fn check(rc: i32, step: fn(i32) -> InitError) -> Result<(), InitError> {
    if rc == 0 { Ok(()) } else { Err(step(rc)) }
}

/// ADC1 channel the alcohol sensor is wired to.
pub const BREATH_CHANNEL: u32 = pins::BREATH_ADC_CHANNEL;

// ---------------------------------------------------------------------------
// ESP-IDF
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
mod board {
    use esp_idf_svc::sys::*;
    use log::info;

    use super::{BREATH_CHANNEL, InitError, check};
    use crate::drivers::button::button_isr_handler;
    use crate::pins;

    /// Oneshot unit handle. Written once by `configure_breath_adc`, read
    /// afterwards only from the main loop.
    static mut BREATH_ADC: adc_oneshot_unit_handle_t = core::ptr::null_mut();

    pub fn configure_breath_adc() -> Result<(), InitError> {
        let unit = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        // The MQ-3 divider swings up to ~3.1 V: 12 dB attenuation, 12 bits.
        let channel = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: boot path, single-threaded, before any read.
        unsafe {
            check(adc_oneshot_new_unit(&unit, &raw mut BREATH_ADC), InitError::Adc)?;
            check(
                adc_oneshot_config_channel(BREATH_ADC, BREATH_CHANNEL, &channel),
                InitError::Adc,
            )?;
        }
        info!("hw_init: breath sensor on ADC1 CH{}", BREATH_CHANNEL);
        Ok(())
    }

    pub fn read_breath_adc() -> Option<u16> {
        let mut raw = 0i32;
        // SAFETY: the handle was set at boot and is only read here.
        let rc = unsafe { adc_oneshot_read(BREATH_ADC, BREATH_CHANNEL, &mut raw) };
        if rc != 0 {
            return None;
        }
        u16::try_from(raw).ok()
    }

    pub fn configure_button() -> Result<(), InitError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        // SAFETY: plain register configuration of an unclaimed pin.
        check(unsafe { gpio_config(&cfg) }, InitError::ButtonInput)?;
        info!("hw_init: button on GPIO{} (active low)", pins::BUTTON_GPIO);
        Ok(())
    }

    pub fn button_level() -> bool {
        // SAFETY: read-only level access on a configured input.
        unsafe { gpio_get_level(pins::BUTTON_GPIO) != 0 }
    }

    unsafe extern "C" fn on_button_edge(_arg: *mut core::ffi::c_void) {
        // SAFETY: esp_timer_get_time only reads the RTC counter.
        let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
        button_isr_handler(now_ms);
    }

    pub fn hook_button_isr() -> Result<(), InitError> {
        // SAFETY: the handler only stores into an atomic.
        unsafe {
            let rc = gpio_install_isr_service(0);
            // Already installed by another component is fine.
            if rc != ESP_ERR_INVALID_STATE {
                check(rc, InitError::ButtonIsr)?;
            }
            check(
                gpio_isr_handler_add(pins::BUTTON_GPIO, Some(on_button_edge), core::ptr::null_mut()),
                InitError::ButtonIsr,
            )?;
            check(gpio_intr_enable(pins::BUTTON_GPIO), InitError::ButtonIsr)?;
        }
        info!("hw_init: button interrupt armed");
        Ok(())
    }
}

/// Configure the breath ADC and the button input.
#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), InitError> {
    board::configure_breath_adc()?;
    board::configure_button()
}

/// Route button edges to [`button_isr_handler`](crate::drivers::button::button_isr_handler).
/// Call after [`init_peripherals`].
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), InitError> {
    board::hook_button_isr()
}

/// One breath conversion. A failed read reports a value past the 12-bit
/// range so the sampler counts it as a sensor fault.
#[cfg(target_os = "espidf")]
pub fn read_breath() -> u16 {
    board::read_breath_adc().unwrap_or(u16::MAX)
}

/// Raw button line level (`true` = released, pull-up).
#[cfg(target_os = "espidf")]
pub fn button_level() -> bool {
    board::button_level()
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), InitError> {
    log::info!("hw_init(sim): no peripherals to configure");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), InitError> {
    log::info!("hw_init(sim): button interrupt not wired");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn button_level() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_bring_up_succeeds() {
        assert_eq!(init_peripherals(), Ok(()));
        assert_eq!(init_isr_service(), Ok(()));
        assert!(button_level(), "released line reads high");
    }

    #[test]
    fn check_maps_nonzero_codes() {
        assert_eq!(check(0, InitError::Adc), Ok(()));
        assert_eq!(check(259, InitError::Timer), Err(InitError::Timer(259)));
    }

    #[test]
    fn display_names_the_step() {
        assert_eq!(
            InitError::ButtonIsr(-1).to_string(),
            "button interrupt hookup failed (rc=-1)"
        );
    }
}
