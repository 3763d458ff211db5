//! Fuzz target: `InterlockConfig::from_json`
//!
//! Feeds arbitrary bytes to the configuration override parser and checks:
//! - No panics under any byte sequence
//! - Every accepted document also passes `validate()`
//! - Accepted configs yield PWM reloads that fit the period
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use interlock::config::InterlockConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = InterlockConfig::from_json(json) {
        assert!(config.validate().is_ok());
        assert!(config.pwm_high_ticks() + config.pwm_low_ticks() <= config.pwm_period_ticks);
        assert!(config.driver_name.len() <= interlock::config::DRIVER_NAME_CAP);
        assert!(config.contact_digits.iter().all(|&d| d <= 9));
    }
});
