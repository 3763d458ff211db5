//! Fuzz target: session driven by arbitrary press/time/sensor sequences
//!
//! Each input byte pair is decoded into one operation against the full
//! service on the simulated timer. Verifies:
//! - No panics
//! - EnabledFlag set only in `EngineEnabled`
//! - Attempts never exceed the configured maximum and never decrease
//!
//! cargo fuzz run fuzz_session_ops

#![no_main]

use interlock::adapters::hardware::HardwareAdapter;
use interlock::adapters::text_display::TextDisplay;
use interlock::app::events::AppEvent;
use interlock::app::ports::EventSink;
use interlock::app::service::InterlockService;
use interlock::config::InterlockConfig;
use interlock::drivers::hw_timer::MultiRateTimer;
use interlock::fsm::StateId;
use interlock::sensors::alcohol::AlcoholSensor;
use libfuzzer_sys::fuzz_target;

struct NullPin;

impl embedded_hal::digital::ErrorType for NullPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for NullPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = InterlockConfig {
        bac_scale_numerator: 1_671_600_000,
        sample_interval_ms: 100,
        ..InterlockConfig::default()
    };
    let max = config.max_attempts;

    let mut hw = HardwareAdapter::new(
        TextDisplay::new(),
        NullPin,
        MultiRateTimer::new(&config),
        AlcoholSensor::new(),
    );
    let mut sink = NullSink;
    let mut svc = InterlockService::new(config);
    svc.start(&mut hw, &mut sink);

    let mut prev_attempts = 0;
    for pair in data.chunks_exact(2).take(64) {
        let arg = u16::from(pair[1]);
        match pair[0] % 3 {
            0 => {
                svc.on_button_press(&mut hw, &mut sink);
            }
            1 => {
                // Up to ~4.3 s of simulated time, in 1 ms units.
                let target = hw.timer().elapsed_ticks() + u64::from(arg) * 17 * 30_000;
                while hw.timer().elapsed_ticks() < target {
                    let left = (target - hw.timer().elapsed_ticks()).min(u64::from(u32::MAX));
                    hw.timer_mut().step(left as u32);
                    svc.poll_timers(&mut hw, &mut sink);
                    svc.background_step();
                }
            }
            _ => hw.sensor_mut().set_sim_raw(arg * 17),
        }

        assert_eq!(svc.is_enabled(), svc.state() == StateId::EngineEnabled);
        assert!(svc.attempts() <= max);
        assert!(svc.attempts() >= prev_attempts);
        prev_attempts = svc.attempts();
    }
});
