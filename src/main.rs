//! Ignition Interlock Firmware: Main Entry Point
//!
//! Hexagonal architecture: a polled main loop plus channel servicing in the
//! esp_timer task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter                           LogEventSink        │
//! │  (HD44780 · headlights · esp_timer · ADC)  (EventSink)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          InterlockService (pure logic)                 │    │
//! │  │  FSM · Sampler · Scheduler · BAC latch                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SharedInterlock (critical section) · ButtonDriver (ISR)       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The button ISR only stores an edge timestamp. The channel callbacks raise
//! their flag and service it on the spot through [`on_channel_expiry`], so the
//! headlight PWM keeps its sub-millisecond phases. The loop below handles
//! presses and sample-clock ticks, then refreshes the average. Every service
//! call runs inside one critical section.

#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use interlock::adapters::hardware::HardwareAdapter;
use interlock::adapters::log_sink::LogEventSink;
use interlock::app::service::InterlockService;
use interlock::app::shared::SharedInterlock;
use interlock::config::InterlockConfig;
use interlock::drivers::button::{ButtonDriver, ButtonEvent};
use interlock::drivers::hw_init;
use interlock::drivers::hw_timer::{self, MultiRateTimer};
use interlock::drivers::lcd::Hd44780;
use interlock::error::Error;
use interlock::pins;
use interlock::sensors::alcohol::AlcoholSensor;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type Board = HardwareAdapter<Hd44780<OutPin, Ets>, OutPin>;

static INTERLOCK: SharedInterlock<Board> = SharedInterlock::new();

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Ignition Interlock v{}             ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (build-time override or defaults) ───────────
    let config = load_config();

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals().context("peripheral init")?;
    let mut timer = MultiRateTimer::new(&config);
    timer.start().context("multi-rate timer init")?;
    hw_init::init_isr_service().context("GPIO ISR service")?;

    let data: Vec<OutPin> = pins::LCD_DATA_GPIO
        .iter()
        .map(|&gpio| output_pin(gpio))
        .collect::<Result<_>>()?;
    let data: [OutPin; 8] = data
        .try_into()
        .map_err(|_| Error::Init("LCD data bus needs eight pins"))?;

    let mut lcd = Hd44780::new(
        output_pin(pins::LCD_RS_GPIO)?,
        output_pin(pins::LCD_RW_GPIO)?,
        output_pin(pins::LCD_EN_GPIO)?,
        data,
        Ets,
    );
    lcd.init();

    let mut hw = HardwareAdapter::new(
        lcd,
        output_pin(pins::HEADLIGHT_GPIO)?,
        timer,
        AlcoholSensor::new(),
    );

    // ── 4. Service ────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut button = ButtonDriver::new(pins::BUTTON_GPIO, config.button_debounce_ms);

    let mut service = InterlockService::new(config);
    service.start(&mut hw, &mut sink);
    INTERLOCK.install(service, hw);
    hw_timer::set_expiry_hook(on_channel_expiry);

    info!("Entering main loop");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        if let Some(ButtonEvent::Press) = button.tick(now_ms()) {
            INTERLOCK.with(|svc, hw| svc.on_button_press(hw, &mut sink));
        }

        INTERLOCK.with(|svc, hw| svc.service_samples(hw, &mut sink));
        INTERLOCK.with(|svc, _| svc.background_step());

        FreeRtos::delay_ms(1);
    }
}

/// Runs in the esp_timer task each time a channel fires.
fn on_channel_expiry() {
    INTERLOCK.with(|svc, hw| svc.service_timers(hw, &mut LogEventSink::new()));
}

/// Parse `INTERLOCK_CONFIG_JSON` if it was set at build time; fall back to
/// defaults when it is absent or invalid.
fn load_config() -> InterlockConfig {
    let Some(json) = option_env!("INTERLOCK_CONFIG_JSON") else {
        info!("Config: built-in defaults");
        return InterlockConfig::default();
    };
    match InterlockConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: build-time override applied");
            cfg
        }
        Err(e) => {
            warn!("Config override rejected ({}), using defaults", e);
            InterlockConfig::default()
        }
    }
}

fn output_pin(gpio: i32) -> Result<OutPin> {
    // SAFETY: every GPIO number in `pins` is claimed exactly once, here,
    // and none of them is touched through `Peripherals`.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    PinDriver::output(pin).with_context(|| format!("GPIO{} as output", gpio))
}

fn now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is a monotonic counter read.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1_000) as u32
}
