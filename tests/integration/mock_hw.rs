//! Mock hardware for integration tests.
//!
//! The real [`HardwareAdapter`] is used with a recording headlight pin and
//! the in-memory [`TextDisplay`], so the full port wiring is exercised.
//! [`Rig`] drives simulated time and records every headlight edge.

use interlock::adapters::hardware::HardwareAdapter;
use interlock::adapters::text_display::TextDisplay;
use interlock::app::events::AppEvent;
use interlock::app::ports::EventSink;
use interlock::app::service::InterlockService;
use interlock::config::InterlockConfig;
use interlock::drivers::hw_timer::MultiRateTimer;
use interlock::fsm::StateId;
use interlock::sensors::alcohol::AlcoholSensor;

/// Ticks per second of the reference timer clock.
pub const TICKS_PER_SEC: u64 = 30_000_000;
/// Evaluation delay of the reference configuration.
pub const EVAL_TICKS: u64 = 120_000_000;
/// One pass of the firmware main loop (1 ms).
pub const LOOP_PASS_TICKS: u64 = TICKS_PER_SEC / 1000;

// ── MockPin ───────────────────────────────────────────────────

/// Output pin that records every level written to it.
#[derive(Debug, Default)]
pub struct MockPin {
    pub writes: Vec<bool>,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.writes.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.writes.push(true);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn transitions(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn evaluations(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Evaluated { .. }))
            .count()
    }

    pub fn faults(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Fault(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Board = HardwareAdapter<TextDisplay, MockPin>;

/// Service + hardware + sink, plus a log of headlight edges as
/// `(elapsed_ticks, level)`.
pub struct Rig {
    pub service: InterlockService,
    pub hw: Board,
    pub sink: RecordingSink,
    pub edges: Vec<(u64, bool)>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: InterlockConfig) -> Self {
        let mut hw = HardwareAdapter::new(
            TextDisplay::new(),
            MockPin::default(),
            MultiRateTimer::new(&config),
            AlcoholSensor::new(),
        );
        let mut sink = RecordingSink::default();
        let mut service = InterlockService::new(config);
        service.start(&mut hw, &mut sink);
        Self {
            service,
            hw,
            sink,
            edges: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(InterlockConfig::default())
    }

    pub fn press(&mut self) -> StateId {
        let state = self.service.on_button_press(&mut self.hw, &mut self.sink);
        self.record_edge();
        state
    }

    pub fn set_sensor(&mut self, raw: u16) {
        self.hw.sensor_mut().set_sim_raw(raw);
    }

    pub fn now(&self) -> u64 {
        self.hw.timer().elapsed_ticks()
    }

    /// Advance simulated time by `ticks`, servicing every expiry on the
    /// way and running a background step after each.
    pub fn run_for(&mut self, ticks: u64) {
        let target = self.now() + ticks;
        while self.now() < target {
            let left = u32::try_from(target - self.now()).unwrap_or(u32::MAX);
            self.hw.timer_mut().step(left);
            self.service.poll_timers(&mut self.hw, &mut self.sink);
            self.service.background_step();
            self.record_edge();
        }
    }

    /// Run the firmware's split for `passes` loop passes: every channel
    /// expiry is serviced the moment it fires, as the esp_timer hook does,
    /// while sample ticks and the average wait for the end of each pass.
    pub fn run_loop_passes(&mut self, passes: u32) {
        for _ in 0..passes {
            let target = self.now() + LOOP_PASS_TICKS;
            while self.now() < target {
                let left = u32::try_from(target - self.now()).unwrap_or(u32::MAX);
                self.hw.timer_mut().step(left);
                self.service.service_timers(&mut self.hw, &mut self.sink);
                self.record_edge();
            }
            self.service.service_samples(&mut self.hw, &mut self.sink);
            self.service.background_step();
        }
    }

    /// One full breath episode: wait out the evaluation delay.
    pub fn run_episode(&mut self) {
        self.run_for(EVAL_TICKS);
    }

    pub fn line(&self, row: usize) -> String {
        self.hw.display().line(row)
    }

    pub fn state(&self) -> StateId {
        self.service.state()
    }

    fn record_edge(&mut self) {
        let level = self.hw.headlights_on();
        let last = self.edges.last().is_some_and(|&(_, l)| l);
        if level != last {
            self.edges.push((self.now(), level));
        }
    }

    /// Lengths of completed high and low runs, in order, from `edges`.
    pub fn runs(&self) -> Vec<(bool, u64)> {
        self.edges
            .windows(2)
            .map(|w| (w[0].1, w[1].0 - w[0].0))
            .collect()
    }
}

/// Reference configuration with a calibration sensitive enough for a
/// 12-bit reading to fail, and a sample clock fast enough to fill the
/// whole buffer within one evaluation delay.
#[allow(dead_code)]
pub fn sensitive_config() -> InterlockConfig {
    InterlockConfig {
        bac_scale_numerator: 1_671_600_000,
        sample_interval_ms: 100,
        ..InterlockConfig::default()
    }
}
