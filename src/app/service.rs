//! Application service: the hexagonal core.
//!
//! [`InterlockService`] owns the session FSM, the sampling pipeline, the
//! sample scheduler, and the fault monitor. It exposes one entry point per
//! execution context:
//!
//! | Context          | Entry point                                   |
//! |------------------|-----------------------------------------------|
//! | button edge      | [`on_button_press`](InterlockService::on_button_press) |
//! | timer interrupt  | [`service_timers`](InterlockService::service_timers) |
//! | sample clock     | [`service_samples`](InterlockService::service_samples) |
//! | background loop  | [`background_step`](InterlockService::background_step) |
//!
//! The channels must be serviced at their own rate: a PWM phase is well
//! under a millisecond, so `service_timers` belongs in the timer callback,
//! not in a loop paced by the RTOS tick.
//!
//! All I/O flows through port traits injected at call sites.
//!
//! ```text
//!   SensorConversion ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                        │    InterlockService      │
//!   CharacterDisplay ◀── │ FSM · Sampler · Scheduler│
//!   IndicatorOutput  ◀── │       · BAC latch         │
//!   TimerControl     ◀──▶└─────────────────────────┘
//! ```

use log::info;

use crate::config::InterlockConfig;
use crate::control::bac::BacReading;
use crate::error::{Error, FaultKind, TimerFault};
use crate::faults::FaultMonitor;
use crate::fsm::context::{PressCounter, SessionContext, SessionEvent};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::messages;
use crate::scheduler::{Channel, PendingFlags, SampleScheduler};
use crate::sensors::breath::{AnalogSampler, Averager, SAMPLE_CAPACITY, SampleBuffer};

use super::events::AppEvent;
use super::ports::{EventSink, InterlockHardware, SensorConversion, TimerControl};

/// Point-in-time view of the session, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: StateId,
    pub attempts: u8,
    pub enabled: bool,
    pub average: u16,
    pub reading: Option<BacReading>,
    pub presses: u32,
}

// ───────────────────────────────────────────────────────────────
// InterlockService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct InterlockService {
    fsm: Fsm,
    ctx: SessionContext,
    presses: PressCounter,
    sampler: AnalogSampler,
    averager: Averager,
    scheduler: SampleScheduler,
    faults: FaultMonitor,
}

impl InterlockService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(config: InterlockConfig) -> Self {
        let sampler = AnalogSampler::new(config.conversions_per_sample);
        let scheduler = SampleScheduler::new(&config);
        let ctx = SessionContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            presses: PressCounter::new(),
            sampler,
            averager: Averager::new(),
            scheduler,
            faults: FaultMonitor::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Idle` and draw the welcome screen. Timers stay idle until
    /// the first press.
    pub fn start(&mut self, hw: &mut impl InterlockHardware, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        hw.set_indicator(false);
        self.apply_commands(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("InterlockService started in {:?}", self.fsm.current_state());
    }

    // ── Execution-context entry points ────────────────────────

    /// Debounced button press.
    pub fn on_button_press(
        &mut self,
        hw: &mut impl InterlockHardware,
        sink: &mut impl EventSink,
    ) -> StateId {
        let intent = self.presses.interpret_next();
        info!("Press #{} -> {:?}", self.presses.count(), intent);
        self.dispatch(SessionEvent::Press(intent), hw, sink)
    }

    /// Shared timer interrupt. Services the channel `pending` decodes to,
    /// acknowledges it, and returns it; `None` if nothing was pending.
    pub fn on_timer_interrupt(
        &mut self,
        pending: PendingFlags,
        hw: &mut impl InterlockHardware,
        sink: &mut impl EventSink,
    ) -> Option<Channel> {
        let channel = pending.decode()?;

        match channel {
            Channel::Pwm => self.scheduler.pwm_step(self.ctx.enabled, hw),
            Channel::EvaluationDelay => self.on_evaluation_due(hw, sink),
        }

        hw.acknowledge(channel);
        Some(channel)
    }

    /// Sample-clock tick: run the conversions into the ring buffer.
    pub fn on_sample_tick(&mut self, sensor: &mut impl SensorConversion, sink: &mut impl EventSink) {
        let tick = self.sampler.tick(sensor);
        if let Some(fault) = tick.fault {
            self.report(fault.into(), sink);
        }
    }

    /// Background iteration: recompute the average. Never blocks.
    pub fn background_step(&mut self) -> u16 {
        self.ctx.average = self.averager.update(self.sampler.buffer());
        self.ctx.average
    }

    /// Service every raised channel. Returns how many were handled.
    pub fn service_timers(
        &mut self,
        hw: &mut impl InterlockHardware,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut handled = 0;
        while self.on_timer_interrupt(hw.pending(), hw, sink).is_some() {
            handled += 1;
        }
        handled
    }

    /// Run one sample tick per outstanding sample-clock expiry.
    pub fn service_samples(&mut self, hw: &mut impl InterlockHardware, sink: &mut impl EventSink) {
        while hw.take_sample_due() {
            self.on_sample_tick(hw, sink);
        }
    }

    /// [`service_timers`](Self::service_timers) then
    /// [`service_samples`](Self::service_samples), for single-context hosts.
    pub fn poll_timers(&mut self, hw: &mut impl InterlockHardware, sink: &mut impl EventSink) {
        self.service_timers(hw, sink);
        self.service_samples(hw, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn attempts(&self) -> u8 {
        self.ctx.attempts
    }

    pub fn is_enabled(&self) -> bool {
        self.ctx.enabled
    }

    /// Reading latched for the current episode, if evaluated.
    pub fn reading(&self) -> Option<BacReading> {
        self.ctx.evaluator.latched()
    }

    /// Most recent buffer average.
    pub fn average(&self) -> u16 {
        self.ctx.average
    }

    pub fn sample_buffer(&self) -> &SampleBuffer<SAMPLE_CAPACITY> {
        self.sampler.buffer()
    }

    pub fn indicator_level(&self) -> bool {
        self.scheduler.indicator_level()
    }

    pub fn evaluation_armed(&self) -> bool {
        self.scheduler.evaluation_armed()
    }

    pub fn fault_count(&self, kind: FaultKind) -> u32 {
        self.faults.count(kind)
    }

    pub fn config(&self) -> &InterlockConfig {
        &self.ctx.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            attempts: self.ctx.attempts,
            enabled: self.ctx.enabled,
            average: self.ctx.average,
            reading: self.reading(),
            presses: self.presses.count(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_evaluation_due(&mut self, hw: &mut impl InterlockHardware, sink: &mut impl EventSink) {
        if !self.fsm.current_state().episode_active() {
            self.report(TimerFault::NoActiveEpisode(Channel::EvaluationDelay).into(), sink);
            return;
        }

        let fresh = self.ctx.evaluator.latched().is_none();
        self.background_step();
        self.dispatch(SessionEvent::EvaluationDue, hw, sink);

        if let (true, Some(reading)) = (fresh, self.ctx.evaluator.latched()) {
            sink.emit(&AppEvent::Evaluated {
                reading,
                attempt: self.ctx.attempts,
            });
        }
    }

    /// Deliver `event`, emit the transition, and apply the handler commands.
    fn dispatch(
        &mut self,
        event: SessionEvent,
        hw: &mut impl InterlockHardware,
        sink: &mut impl EventSink,
    ) -> StateId {
        let from = self.fsm.current_state();
        if let Some(to) = self.fsm.dispatch(&mut self.ctx, event) {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
        self.apply_commands(hw);
        self.fsm.current_state()
    }

    /// Translate FSM commands into port calls.
    fn apply_commands(&mut self, hw: &mut impl InterlockHardware) {
        let cmds = self.ctx.take_commands();

        if cmds.indicator_off {
            self.scheduler.indicator_off(hw);
        }
        if cmds.halt_evaluation {
            self.scheduler.halt_evaluation(hw);
        }
        if cmds.restart_episode {
            self.sampler.restart();
            self.scheduler.restart(hw);
        }
        if let Some(screen) = cmds.screen {
            messages::render(&screen, &self.ctx.config, hw);
        }
    }

    fn report(&mut self, err: Error, sink: &mut impl EventSink) {
        self.faults.record(err);
        sink.emit(&AppEvent::Fault(err));
    }
}
