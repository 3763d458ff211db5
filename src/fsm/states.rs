//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[odd press]──▶ AWAITING_BREATH ◀──[odd press, any state]
//!                          │      ▲
//!          [evaluation, fail]    │ [even press, attempts left, not enabled]
//!                          ▼      │
//!                       RESULT_READY ──[even press, no attempts left]──▶ LOCKED_OUT
//!
//!  AWAITING_BREATH ──[evaluation, pass]──▶ ENGINE_ENABLED ──[even press]──▶ SHUTDOWN
//! ```
//!
//! A passing verdict never rests in `RESULT_READY`: the engine is enabled in
//! the same dispatch that latches the reading, so no press can land between
//! the verdict and the enable.
//!
//! Presses are handled identically in every state (see [`on_press`]);
//! the states differ only in how they treat the evaluation channel. The PWM
//! channel never reaches the FSM: it only reads the enabled flag.

use super::context::{PressIntent, Prompt, SessionContext, SessionEvent};
use super::{StateDescriptor, StateId};
use crate::messages::Screen;
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_event: press_only,
        },
        // Index 1: AwaitingBreath
        StateDescriptor {
            id: StateId::AwaitingBreath,
            name: "AwaitingBreath",
            on_enter: Some(awaiting_enter),
            on_exit: None,
            on_event: awaiting_event,
        },
        // Index 2: ResultReady
        StateDescriptor {
            id: StateId::ResultReady,
            name: "ResultReady",
            on_enter: Some(result_enter),
            on_exit: None,
            on_event: result_event,
        },
        // Index 3: EngineEnabled
        StateDescriptor {
            id: StateId::EngineEnabled,
            name: "EngineEnabled",
            on_enter: Some(enabled_enter),
            on_exit: Some(enabled_exit),
            on_event: enabled_event,
        },
        // Index 4: LockedOut
        StateDescriptor {
            id: StateId::LockedOut,
            name: "LockedOut",
            on_enter: Some(locked_out_enter),
            on_exit: None,
            on_event: press_only,
        },
        // Index 5: Shutdown
        StateDescriptor {
            id: StateId::Shutdown,
            name: "Shutdown",
            on_enter: Some(shutdown_enter),
            on_exit: None,
            on_event: press_only,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Press handling (shared by every state)
// ═══════════════════════════════════════════════════════════════════════════

/// An odd press always starts a breath test. An even press shuts down an
/// enabled engine, retries while attempts remain, and locks out otherwise.
fn on_press(ctx: &mut SessionContext, intent: PressIntent) -> Option<StateId> {
    match intent {
        PressIntent::StartBreathTest => {
            ctx.prompt = Prompt::Start;
            Some(StateId::AwaitingBreath)
        }
        PressIntent::ReactToResult if ctx.enabled => Some(StateId::Shutdown),
        PressIntent::ReactToResult if ctx.attempts_remaining() => {
            ctx.prompt = Prompt::Retry;
            Some(StateId::AwaitingBreath)
        }
        PressIntent::ReactToResult => Some(StateId::LockedOut),
    }
}

/// Handler for states where the evaluation channel does nothing.
fn press_only(ctx: &mut SessionContext, event: SessionEvent) -> Option<StateId> {
    match event {
        SessionEvent::Press(intent) => on_press(ctx, intent),
        SessionEvent::EvaluationDue => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut SessionContext) {
    ctx.commands.screen = Some(Screen::Welcome);
    info!("IDLE: waiting for first press");
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_BREATH: sampler running, evaluation pending
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_enter(ctx: &mut SessionContext) {
    ctx.evaluator.reset();
    ctx.result_displayed = false;
    ctx.commands.restart_episode = true;
    ctx.commands.screen = Some(match ctx.prompt {
        Prompt::Start => Screen::Start,
        Prompt::Retry => Screen::Retry,
    });
    info!(
        "AWAITING_BREATH: {:?} prompt, attempt {}/{}",
        ctx.prompt,
        ctx.attempts.saturating_add(1),
        ctx.config.max_attempts
    );
}

fn awaiting_event(ctx: &mut SessionContext, event: SessionEvent) -> Option<StateId> {
    match event {
        SessionEvent::Press(intent) => on_press(ctx, intent),
        SessionEvent::EvaluationDue => {
            let (reading, _) = ctx.evaluator.evaluate_once(ctx.average, &ctx.config);
            info!(
                "AWAITING_BREATH: avg={} -> BAC={} ({:?})",
                reading.average, reading.bac, reading.verdict
            );
            if reading.passed() {
                Some(StateId::EngineEnabled)
            } else {
                Some(StateId::ResultReady)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  RESULT_READY: failed verdict on screen
// ═══════════════════════════════════════════════════════════════════════════

/// Draw the latched verdict and count the attempt, once per episode.
fn show_result(ctx: &mut SessionContext, state: &str) {
    if ctx.result_displayed {
        return;
    }
    let Some(reading) = ctx.evaluator.latched() else {
        warn!("{state}: entered without a reading");
        return;
    };
    ctx.commands.screen = Some(Screen::Result {
        bac: reading.bac,
        verdict: reading.verdict,
    });
    ctx.attempts = ctx.attempts.saturating_add(1).min(ctx.config.max_attempts);
    ctx.result_displayed = true;
    info!(
        "{state}: {:?}, attempts used {}/{}",
        reading.verdict, ctx.attempts, ctx.config.max_attempts
    );
}

fn result_enter(ctx: &mut SessionContext) {
    show_result(ctx, "RESULT_READY");
}

fn result_event(ctx: &mut SessionContext, event: SessionEvent) -> Option<StateId> {
    match event {
        SessionEvent::Press(intent) => on_press(ctx, intent),
        SessionEvent::EvaluationDue => {
            debug!("RESULT_READY: evaluation already latched");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ENGINE_ENABLED: headlights PWM running
// ═══════════════════════════════════════════════════════════════════════════

fn enabled_enter(ctx: &mut SessionContext) {
    show_result(ctx, "ENGINE_ENABLED");
    ctx.enabled = true;
    info!("ENGINE_ENABLED: ignition allowed");
}

fn enabled_exit(ctx: &mut SessionContext) {
    ctx.enabled = false;
    ctx.commands.indicator_off = true;
}

fn enabled_event(ctx: &mut SessionContext, event: SessionEvent) -> Option<StateId> {
    match event {
        SessionEvent::Press(intent) => on_press(ctx, intent),
        SessionEvent::EvaluationDue => {
            debug!("ENGINE_ENABLED: evaluation already latched");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOCKED_OUT / SHUTDOWN: terminal screens, evaluation halted
// ═══════════════════════════════════════════════════════════════════════════

fn stop_episode(ctx: &mut SessionContext) {
    ctx.enabled = false;
    ctx.commands.indicator_off = true;
    ctx.commands.halt_evaluation = true;
}

fn locked_out_enter(ctx: &mut SessionContext) {
    stop_episode(ctx);
    ctx.commands.screen = Some(Screen::LockedOut);
    warn!(
        "LOCKED_OUT: {} attempts used, ignition refused",
        ctx.attempts
    );
}

fn shutdown_enter(ctx: &mut SessionContext) {
    stop_episode(ctx);
    ctx.commands.screen = Some(Screen::Farewell);
    info!("SHUTDOWN: engine off");
}
