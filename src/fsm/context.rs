//! Shared mutable context threaded through every FSM handler.
//!
//! `SessionContext` is the blackboard that state handlers read from and
//! write to: attempt counter, enabled flag, latest average, evaluation
//! latch, and the side-effect commands the service applies after each
//! dispatch. Handlers never touch hardware themselves.

use crate::config::InterlockConfig;
use crate::control::bac::BacEvaluator;
use crate::messages::Screen;

// ---------------------------------------------------------------------------
// Press interpretation
// ---------------------------------------------------------------------------

/// What a debounced button press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressIntent {
    /// Odd press: start (or restart) a breath test.
    StartBreathTest,
    /// Even press: act on the current result (shut down, retry, or lock out).
    ReactToResult,
}

/// Counts presses since boot; the count's parity selects the intent.
///
/// The first press is odd. The count is never reset, so after a lockout
/// the next odd press starts another breath test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressCounter {
    presses: u32,
}

impl PressCounter {
    pub const fn new() -> Self {
        Self { presses: 0 }
    }

    /// Count one more press and return how to interpret it.
    pub fn interpret_next(&mut self) -> PressIntent {
        self.presses = self.presses.wrapping_add(1);
        if self.presses % 2 == 1 {
            PressIntent::StartBreathTest
        } else {
            PressIntent::ReactToResult
        }
    }

    pub fn count(&self) -> u32 {
        self.presses
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Inputs the session FSM reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Press(PressIntent),
    /// Evaluation channel fired.
    EvaluationDue,
}

/// Which prompt the next `AwaitingBreath` entry shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Prompt {
    #[default]
    Start,
    Retry,
}

// ---------------------------------------------------------------------------
// Side-effect commands (written by handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Requests the service applies after a dispatch, then clears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCommands {
    /// Screen to render.
    pub screen: Option<Screen>,
    /// Restart the sampler cadence and both timer channels.
    pub restart_episode: bool,
    /// Disarm the evaluation channel.
    pub halt_evaluation: bool,
    /// Drive the indicator low now.
    pub indicator_off: bool,
}

impl SessionCommands {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct SessionContext {
    pub config: InterlockConfig,

    // -- Session --
    /// Completed evaluations, saturating at `config.max_attempts`.
    pub attempts: u8,
    /// Engine (headlight) output allowed to toggle.
    pub enabled: bool,
    /// Prompt for the next `AwaitingBreath` entry.
    pub prompt: Prompt,

    // -- Evaluation --
    /// Latest buffer average, refreshed by the background step.
    pub average: u16,
    pub evaluator: BacEvaluator,
    /// Result screen already rendered for this episode.
    pub result_displayed: bool,

    // -- Outputs --
    pub commands: SessionCommands,
}

impl SessionContext {
    pub fn new(config: InterlockConfig) -> Self {
        Self {
            config,
            attempts: 0,
            enabled: false,
            prompt: Prompt::Start,
            average: 0,
            evaluator: BacEvaluator::new(),
            result_displayed: false,
            commands: SessionCommands::default(),
        }
    }

    /// `true` while another completed evaluation is allowed.
    pub fn attempts_remaining(&self) -> bool {
        self.attempts < self.config.max_attempts
    }

    /// Take the pending commands, leaving none behind.
    pub fn take_commands(&mut self) -> SessionCommands {
        core::mem::take(&mut self.commands)
    }
}
