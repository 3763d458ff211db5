//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌────────────────┬───────────┬──────────┬──────────────────────┐ │
//! │  │ StateId        │ on_enter  │ on_exit  │ on_event             │ │
//! │  ├────────────────┼───────────┼──────────┼──────────────────────┤ │
//! │  │ Idle           │ fn(ctx)   │    -     │ fn(ctx, ev)->Option<>│ │
//! │  │ AwaitingBreath │ fn(ctx)   │    -     │ fn(ctx, ev)->Option<>│ │
//! │  │ ResultReady    │ fn(ctx)   │    -     │ fn(ctx, ev)->Option<>│ │
//! │  │ EngineEnabled  │ fn(ctx)   │ fn(ctx)  │ fn(ctx, ev)->Option<>│ │
//! │  │ LockedOut      │ fn(ctx)   │    -     │ fn(ctx, ev)->Option<>│ │
//! │  │ Shutdown       │ fn(ctx)   │    -     │ fn(ctx, ev)->Option<>│ │
//! │  └────────────────┴───────────┴──────────┴──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each dispatch calls `on_event` for the **current** state. If it returns
//! `Some(next_id)`, the engine runs `on_exit` for the current state, then
//! `on_enter` for the next, and updates the current pointer. A handler may
//! name its own state: exit and enter run again, which is how a retry
//! re-arms an episode. All functions receive `&mut SessionContext`.

pub mod context;
pub mod states;

use context::{SessionContext, SessionEvent};
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all session states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    AwaitingBreath = 1,
    ResultReady = 2,
    EngineEnabled = 3,
    LockedOut = 4,
    Shutdown = 5,
}

impl StateId {
    /// Total number of states: used to size the table array.
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::AwaitingBreath,
        Self::ResultReady,
        Self::EngineEnabled,
        Self::LockedOut,
        Self::Shutdown,
    ];

    /// Convert an index back to `StateId`. Asserts in debug builds; falls
    /// back to `LockedOut` (output disabled) in release.
    pub fn from_index(idx: usize) -> Self {
        match Self::ALL.get(idx) {
            Some(&id) => id,
            None => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::LockedOut
            }
        }
    }

    /// States in which a breath episode is running and the evaluation
    /// channel is expected to fire.
    pub const fn episode_active(self) -> bool {
        matches!(
            self,
            Self::AwaitingBreath | Self::ResultReady | Self::EngineEnabled
        )
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut SessionContext);

/// Signature for the event handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEventFn = fn(&mut SessionContext, SessionEvent) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The session state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Transitions executed since start (self-transitions included).
    transitions: u32,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `dispatch()`.
    pub fn start(&mut self, ctx: &mut SessionContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Deliver one event to the current state.
    ///
    /// Returns the state entered, if the handler requested a transition.
    pub fn dispatch(&mut self, ctx: &mut SessionContext, event: SessionEvent) -> Option<StateId> {
        let next = (self.table[self.current].on_event)(ctx, event)?;
        self.transition(next, ctx);
        Some(next)
    }

    /// Jump straight to `next`, running exit/enter. Test and bring-up aid.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut SessionContext) {
        self.transition(next, ctx);
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut SessionContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.transitions = self.transitions.wrapping_add(1);

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
