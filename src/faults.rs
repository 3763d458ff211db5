//! Runtime fault monitor.
//!
//! The two recoverable fault kinds (sensor out-of-range and timer
//! misconfiguration) never stop the session. The monitor tallies them,
//! keeps a "seen" bitmask, and logs `error!` the first time a kind shows
//! up and `warn!` on every repeat so a flaky sensor does not flood the log
//! at error level.

use log::{error, warn};

use crate::error::{Error, FaultKind};

/// Per-kind fault tally.
#[derive(Debug, Default)]
pub struct FaultMonitor {
    /// Bitmask of kinds seen since boot (see [`FaultKind::mask`]).
    seen: u8,
    counts: [u32; FaultKind::ALL.len()],
}

impl FaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recoverable fault. Errors that are not runtime faults are
    /// logged and otherwise ignored.
    pub fn record(&mut self, err: Error) {
        let Some(kind) = err.kind() else {
            error!("FAULT: unexpected non-recoverable error at runtime: {err}");
            return;
        };

        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_add(1);

        if self.seen & kind.mask() == 0 {
            self.seen |= kind.mask();
            error!("FAULT SET: {kind} ({err})");
        } else {
            warn!("FAULT repeat #{}: {err}", *slot);
        }
    }

    /// Number of faults of `kind` recorded since boot.
    pub fn count(&self, kind: FaultKind) -> u32 {
        self.counts[kind.index()]
    }

    /// Bitmask of every kind seen since boot.
    pub fn seen(&self) -> u8 {
        self.seen
    }

    pub fn has_seen(&self, kind: FaultKind) -> bool {
        self.seen & kind.mask() != 0
    }
}
