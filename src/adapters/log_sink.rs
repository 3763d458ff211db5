//! Serial-console event sink.
//!
//! One pipe-separated line per [`AppEvent`], tagged so the session can be
//! followed with `grep` on the monitor output. Faults go out at `warn`.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Evaluated { reading, attempt } => {
                info!(
                    "EVAL  | attempt={} | avg={} | bac={} | {:?}",
                    attempt, reading.average, reading.bac, reading.verdict
                );
            }
            AppEvent::Fault(err) => {
                warn!("FAULT | {}", err);
            }
        }
    }
}
