//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing host events through the `log`
//! facade.  A telemetry or calibration-tool adapter would implement the
//! same trait.

use log::{debug, info, warn};

use crate::app::events::HostEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`HostEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &HostEvent) {
        match event {
            HostEvent::Initialized { block, ticks_per_s } => {
                info!("INIT  | {} | {} ticks/s", block, ticks_per_s);
            }
            HostEvent::InitFailed { block, error } => {
                warn!("INIT  | {} | failed: {}", block, error);
            }
            HostEvent::FrameRejected { block, id, error } => {
                warn!("RX    | {} | 0x{:X} rejected: {}", block, id, error);
            }
            HostEvent::FrameUnclaimed { id } => {
                debug!("RX    | 0x{:X} unclaimed", id);
            }
            HostEvent::LinkFailed { from, to, error } => {
                warn!("LINK  | {} -> {} | {}", from, to, error);
            }
        }
    }
}

/// Sink that keeps events in memory, for tests and for the host binary's
/// end-of-run summary.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<HostEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &HostEvent) {
        self.events.push(event.clone());
    }
}
