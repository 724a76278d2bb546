//! Outbound host events.
//!
//! The [`Registry`](super::registry::Registry) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them.

use crate::error::{DecodeError, Error};

/// Structured events emitted by the host runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A block completed `init`.
    Initialized { block: &'static str, ticks_per_s: u8 },

    /// A block's `init` or config validation failed; it will not run.
    InitFailed { block: &'static str, error: Error },

    /// A block refused a frame routed to it.
    FrameRejected {
        block: &'static str,
        id: u32,
        error: DecodeError,
    },

    /// No block consumed a received frame.
    FrameUnclaimed { id: u32 },

    /// An output-to-input link could not be applied this step.
    LinkFailed {
        from: &'static str,
        to: &'static str,
        error: Error,
    },
}
