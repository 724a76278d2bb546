//! Loopback CAN transport.
//!
//! Implements [`CanSend`] by pushing frames into a bounded `embassy-sync`
//! channel instead of onto a wire.  Every clone of a [`LoopbackBus`] shares
//! the same queue, so one clone can be handed to a block instance while the
//! host keeps another to drain what was sent, or to feed it back into
//! [`Registry::dispatch_frame`](crate::app::registry::Registry::dispatch_frame).
//!
//! ```text
//! ┌──────────────┐  CanFrame   ┌──────────────┐
//! │ block.tick() │───────────▶│  host drain   │
//! └──────────────┘  (bounded)  └──────────────┘
//! ```

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{debug, warn};

use crate::app::ports::CanSend;
use crate::can::CanFrame;
use crate::error::BusError;

/// Frames a loopback queue holds before `send` reports `TxFull`.
pub const LOOPBACK_DEPTH: usize = 32;

type FrameQueue = Channel<CriticalSectionRawMutex, CanFrame, LOOPBACK_DEPTH>;

#[derive(Clone)]
pub struct LoopbackBus {
    queue: Arc<FrameQueue>,
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Channel::new()),
        }
    }

    /// Take the oldest queued frame.
    pub fn recv(&self) -> Option<CanFrame> {
        self.queue.try_receive().ok()
    }

    /// Take up to [`LOOPBACK_DEPTH`] queued frames in FIFO order.
    pub fn drain(&self) -> heapless::Vec<CanFrame, LOOPBACK_DEPTH> {
        let mut out = heapless::Vec::new();
        while !out.is_full() {
            let Some(frame) = self.recv() else {
                break;
            };
            if out.push(frame).is_err() {
                break;
            }
        }
        out
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl CanSend for LoopbackBus {
    fn send(&mut self, frame: &CanFrame) -> Result<(), BusError> {
        match self.queue.try_send(*frame) {
            Ok(()) => {
                debug!(
                    "TX | id=0x{:X} dlc={} data={:02X?}",
                    frame.raw_id(),
                    frame.dlc(),
                    frame.data()
                );
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!("TX | loopback queue full, dropping 0x{:X}", frame.raw_id());
                Err(BusError::TxFull)
            }
        }
    }
}
