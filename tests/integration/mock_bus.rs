//! Mock adapters for integration tests.
//!
//! Record every frame and event so tests can assert on the full history
//! without a real transport.

use std::sync::{Arc, Mutex};

use xvcu_block::app::events::HostEvent;
use xvcu_block::app::ports::{CanSend, EventSink, StoragePort};
use xvcu_block::can::CanFrame;
use xvcu_block::error::{BusError, StorageError};

// ── MockBus ───────────────────────────────────────────────────

/// Send capability that records frames.  Clones share the record.
#[derive(Clone, Default)]
pub struct MockBus {
    sent: Arc<Mutex<Vec<CanFrame>>>,
    fail_with: Option<BusError>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose every send fails with `error`.
    pub fn failing(error: BusError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<CanFrame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.sent().iter().map(CanFrame::raw_id).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl CanSend for MockBus {
    fn send(&mut self, frame: &CanFrame) -> Result<(), BusError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.sent.lock().unwrap().push(*frame);
        Ok(())
    }
}

// ── EventLog ──────────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<HostEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&HostEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &HostEvent) {
        self.events.push(event.clone());
    }
}

// ── BrokenNvm ─────────────────────────────────────────────────

/// Storage whose flash has failed.
pub struct BrokenNvm;

impl StoragePort for BrokenNvm {
    fn read(&self, _: &str, _: &str, _: &mut [u8]) -> Result<usize, StorageError> {
        Err(StorageError::IoError)
    }

    fn write(&mut self, _: &str, _: &str, _: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }

    fn delete(&mut self, _: &str, _: &str) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }

    fn exists(&self, _: &str, _: &str) -> bool {
        false
    }
}
