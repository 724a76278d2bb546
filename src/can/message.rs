//! Message layouts: an identifier, a fixed length and the signals it carries.

use embedded_can::Id;

use crate::can::signal::SignalSpec;
use crate::can::{CanFrame, MAX_DLC, raw_id};
use crate::error::{ConfigError, DecodeError};

/// One message from a DBC database.
#[derive(Debug, Clone, Copy)]
pub struct MessageSpec {
    pub name: &'static str,
    pub id: Id,
    /// Payload length in bytes (0 to 8).
    pub length: u8,
    pub signals: &'static [SignalSpec],
}

impl MessageSpec {
    /// Check that the length is legal and every signal fits inside it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if usize::from(self.length) > MAX_DLC {
            return Err(ConfigError::ValidationFailed("message length exceeds 8 bytes"));
        }
        for signal in self.signals {
            match signal.bytes_needed() {
                Some(n) if n <= usize::from(self.length) => {}
                _ => {
                    return Err(ConfigError::ValidationFailed(
                        "signal does not fit in its message",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn matches(&self, id: Id) -> bool {
        self.id == id
    }

    pub fn signal(&self, name: &str) -> Option<&'static SignalSpec> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Reject a payload that is not for this message or too short for it.
    pub fn check(&self, id: Id, payload: &[u8]) -> Result<(), DecodeError> {
        if !self.matches(id) {
            return Err(DecodeError::UnknownFrame(raw_id(id)));
        }
        if payload.len() < usize::from(self.length) {
            return Err(DecodeError::ShortPayload {
                needed: usize::from(self.length),
                got: payload.len(),
            });
        }
        Ok(())
    }

    /// Frame carrying the first `length` bytes of `payload`.
    pub fn frame(&self, payload: &[u8; MAX_DLC]) -> Option<CanFrame> {
        let len = usize::from(self.length).min(MAX_DLC);
        CanFrame::new(self.id, &payload[..len])
    }
}
