//! Port traits — the boundary between blocks and the host's outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BlockInstance / Registry
//! ```
//!
//! Driven adapters (bus transports, event sinks, NVM storage) implement
//! these traits.  Blocks and the host runtime consume them through `dyn` or
//! generics, so block logic never touches a driver directly.

use crate::can::CanFrame;
use crate::error::{BusError, StorageError};

use super::events::HostEvent;

// ───────────────────────────────────────────────────────────────
// Bus send capability (block → transport)
// ───────────────────────────────────────────────────────────────

/// Emit a frame onto a CAN bus without knowing the transport.
///
/// Installed per block instance; a block that never transmits gets none.
/// Implementations must not block: `send` is called from `tick`.
pub trait CanSend {
    fn send(&mut self, frame: &CanFrame) -> Result<(), BusError>;
}

impl<F> CanSend for F
where
    F: FnMut(&CanFrame) -> Result<(), BusError>,
{
    fn send(&mut self, frame: &CanFrame) -> Result<(), BusError> {
        self(frame)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (host → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The host runtime emits structured [`HostEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &HostEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (host ↔ NVM / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for block configs.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic — no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}
