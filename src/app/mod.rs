//! Host side of the block contract: zero I/O.
//!
//! Owns block instances, enforces their lifecycle, and drives many blocks
//! through one type-erased registry.  All interaction with buses, storage
//! and logging happens through the **port traits** in [`ports`], keeping
//! this layer testable without real peripherals.

pub mod events;
pub mod instance;
pub mod ports;
pub mod registry;
pub mod shared;
