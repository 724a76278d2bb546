//! Unified error types for the block kit.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! host runtime's error handling uniform.  All variants are `Copy` so they
//! can be passed through tick and frame paths without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// A received frame could not be decoded.
    Decode(DecodeError),
    /// A frame could not be transmitted.
    Bus(BusError),
    /// An operation was called in the wrong lifecycle phase.
    Lifecycle(LifecycleError),
    /// Name-based field access failed.
    Field(FieldError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
            Self::Field(e) => write!(f, "field: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Serialised config does not fit the storage blob.
    TooLarge,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::TooLarge => write!(f, "config blob too large"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Frame decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is shorter than the bytes the decoder needs.
    ShortPayload { needed: usize, got: usize },
    /// Payload is longer than a classic CAN frame allows.
    PayloadTooLong(usize),
    /// The block does not consume this identifier (raw id).
    UnknownFrame(u32),
    /// Signal layout does not fit in a classic CAN payload.
    BadLayout(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortPayload { needed, got } => {
                write!(f, "payload too short: need {needed} bytes, got {got}")
            }
            Self::PayloadTooLong(len) => write!(f, "payload of {len} bytes exceeds 8"),
            Self::UnknownFrame(id) => write!(f, "unrecognised frame id 0x{id:X}"),
            Self::BadLayout(name) => write!(f, "signal '{name}' does not fit in 8 bytes"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No send capability was installed for this block.
    Unavailable,
    /// Transmit queue is full; the frame was dropped.
    TxFull,
    /// Identifier or length is not a valid CAN frame.
    InvalidFrame,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "no bus attached"),
            Self::TxFull => write!(f, "transmit queue full"),
            Self::InvalidFrame => write!(f, "invalid frame"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// `init` has not completed yet.
    NotInitialized,
    /// `init` may only run once.
    AlreadyInitialized,
    /// Config is read-only once the block has started running.
    ConfigFrozen,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "block not initialised"),
            Self::AlreadyInitialized => write!(f, "block already initialised"),
            Self::ConfigFrozen => write!(f, "config is frozen"),
        }
    }
}

impl From<LifecycleError> for Error {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ---------------------------------------------------------------------------
// Field access errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// No field with that name in the record.
    UnknownField,
    /// The value's type does not match the field's declared type.
    TypeMismatch,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField => write!(f, "unknown field"),
            Self::TypeMismatch => write!(f, "type mismatch"),
        }
    }
}

impl From<FieldError> for Error {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
