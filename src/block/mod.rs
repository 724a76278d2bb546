//! The block contract.
//!
//! A block is a unit of computation with four disjoint records:
//!
//! ```text
//!   host ──▶ Inputs ──┐                      ┌──▶ Outputs ──▶ host / links
//!                     ▼                      │
//!              ┌────────────────────────────────┐
//!   bus ──────▶│ parse_frame        tick        │──▶ bus (optional send)
//!              │        Internal (private)      │
//!              └────────────────────────────────┘
//!                     ▲
//!   NVM ──▶ Config ───┘   (frozen once running)
//! ```
//!
//! Each lifecycle operation receives a context that borrows only the
//! records it may touch, so the ownership rules are enforced by the type
//! system rather than by convention:
//!
//! | Operation     | Inputs | Outputs | Internal | Config |
//! |---------------|--------|---------|----------|--------|
//! | `init`        | –      | –       | `&mut`   | `&mut` |
//! | `parse_frame` | –      | `&mut`  | `&mut`   | `&`    |
//! | `tick`        | `&`    | `&mut`  | `&mut`   | `&`    |
//!
//! Blocks that consume the bus implement [`CanBlock`] in addition to
//! [`Block`].  A block that never reads frames simply does not implement
//! it, so its frame handler does not exist in the compiled program.

pub mod fields;

use embedded_can::Id;

use crate::app::ports::CanSend;
use crate::can::{id_from_raw, CanFrame};
use crate::config::BlockConfig;
use crate::error::{BusError, DecodeError, Result};
use fields::Record;

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// The lifecycle every block variant implements.
pub trait Block {
    /// Block type name, used for logging and as the default NVM key.
    const NAME: &'static str;

    /// Values supplied by the host before each tick.
    type Inputs: Record + Default;
    /// Values published after each tick.
    type Outputs: Record + Default;
    /// Private working state.
    type Internal: Default;
    /// Startup configuration.
    type Config: Record + BlockConfig + Default;

    /// Called exactly once, before any other operation.
    ///
    /// Establishes default config values and any internal state needed
    /// before the first tick.
    fn init(&self, ctx: InitContext<'_, Self>) -> Result<()>;

    /// Called once per period at the configured rate.  Must not block.
    fn tick(&self, ctx: TickContext<'_, Self>);
}

/// A block that consumes frames from a CAN bus.
pub trait CanBlock: Block {
    /// Whether this block consumes frames with `id`.
    ///
    /// The default accepts everything, i.e. the host has already routed
    /// only matching identifiers here.
    fn accepts(&self, _id: Id) -> bool {
        true
    }

    /// Decode a received frame into outputs or internal state.
    fn parse_frame(
        &self,
        id: Id,
        payload: &[u8],
        ctx: FrameContext<'_, Self>,
    ) -> core::result::Result<(), DecodeError>;
}

// ---------------------------------------------------------------------------
// State aggregate
// ---------------------------------------------------------------------------

/// The four records of one block, allocated together.
///
/// `Default` is the host's zero-initialisation.
pub struct BlockData<B: Block + ?Sized> {
    pub inputs: B::Inputs,
    pub outputs: B::Outputs,
    pub internal: B::Internal,
    pub config: B::Config,
}

impl<B: Block + ?Sized> Default for BlockData<B> {
    fn default() -> Self {
        Self {
            inputs: B::Inputs::default(),
            outputs: B::Outputs::default(),
            internal: B::Internal::default(),
            config: B::Config::default(),
        }
    }
}

impl<B: Block + ?Sized> BlockData<B> {
    pub(crate) fn init_context(&mut self) -> InitContext<'_, B> {
        InitContext {
            config: &mut self.config,
            internal: &mut self.internal,
        }
    }

    pub(crate) fn tick_context<'a>(&'a mut self, bus: Bus<'a>) -> TickContext<'a, B> {
        TickContext {
            inputs: &self.inputs,
            outputs: &mut self.outputs,
            internal: &mut self.internal,
            config: &self.config,
            bus,
        }
    }

    pub(crate) fn frame_context(&mut self) -> FrameContext<'_, B> {
        FrameContext {
            outputs: &mut self.outputs,
            internal: &mut self.internal,
            config: &self.config,
        }
    }
}

// ---------------------------------------------------------------------------
// Operation contexts
// ---------------------------------------------------------------------------

/// Records visible to [`Block::init`].
pub struct InitContext<'a, B: Block + ?Sized> {
    pub config: &'a mut B::Config,
    pub internal: &'a mut B::Internal,
}

/// Records visible to [`Block::tick`].
pub struct TickContext<'a, B: Block + ?Sized> {
    pub inputs: &'a B::Inputs,
    pub outputs: &'a mut B::Outputs,
    pub internal: &'a mut B::Internal,
    pub config: &'a B::Config,
    pub bus: Bus<'a>,
}

/// Records visible to [`CanBlock::parse_frame`].
pub struct FrameContext<'a, B: Block + ?Sized> {
    pub outputs: &'a mut B::Outputs,
    pub internal: &'a mut B::Internal,
    pub config: &'a B::Config,
}

// ---------------------------------------------------------------------------
// Bus handle
// ---------------------------------------------------------------------------

/// The optional send capability, as seen from inside `tick`.
pub struct Bus<'a> {
    inner: Option<&'a mut dyn CanSend>,
}

impl<'a> Bus<'a> {
    pub fn new(inner: Option<&'a mut dyn CanSend>) -> Self {
        Self { inner }
    }

    /// A handle with no transport behind it.
    pub fn detached() -> Self {
        Self { inner: None }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    /// Transmit `frame`.
    pub fn send(&mut self, frame: &CanFrame) -> core::result::Result<(), BusError> {
        match self.inner.as_deref_mut() {
            Some(tx) => tx.send(frame),
            None => Err(BusError::Unavailable),
        }
    }

    /// Transmit a frame given as raw id, id kind and payload.
    pub fn send_raw(
        &mut self,
        id: u32,
        extended: bool,
        data: &[u8],
    ) -> core::result::Result<(), BusError> {
        let id = id_from_raw(id, extended).ok_or(BusError::InvalidFrame)?;
        let frame = CanFrame::new(id, data).ok_or(BusError::InvalidFrame)?;
        self.send(&frame)
    }
}
