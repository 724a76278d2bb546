//! Host-side owner of one block.
//!
//! [`BlockInstance`] holds the block's [`BlockData`] aggregate and enforces
//! the lifecycle:
//!
//! ```text
//!   Uninitialized ──init──▶ Ready ──tick / parse_frame──▶ Running
//!                            │                              │
//!                      config writable               config frozen
//! ```
//!
//! The host writes inputs and reads outputs through the accessors here;
//! the block sees only the contexts handed to its operations.

use embedded_can::Id;
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{CanSend, StoragePort};
use crate::block::fields::{FieldValue, Record};
use crate::block::{Block, BlockData, Bus, CanBlock, FrameContext};
use crate::can::{MAX_DLC, raw_id};
use crate::config::{self, BlockConfig};
use crate::error::{DecodeError, Error, LifecycleError, Result};

/// Lifecycle phase of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Initialised; config may still be written.
    Ready,
    /// At least one tick or frame has run; config is frozen.
    Running,
}

/// Filter half of a frame route.
pub type AcceptsFn<B> = fn(&B, Id) -> bool;

/// Decode half of a frame route.
pub type ParseFn<B> =
    fn(&B, Id, &[u8], FrameContext<'_, B>) -> core::result::Result<(), DecodeError>;

/// Function-pointer view of a [`CanBlock`] implementation, stored so the
/// type-erased registry can deliver frames without knowing `B: CanBlock`.
pub struct FrameRoute<B: Block> {
    pub accepts: AcceptsFn<B>,
    pub parse: ParseFn<B>,
}

impl<B: Block> Clone for FrameRoute<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Block> Copy for FrameRoute<B> {}

/// One block, its data, and the capabilities the host grants it.
pub struct BlockInstance<B: Block> {
    name: &'static str,
    block: B,
    data: BlockData<B>,
    phase: Phase,
    tx: Option<Box<dyn CanSend + Send>>,
    route: Option<FrameRoute<B>>,
    ticks: u64,
}

impl<B: Block> BlockInstance<B> {
    /// Instance of a block that does not consume the bus.
    pub fn new(block: B) -> Self {
        Self {
            name: B::NAME,
            block,
            data: BlockData::default(),
            phase: Phase::Uninitialized,
            tx: None,
            route: None,
            ticks: 0,
        }
    }

    /// Override the instance name (used in logs and as the NVM key).
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Install the bus-send capability.
    #[must_use]
    pub fn with_bus(mut self, tx: impl CanSend + Send + 'static) -> Self {
        self.tx = Some(Box::new(tx));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn block(&self) -> &B {
        &self.block
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ticks executed since `init`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn consumes_frames(&self) -> bool {
        self.route.is_some()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the block's `init`, then validate the resulting config.
    ///
    /// On failure the instance stays `Uninitialized`.
    pub fn init(&mut self) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            return Err(LifecycleError::AlreadyInitialized.into());
        }
        self.block.init(self.data.init_context())?;
        self.data.config.validate()?;
        self.phase = Phase::Ready;
        info!(
            "Block '{}' initialised at {} ticks/s",
            self.name,
            self.data.config.ticks_per_s()
        );
        Ok(())
    }

    /// Run one period.
    pub fn tick(&mut self) -> Result<()> {
        self.start_running()?;
        let bus = Bus::new(self.tx.as_deref_mut().map(|tx| tx as &mut dyn CanSend));
        self.block.tick(self.data.tick_context(bus));
        self.ticks = self.ticks.wrapping_add(1);
        Ok(())
    }

    /// Whether this instance would take a frame with `id`.
    pub fn accepts(&self, id: Id) -> bool {
        self.route.is_some_and(|r| (r.accepts)(&self.block, id))
    }

    /// Deliver a frame through the stored route.
    ///
    /// `Ok(false)` means the instance does not consume `id`.
    pub fn route_frame(&mut self, id: Id, payload: &[u8]) -> Result<bool> {
        let Some(route) = self.route else {
            return Ok(false);
        };
        if !(route.accepts)(&self.block, id) {
            return Ok(false);
        }
        self.deliver(route.parse, id, payload)?;
        Ok(true)
    }

    /// Config freezes only once a frame has actually been decoded.
    fn deliver(&mut self, parse: ParseFn<B>, id: Id, payload: &[u8]) -> Result<()> {
        if self.phase == Phase::Uninitialized {
            return Err(LifecycleError::NotInitialized.into());
        }
        if payload.len() > MAX_DLC {
            return Err(DecodeError::PayloadTooLong(payload.len()).into());
        }
        parse(&self.block, id, payload, self.data.frame_context()).map_err(|e| {
            warn!(
                "Block '{}' rejected frame 0x{:X}: {}",
                self.name,
                raw_id(id),
                e
            );
            Error::from(e)
        })?;
        self.start_running()
    }

    fn start_running(&mut self) -> Result<()> {
        match self.phase {
            Phase::Uninitialized => Err(LifecycleError::NotInitialized.into()),
            Phase::Ready => {
                debug!("Block '{}' config frozen", self.name);
                self.phase = Phase::Running;
                Ok(())
            }
            Phase::Running => Ok(()),
        }
    }

    // ── Config (host side, Ready phase only) ──────────────────

    pub fn config(&self) -> &B::Config {
        &self.data.config
    }

    fn config_writable(&self) -> Result<()> {
        match self.phase {
            Phase::Uninitialized => Err(LifecycleError::NotInitialized.into()),
            Phase::Ready => Ok(()),
            Phase::Running => Err(LifecycleError::ConfigFrozen.into()),
        }
    }

    /// Edit the config before the block starts running.
    ///
    /// The edit is validated as a whole and discarded if invalid.
    pub fn configure(&mut self, edit: impl FnOnce(&mut B::Config)) -> Result<()>
    where
        B::Config: Clone,
    {
        self.config_writable()?;
        let mut candidate = self.data.config.clone();
        edit(&mut candidate);
        candidate.validate()?;
        self.data.config = candidate;
        Ok(())
    }

    /// Write one config field by name (calibration tool path).
    pub fn set_config_field(&mut self, name: &str, value: FieldValue) -> Result<()>
    where
        B::Config: Clone,
    {
        self.config_writable()?;
        let mut candidate = self.data.config.clone();
        candidate.set(name, value)?;
        candidate.validate()?;
        self.data.config = candidate;
        Ok(())
    }

    /// Overlay the config stored in NVM, if any.  Returns whether a stored
    /// config was applied.
    pub fn load_config(&mut self, storage: &impl StoragePort) -> Result<bool>
    where
        B::Config: DeserializeOwned,
    {
        self.config_writable()?;
        match config::load_config::<B::Config>(storage, self.name)? {
            Some(cfg) => {
                self.data.config = cfg;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist the current config.  Allowed in any initialised phase.
    pub fn save_config(&self, storage: &mut impl StoragePort) -> Result<()>
    where
        B::Config: Serialize,
    {
        if self.phase == Phase::Uninitialized {
            return Err(LifecycleError::NotInitialized.into());
        }
        config::save_config(storage, self.name, &self.data.config)
    }

    // ── Inputs (host writes) / Outputs (host reads) ───────────

    pub fn inputs(&self) -> &B::Inputs {
        &self.data.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut B::Inputs {
        &mut self.data.inputs
    }

    pub fn set_input(&mut self, name: &str, value: FieldValue) -> Result<()> {
        self.data.inputs.set(name, value)?;
        Ok(())
    }

    pub fn outputs(&self) -> &B::Outputs {
        &self.data.outputs
    }

    pub fn output(&self, name: &str) -> Option<FieldValue> {
        self.data.outputs.get(name)
    }
}

impl<B: CanBlock> BlockInstance<B> {
    /// Instance of a block that consumes the bus.
    pub fn new_can(block: B) -> Self {
        let mut inst = Self::new(block);
        inst.route = Some(FrameRoute {
            accepts: <B as CanBlock>::accepts,
            parse: <B as CanBlock>::parse_frame,
        });
        inst
    }

    /// Deliver a received frame to the block.
    ///
    /// Frames the block does not accept are rejected with
    /// [`DecodeError::UnknownFrame`].
    ///
    /// ```
    /// use embedded_can::{Id, StandardId};
    /// use xvcu_block::BlockInstance;
    /// use xvcu_block::blocks::example::ExampleBlock;
    ///
    /// let mut inst = BlockInstance::new_can(ExampleBlock);
    /// inst.init().unwrap();
    /// inst.parse_frame(Id::Standard(StandardId::ZERO), &[7]).unwrap();
    /// assert_eq!(inst.outputs().outputs_uint8, 7);
    /// ```
    ///
    /// Bus-free blocks have no frame entry point at all:
    ///
    /// ```compile_fail
    /// use embedded_can::{Id, StandardId};
    /// use xvcu_block::BlockInstance;
    /// use xvcu_block::blocks::scale::ScaleBlock;
    ///
    /// let mut inst = BlockInstance::new(ScaleBlock);
    /// inst.init().unwrap();
    /// inst.parse_frame(Id::Standard(StandardId::ZERO), &[7]).unwrap();
    /// ```
    pub fn parse_frame(&mut self, id: Id, payload: &[u8]) -> Result<()> {
        if !self.block.accepts(id) {
            return Err(DecodeError::UnknownFrame(raw_id(id)).into());
        }
        self.deliver(<B as CanBlock>::parse_frame, id, payload)
    }
}
