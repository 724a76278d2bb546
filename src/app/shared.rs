//! Cross-context access to one block instance.
//!
//! `tick` normally runs from a periodic timer and `parse_frame` from the
//! bus-receive path.  When those can preempt each other the instance is
//! wrapped in a [`SharedBlock`], a critical-section mutex, so the two never
//! interleave inside the block.  Fields both write are last-writer-wins;
//! the order between contexts is the host's.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_can::Id;

use crate::app::instance::BlockInstance;
use crate::block::{Block, CanBlock};
use crate::error::Result;

pub struct SharedBlock<B: Block> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<BlockInstance<B>>>,
}

impl<B: Block> SharedBlock<B> {
    pub fn new(instance: BlockInstance<B>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(instance)),
        }
    }

    /// Run `f` with exclusive access to the instance.
    ///
    /// `f` runs inside a critical section; keep it short.
    pub fn with<R>(&self, f: impl FnOnce(&mut BlockInstance<B>) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }

    pub fn init(&self) -> Result<()> {
        self.with(BlockInstance::init)
    }

    pub fn tick(&self) -> Result<()> {
        self.with(BlockInstance::tick)
    }

    /// Copy of the current outputs.
    pub fn outputs(&self) -> B::Outputs
    where
        B::Outputs: Clone,
    {
        self.with(|inst| inst.outputs().clone())
    }

    pub fn into_inner(self) -> BlockInstance<B> {
        self.inner.into_inner().into_inner()
    }
}

impl<B: CanBlock> SharedBlock<B> {
    pub fn parse_frame(&self, id: Id, payload: &[u8]) -> Result<()> {
        self.with(|inst| inst.parse_frame(id, payload))
    }
}
