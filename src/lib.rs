//! xVCU block kit.
//!
//! A block is a unit of computation with typed Inputs, Outputs, Internal
//! state and Config, driven by a host through a fixed lifecycle
//! (`init`, optional `parse_frame`, `tick`).  This crate provides the
//! contract, a CAN signal codec for bus-facing blocks, reference blocks,
//! and a host-side runtime that owns and drives instances.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod block;
pub mod blocks;
pub mod can;
pub mod config;
pub mod error;
pub mod schedule;

pub use app::instance::{BlockInstance, Phase};
pub use app::registry::{BlockHandle, Registry};
pub use block::{Block, CanBlock};
pub use can::CanFrame;
pub use error::{Error, Result};
