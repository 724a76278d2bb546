//! Reference block.
//!
//! Performs no real computation: `tick` republishes every config scalar on
//! the output of the same role, and a received frame's first byte lands in
//! `outputs_uint8`.  New blocks start as a copy of this file.
//!
//! `parse_frame` runs on the bus-receive context and `tick` on the timer
//! context; both write `outputs_uint8`.  Whichever ran last before the
//! next read wins.  Wrap the instance in
//! [`SharedBlock`](crate::app::shared::SharedBlock) when the two contexts
//! can preempt each other.

use embedded_can::Id;
use serde::{Deserialize, Serialize};

use crate::block::{Block, CanBlock, FrameContext, InitContext, TickContext};
use crate::block_record;
use crate::config::{BlockConfig, DEFAULT_TICKS_PER_S};
use crate::error::{DecodeError, Result};

block_record! {
    /// Updated from links to other blocks or from measurements before
    /// every tick.
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct ExampleInputs {
        pub inputs_bool: bool,
        pub inputs_uint8: u8,
        pub inputs_uint16: u16,
        pub inputs_uint32: u32,
        pub inputs_int8: i8,
        pub inputs_int16: i16,
        pub inputs_int32: i32,
        pub inputs_float: f32 ("RPM", "Notes will show up as tooltips in xVCU"),
    }
}

block_record! {
    /// Published to other blocks and measurements.
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct ExampleOutputs {
        pub outputs_bool: bool,
        pub outputs_uint8: u8,
        pub outputs_uint16: u16,
        pub outputs_uint32: u32,
        pub outputs_int8: i8,
        pub outputs_int16: i16,
        pub outputs_int32: i32,
        pub outputs_float: f32,
    }
}

/// Block housekeeping, never seen by other blocks.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct ExampleInternal {
    pub internal_bool: bool,
    pub internal_uint8: u8,
    pub internal_uint16: u16,
    pub internal_uint32: u32,
    pub internal_int8: i8,
    pub internal_int16: i16,
    pub internal_int32: i32,
    pub internal_float: f32,
}

block_record! {
    /// Set once at startup, typically from NVM.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ExampleConfig {
        pub ticks_per_s: u8 ("Hz", "Rate at which tick is called"),
        pub config_bool: bool,
        pub config_uint8: u8,
        pub config_uint16: u16,
        pub config_uint32: u32,
        pub config_int8: i8,
        pub config_int16: i16,
        pub config_int32: i32,
        pub config_float: f32,
    }
}

impl BlockConfig for ExampleConfig {
    fn ticks_per_s(&self) -> u8 {
        self.ticks_per_s
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleBlock;

impl Block for ExampleBlock {
    const NAME: &'static str = "example_block";

    type Inputs = ExampleInputs;
    type Outputs = ExampleOutputs;
    type Internal = ExampleInternal;
    type Config = ExampleConfig;

    fn init(&self, ctx: InitContext<'_, Self>) -> Result<()> {
        ctx.config.ticks_per_s = DEFAULT_TICKS_PER_S;
        ctx.config.config_uint8 = 1;
        Ok(())
    }

    fn tick(&self, ctx: TickContext<'_, Self>) {
        let cfg = ctx.config;
        let out = ctx.outputs;
        out.outputs_bool = cfg.config_bool;
        out.outputs_uint8 = cfg.config_uint8;
        out.outputs_uint16 = cfg.config_uint16;
        out.outputs_uint32 = cfg.config_uint32;
        out.outputs_int8 = cfg.config_int8;
        out.outputs_int16 = cfg.config_int16;
        out.outputs_int32 = cfg.config_int32;
        out.outputs_float = cfg.config_float;
    }
}

impl CanBlock for ExampleBlock {
    // The host routes only this block's identifiers here, so `accepts`
    // keeps the default and the id is not inspected.
    fn parse_frame(
        &self,
        _id: Id,
        payload: &[u8],
        ctx: FrameContext<'_, Self>,
    ) -> core::result::Result<(), DecodeError> {
        let first = payload.first().ok_or(DecodeError::ShortPayload {
            needed: 1,
            got: payload.len(),
        })?;
        ctx.outputs.outputs_uint8 = *first;
        Ok(())
    }
}
