//! Linear scaling block.
//!
//! `value = input * gain + offset`, optionally clamped.  Never touches the
//! bus, so it implements [`Block`] only and has no frame handler.

use serde::{Deserialize, Serialize};

use crate::block::{Block, InitContext, TickContext};
use crate::block_record;
use crate::config::{BlockConfig, DEFAULT_TICKS_PER_S, validate_tick_rate};
use crate::error::{ConfigError, Result};

block_record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct ScaleInputs {
        pub input: f32,
    }
}

block_record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct ScaleOutputs {
        pub value: f32,
        pub saturated: bool ("", "Set while the result is clamped"),
    }
}

block_record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ScaleConfig {
        pub ticks_per_s: u8 ("Hz"),
        pub gain: f32,
        pub offset: f32,
        pub min: f32,
        pub max: f32,
    }
}

impl BlockConfig for ScaleConfig {
    fn ticks_per_s(&self) -> u8 {
        self.ticks_per_s
    }

    fn validate(&self) -> core::result::Result<(), ConfigError> {
        validate_tick_rate(self.ticks_per_s)?;
        if !self.gain.is_finite() || !self.offset.is_finite() {
            return Err(ConfigError::ValidationFailed("gain and offset must be finite"));
        }
        // clamp() panics on NaN bounds.
        if self.min.is_nan() || self.max.is_nan() {
            return Err(ConfigError::ValidationFailed("min and max must be numbers"));
        }
        if self.min > self.max {
            return Err(ConfigError::ValidationFailed("min must be <= max"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScaleBlock;

impl Block for ScaleBlock {
    const NAME: &'static str = "scale";

    type Inputs = ScaleInputs;
    type Outputs = ScaleOutputs;
    type Internal = ();
    type Config = ScaleConfig;

    fn init(&self, ctx: InitContext<'_, Self>) -> Result<()> {
        ctx.config.ticks_per_s = DEFAULT_TICKS_PER_S;
        ctx.config.gain = 1.0;
        ctx.config.min = f32::MIN;
        ctx.config.max = f32::MAX;
        Ok(())
    }

    #[allow(clippy::float_cmp)]
    fn tick(&self, ctx: TickContext<'_, Self>) {
        let cfg = ctx.config;
        let raw = ctx.inputs.input.mul_add(cfg.gain, cfg.offset);
        let value = if raw.is_nan() { 0.0 } else { raw.clamp(cfg.min, cfg.max) };
        ctx.outputs.saturated = value != raw;
        ctx.outputs.value = value;
    }
}
