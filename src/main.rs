//! xVCU host — runs the reference blocks against a simulated bus.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  MemoryNvm        LoopbackBus        LogEventSink          │
//! │  (StoragePort)    (CanSend)          (EventSink)           │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ───────────────       │
//! │                                                            │
//! │  Registry:  example_block   motor_node ──▶ rad_per_s       │
//! │             (CanBlock)      (CanBlock)     (Block)         │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `xvcu-host [config.json] [ticks]`
//!
//! `config.json` overlays the example block's config and is persisted to
//! the simulated NVM before the blocks start.  A simulated motor node
//! answers for the first 40% of the run, then goes silent so the link
//! timeout can be observed.

#![deny(unused_must_use)]

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use log::{info, warn};

use xvcu_block::adapters::bus::LoopbackBus;
use xvcu_block::adapters::log_sink::LogEventSink;
use xvcu_block::adapters::nvm::MemoryNvm;
use xvcu_block::app::registry::Registry;
use xvcu_block::block::Block;
use xvcu_block::blocks::example::{ExampleBlock, ExampleConfig};
use xvcu_block::blocks::node_link::{MOTOR_STATUS, NodeLinkBlock};
use xvcu_block::blocks::scale::ScaleBlock;
use xvcu_block::can::{CanFrame, MAX_DLC};
use xvcu_block::config::{self, BlockConfig};
use xvcu_block::BlockInstance;

/// Host base rate.
const BASE_HZ: u32 = 100;

/// Base periods between simulated status frames.
const STATUS_PERIOD: u32 = 10;

const DEFAULT_TICKS: u32 = 500;

const RPM_TO_RAD_PER_S: f32 = core::f32::consts::PI / 30.0;

fn parse_args() -> Result<(Option<String>, u32)> {
    let mut config_path = None;
    let mut ticks = DEFAULT_TICKS;
    for arg in std::env::args().skip(1) {
        if let Ok(n) = arg.parse::<u32>() {
            ticks = n;
        } else if config_path.is_none() {
            config_path = Some(arg);
        } else {
            bail!("usage: xvcu-host [config.json] [ticks]");
        }
    }
    Ok((config_path, ticks))
}

fn load_example_config(path: &str, nvm: &mut MemoryNvm) -> Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let cfg: ExampleConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    cfg.validate().map_err(xvcu_block::Error::from)?;
    config::save_config(nvm, ExampleBlock::NAME, &cfg)?;
    info!("Config file {} stored for '{}'", path, ExampleBlock::NAME);
    Ok(())
}

/// MotorStatus frame as the simulated node would send it.
fn status_frame(rpm: f32, temp_c: f32) -> Option<CanFrame> {
    let mut payload = [0u8; MAX_DLC];
    MOTOR_STATUS.signal("motor_speed")?.encode(rpm, &mut payload);
    MOTOR_STATUS.signal("motor_temp")?.encode(temp_c, &mut payload);
    MOTOR_STATUS.signal("ready")?.encode_raw(1, &mut payload);
    MOTOR_STATUS.frame(&payload)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  xVCU host v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let (config_path, ticks) = parse_args()?;

    // ── 1. Simulated NVM, optionally seeded from a file ───────
    let mut nvm = MemoryNvm::new();
    if let Some(path) = config_path.as_deref() {
        load_example_config(path, &mut nvm)?;
    }

    // ── 2. Build instances ────────────────────────────────────
    let bus = LoopbackBus::new();

    let mut example = BlockInstance::new_can(ExampleBlock);
    example.init()?;
    if !example.load_config(&nvm)? {
        info!("'{}' running with init defaults", example.name());
    }

    let motor = BlockInstance::new_can(NodeLinkBlock)
        .named("motor_node")
        .with_bus(bus.clone());

    let mut scale = BlockInstance::new(ScaleBlock).named("rad_per_s");
    scale.init()?;
    scale.configure(|c| c.gain = RPM_TO_RAD_PER_S)?;

    // ── 3. Registry and links ─────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut registry = Registry::new(BASE_HZ);
    let ex = registry.add(example);
    let mn = registry.add(motor);
    let sc = registry.add(scale);
    registry.link(mn, "motor_speed", sc, "input")?;

    let ready = registry.init_all(&mut sink);
    if ready != registry.len() {
        bail!("{} of {} blocks failed to initialise", registry.len() - ready, registry.len());
    }

    // ── 4. Run ────────────────────────────────────────────────
    let silent_from = ticks * 2 / 5;
    let mut tx_counts: BTreeMap<u32, u32> = BTreeMap::new();
    for step in 0..ticks {
        if step < silent_from && step % STATUS_PERIOD == 0 {
            let rpm = 1500.0 + step as f32;
            match status_frame(rpm, 65.0) {
                Some(frame) => {
                    registry.dispatch_frame(&frame, &mut sink);
                }
                None => warn!("could not build status frame"),
            }
        }

        registry.step(&mut sink);

        for frame in bus.drain() {
            *tx_counts.entry(frame.raw_id()).or_default() += 1;
            registry.dispatch_frame(&frame, &mut sink);
        }
    }

    // ── 5. Report ─────────────────────────────────────────────
    info!("Ran {} base ticks at {} Hz", ticks, BASE_HZ);
    for (id, count) in &tx_counts {
        info!("TX  | 0x{:03X} x{}", id, count);
    }
    for handle in [ex, mn, sc] {
        let block = registry.block(handle);
        for field in block.output_fields() {
            if let Some(value) = block.output(field.name) {
                info!(
                    "OUT | {:<14} {:<16} = {} {}",
                    block.name(),
                    field.name,
                    value,
                    field.unit.unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
