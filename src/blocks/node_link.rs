//! Bus bridge to a remote motor node.
//!
//! Shaped like a block generated from a DBC file:
//!
//! ```text
//!   0x101 MotorStatus  ──parse_frame──▶ outputs (speed, temp, fault, ready)
//!   inputs (torque, enable) ──tick──▶ 0x201 MotorCommand ┐ round-robin,
//!   alive counter            ──tick──▶ 0x202 Heartbeat    ┘ one per tick
//! ```
//!
//! If no status frame arrives for two seconds `timeout` is raised and the
//! command goes out with every signal zeroed until the node is heard again.

use embedded_can::{Id, StandardId};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::block::{Block, CanBlock, FrameContext, InitContext, TickContext};
use crate::block_record;
use crate::can::MAX_DLC;
use crate::can::message::MessageSpec;
use crate::can::signal::SignalSpec;
use crate::config::{BlockConfig, DEFAULT_TICKS_PER_S, validate_tick_rate};
use crate::error::{BusError, ConfigError, DecodeError, Result};
use crate::schedule::{RoundRobin, RxWatchdog};

const fn std_id(raw: u16) -> Id {
    match StandardId::new(raw) {
        Some(id) => Id::Standard(id),
        None => panic!("standard identifier out of range"),
    }
}

// ── Message database ──────────────────────────────────────────

const MOTOR_SPEED: SignalSpec = SignalSpec::new("motor_speed", 0, 16)
    .signed()
    .scaled(0.5, 0.0);
const MOTOR_TEMP: SignalSpec = SignalSpec::new("motor_temp", 16, 8).scaled(1.0, -40.0);
const FAULT_CODE: SignalSpec = SignalSpec::new("fault_code", 24, 8);
const READY: SignalSpec = SignalSpec::new("ready", 32, 1);

pub const MOTOR_STATUS: MessageSpec = MessageSpec {
    name: "MotorStatus",
    id: std_id(0x101),
    length: 5,
    signals: &[MOTOR_SPEED, MOTOR_TEMP, FAULT_CODE, READY],
};

const TORQUE_REQUEST: SignalSpec = SignalSpec::new("torque_request", 0, 16)
    .signed()
    .scaled(0.1, 0.0);
const ENABLE: SignalSpec = SignalSpec::new("enable", 16, 1);

pub const MOTOR_COMMAND: MessageSpec = MessageSpec {
    name: "MotorCommand",
    id: std_id(0x201),
    length: 3,
    signals: &[TORQUE_REQUEST, ENABLE],
};

const ALIVE_COUNTER: SignalSpec = SignalSpec::new("alive_counter", 0, 8);

pub const HEARTBEAT: MessageSpec = MessageSpec {
    name: "Heartbeat",
    id: std_id(0x202),
    length: 1,
    signals: &[ALIVE_COUNTER],
};

/// Messages this block transmits, in round-robin order.
pub const TX_MESSAGES: [MessageSpec; 2] = [MOTOR_COMMAND, HEARTBEAT];

// ── Records ───────────────────────────────────────────────────

block_record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct NodeLinkInputs {
        pub torque_request: f32 ("Nm"),
        pub enable: bool,
    }
}

block_record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct NodeLinkOutputs {
        pub motor_speed: f32 ("RPM"),
        pub motor_temp: f32 ("degC"),
        pub fault_code: u8,
        pub ready: bool,
        pub timeout: bool ("", "No MotorStatus for two seconds"),
        pub rx_count: u16,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeLinkInternal {
    pub tx_slot: RoundRobin,
    pub watchdog: RxWatchdog,
    pub alive: u8,
    pub tx_errors: u16,
}

block_record! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct NodeLinkConfig {
        pub ticks_per_s: u8 ("Hz"),
        pub tx_enabled: bool ("", "Transmit command and heartbeat"),
    }
}

impl BlockConfig for NodeLinkConfig {
    fn ticks_per_s(&self) -> u8 {
        self.ticks_per_s
    }

    fn validate(&self) -> core::result::Result<(), ConfigError> {
        validate_tick_rate(self.ticks_per_s)?;
        MOTOR_STATUS.validate()?;
        TX_MESSAGES.iter().try_for_each(MessageSpec::validate)
    }
}

// ── Block ─────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct NodeLinkBlock;

impl NodeLinkBlock {
    fn command_payload(inputs: &NodeLinkInputs, zeroed: bool) -> [u8; MAX_DLC] {
        let mut buf = [0u8; MAX_DLC];
        if !zeroed {
            TORQUE_REQUEST.encode(inputs.torque_request, &mut buf);
            ENABLE.encode_raw(i64::from(inputs.enable), &mut buf);
        }
        buf
    }

    fn heartbeat_payload(alive: u8) -> [u8; MAX_DLC] {
        let mut buf = [0u8; MAX_DLC];
        ALIVE_COUNTER.encode_raw(i64::from(alive), &mut buf);
        buf
    }
}

impl Block for NodeLinkBlock {
    const NAME: &'static str = "node_link";

    type Inputs = NodeLinkInputs;
    type Outputs = NodeLinkOutputs;
    type Internal = NodeLinkInternal;
    type Config = NodeLinkConfig;

    fn init(&self, ctx: InitContext<'_, Self>) -> Result<()> {
        ctx.config.ticks_per_s = DEFAULT_TICKS_PER_S;
        ctx.config.tx_enabled = true;
        *ctx.internal = NodeLinkInternal::default();
        Ok(())
    }

    fn tick(&self, mut ctx: TickContext<'_, Self>) {
        let internal = &mut *ctx.internal;
        let timed_out = internal.watchdog.timed_out(ctx.config.ticks_per_s);
        ctx.outputs.timeout = timed_out;

        if ctx.config.tx_enabled && ctx.bus.is_attached() {
            if let Some(slot) = internal.tx_slot.slot(TX_MESSAGES.len()) {
                let msg = &TX_MESSAGES[slot];
                let payload = if msg.id == MOTOR_COMMAND.id {
                    Self::command_payload(ctx.inputs, timed_out)
                } else {
                    internal.alive = internal.alive.wrapping_add(1);
                    Self::heartbeat_payload(internal.alive)
                };
                let sent = match msg.frame(&payload) {
                    Some(frame) => ctx.bus.send(&frame),
                    None => Err(BusError::InvalidFrame),
                };
                if let Err(e) = sent {
                    internal.tx_errors = internal.tx_errors.saturating_add(1);
                    debug!("{}: {} not sent: {}", Self::NAME, msg.name, e);
                }
            }
        }

        internal.watchdog.advance();
        internal.tx_slot.advance();
    }
}

impl CanBlock for NodeLinkBlock {
    fn accepts(&self, id: Id) -> bool {
        MOTOR_STATUS.matches(id)
    }

    fn parse_frame(
        &self,
        id: Id,
        payload: &[u8],
        ctx: FrameContext<'_, Self>,
    ) -> core::result::Result<(), DecodeError> {
        MOTOR_STATUS.check(id, payload)?;

        let out = ctx.outputs;
        out.motor_speed = MOTOR_SPEED.decode(payload)?;
        out.motor_temp = MOTOR_TEMP.decode(payload)?;
        out.fault_code = FAULT_CODE.decode_raw(payload)? as u8;
        out.ready = READY.decode_raw(payload)? != 0;
        out.rx_count = out.rx_count.wrapping_add(1);

        ctx.internal.watchdog.feed();
        Ok(())
    }
}
