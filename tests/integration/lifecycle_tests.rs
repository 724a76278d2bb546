//! Integration tests for a single block instance: init → configure →
//! tick / parse_frame, with NVM-backed config and an injected bus.

use embedded_can::{Id, StandardId};

use xvcu_block::adapters::nvm::MemoryNvm;
use xvcu_block::app::instance::{BlockInstance, Phase};
use xvcu_block::app::ports::StoragePort;
use xvcu_block::block::fields::FieldValue;
use xvcu_block::blocks::example::ExampleBlock;
use xvcu_block::blocks::node_link::{MOTOR_STATUS, NodeLinkBlock};
use xvcu_block::blocks::scale::ScaleBlock;
use xvcu_block::config::{CONFIG_NAMESPACE, DEFAULT_TICKS_PER_S};
use xvcu_block::error::{BusError, ConfigError, Error, LifecycleError};

use crate::mock_bus::{BrokenNvm, MockBus};

// ── Reference block, end to end ───────────────────────────────

#[test]
fn example_block_end_to_end() {
    let mut inst = BlockInstance::new_can(ExampleBlock);
    inst.init().unwrap();
    assert_eq!(inst.config().config_uint8, 1);

    inst.configure(|c| {
        c.config_bool = true;
        c.config_uint16 = 42;
    })
    .unwrap();
    inst.tick().unwrap();
    assert!(inst.outputs().outputs_bool);
    assert_eq!(inst.outputs().outputs_uint16, 42);

    inst.parse_frame(Id::Standard(StandardId::ZERO), &[7, 0, 0, 0, 0, 0, 0, 0])
        .unwrap();
    assert_eq!(inst.outputs().outputs_uint8, 7);
}

#[test]
fn rejected_frames_leave_config_editable() {
    let mut inst = BlockInstance::new_can(ExampleBlock);
    inst.init().unwrap();
    assert!(inst.parse_frame(Id::Standard(StandardId::ZERO), &[0; 9]).is_err());
    assert!(inst.parse_frame(Id::Standard(StandardId::ZERO), &[]).is_err());
    assert_eq!(inst.phase(), Phase::Ready);
    inst.set_config_field("config_uint8", FieldValue::U8(5)).unwrap();
    assert_eq!(inst.config().config_uint8, 5);
}

#[test]
fn config_is_frozen_once_running() {
    let mut inst = BlockInstance::new_can(ExampleBlock);
    inst.init().unwrap();
    inst.parse_frame(Id::Standard(StandardId::ZERO), &[1]).unwrap();
    assert_eq!(inst.phase(), Phase::Running);
    assert_eq!(
        inst.set_config_field("config_uint8", FieldValue::U8(5)),
        Err(LifecycleError::ConfigFrozen.into())
    );
    assert_eq!(
        inst.load_config(&MemoryNvm::new()),
        Err(LifecycleError::ConfigFrozen.into())
    );
}

#[test]
fn host_writes_inputs_by_name() {
    let mut inst = BlockInstance::new(ScaleBlock);
    inst.init().unwrap();
    inst.set_input("input", FieldValue::F32(4.0)).unwrap();
    inst.tick().unwrap();
    assert_eq!(inst.output("value"), Some(FieldValue::F32(4.0)));
    assert!(inst.set_input("value", FieldValue::F32(1.0)).is_err());
}

// ── Config persistence ────────────────────────────────────────

#[test]
fn config_survives_a_reboot() {
    let mut nvm = MemoryNvm::new();

    let mut first = BlockInstance::new_can(ExampleBlock);
    first.init().unwrap();
    first
        .configure(|c| {
            c.config_int16 = -1234;
            c.config_float = 2.5;
            c.ticks_per_s = 20;
        })
        .unwrap();
    first.save_config(&mut nvm).unwrap();
    assert!(nvm.exists(CONFIG_NAMESPACE, "example_block"));

    // Next boot: init sets defaults, NVM overlays them.
    let mut second = BlockInstance::new_can(ExampleBlock);
    second.init().unwrap();
    assert_eq!(second.config().ticks_per_s, DEFAULT_TICKS_PER_S);
    assert!(second.load_config(&nvm).unwrap());
    assert_eq!(second.config().config_int16, -1234);
    assert_eq!(second.config().ticks_per_s, 20);

    second.tick().unwrap();
    assert_eq!(second.outputs().outputs_float, 2.5);
}

#[test]
fn instance_name_is_the_storage_key() {
    let mut nvm = MemoryNvm::new();
    let mut a = BlockInstance::new(ScaleBlock).named("front_axle");
    a.init().unwrap();
    a.configure(|c| c.gain = 3.0).unwrap();
    a.save_config(&mut nvm).unwrap();

    let mut b = BlockInstance::new(ScaleBlock).named("rear_axle");
    b.init().unwrap();
    assert!(!b.load_config(&nvm).unwrap());
    assert_eq!(b.config().gain, 1.0);
}

#[test]
fn storage_failure_is_reported() {
    let mut inst = BlockInstance::new(ScaleBlock);
    inst.init().unwrap();
    assert!(matches!(inst.load_config(&BrokenNvm), Err(Error::Storage(_))));
    assert!(matches!(
        inst.save_config(&mut BrokenNvm),
        Err(Error::Storage(_))
    ));
    // Still usable with its init defaults.
    inst.tick().unwrap();
}

#[test]
fn invalid_stored_config_is_rejected() {
    let mut nvm = MemoryNvm::new();
    nvm.write(CONFIG_NAMESPACE, "scale", &[0xFF, 0xFF]).unwrap();
    let mut inst = BlockInstance::new(ScaleBlock);
    inst.init().unwrap();
    assert_eq!(
        inst.load_config(&nvm),
        Err(Error::Config(ConfigError::Corrupted))
    );
    assert_eq!(inst.config().gain, 1.0);
}

// ── Injected send capability ──────────────────────────────────

#[test]
fn node_link_transmits_through_injected_bus() {
    let bus = MockBus::new();
    let mut inst = BlockInstance::new_can(NodeLinkBlock).with_bus(bus.clone());
    inst.init().unwrap();
    inst.inputs_mut().torque_request = 1.0;
    for _ in 0..6 {
        inst.tick().unwrap();
    }
    assert_eq!(bus.ids(), [0x201, 0x202, 0x201, 0x202, 0x201, 0x202]);
    assert_eq!(bus.sent()[0].data(), &[10, 0, 0]);
}

#[test]
fn bus_errors_do_not_stop_the_tick() {
    let mut inst =
        BlockInstance::new_can(NodeLinkBlock).with_bus(MockBus::failing(BusError::TxFull));
    inst.init().unwrap();
    for _ in 0..4 {
        inst.tick().unwrap();
    }
    assert_eq!(inst.ticks(), 4);
}

#[test]
fn node_link_only_takes_its_status_frame() {
    let mut inst = BlockInstance::new_can(NodeLinkBlock);
    inst.init().unwrap();
    assert!(inst.accepts(MOTOR_STATUS.id));
    assert!(!inst.accepts(Id::Standard(StandardId::new(0x102).unwrap())));
    assert_eq!(inst.route_frame(MOTOR_STATUS.id, &[0; 5]), Ok(true));
    assert_eq!(inst.outputs().rx_count, 1);
}
