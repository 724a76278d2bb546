//! Integration tests for the registry: several blocks, links between them,
//! a shared loopback bus and a simulated remote node.

use xvcu_block::adapters::bus::LoopbackBus;
use xvcu_block::app::events::HostEvent;
use xvcu_block::app::instance::BlockInstance;
use xvcu_block::app::registry::{BlockHandle, Registry};
use xvcu_block::block::fields::FieldValue;
use xvcu_block::blocks::example::ExampleBlock;
use xvcu_block::blocks::node_link::{MOTOR_STATUS, NodeLinkBlock};
use xvcu_block::blocks::scale::ScaleBlock;
use xvcu_block::can::{CanFrame, MAX_DLC};

use crate::mock_bus::EventLog;

const BASE_HZ: u32 = 100;

fn status(rpm: f32) -> CanFrame {
    let mut payload = [0u8; MAX_DLC];
    MOTOR_STATUS
        .signal("motor_speed")
        .unwrap()
        .encode(rpm, &mut payload);
    MOTOR_STATUS.frame(&payload).unwrap()
}

struct Rig {
    reg: Registry,
    bus: LoopbackBus,
    log: EventLog,
    motor: BlockHandle,
    scale: BlockHandle,
}

fn rig(motor_rate: u8) -> Rig {
    let bus = LoopbackBus::new();
    let mut log = EventLog::new();
    let mut reg = Registry::new(BASE_HZ);

    let mut motor = BlockInstance::new_can(NodeLinkBlock).with_bus(bus.clone());
    motor.init().unwrap();
    motor.configure(|c| c.ticks_per_s = motor_rate).unwrap();

    let mut scale = BlockInstance::new(ScaleBlock);
    scale.init().unwrap();
    scale.configure(|c| c.gain = 2.0).unwrap();

    let motor = reg.add(motor);
    let scale = reg.add(scale);
    reg.link(motor, "motor_speed", scale, "input").unwrap();
    assert_eq!(reg.init_all(&mut log), 2);

    Rig {
        reg,
        bus,
        log,
        motor,
        scale,
    }
}

#[test]
fn received_speed_flows_through_link() {
    let mut r = rig(100);
    assert_eq!(r.reg.dispatch_frame(&status(750.0), &mut r.log), 1);
    r.reg.step(&mut r.log);
    assert_eq!(
        r.reg.output(r.motor, "motor_speed"),
        Some(FieldValue::F32(750.0))
    );
    assert_eq!(r.reg.output(r.scale, "value"), Some(FieldValue::F32(1500.0)));
}

#[test]
fn block_rate_divides_base_rate() {
    // 10 ticks/s on a 100 Hz base: one transmit every 10 base periods.
    let mut r = rig(10);
    for _ in 0..100 {
        r.reg.step(&mut r.log);
    }
    assert_eq!(r.bus.drain().len(), 10);
}

#[test]
fn looped_back_tx_is_unclaimed() {
    let mut r = rig(100);
    r.reg.step(&mut r.log);
    let sent = r.bus.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(r.reg.dispatch_frame(&sent[0], &mut r.log), 0);
    assert_eq!(
        r.log.count(|e| matches!(e, HostEvent::FrameUnclaimed { id: 0x201 })),
        1
    );
}

#[test]
fn silence_raises_timeout_and_zeroes_command() {
    let mut r = rig(100);
    r.reg.dispatch_frame(&status(100.0), &mut r.log);
    for _ in 0..=200 {
        r.reg.step(&mut r.log);
    }
    assert_eq!(r.reg.output(r.motor, "timeout"), Some(FieldValue::Bool(true)));

    r.bus.drain();
    r.reg.set_input(r.motor, "torque_request", FieldValue::F32(5.0)).unwrap();
    r.reg.set_input(r.motor, "enable", FieldValue::Bool(true)).unwrap();
    r.reg.step(&mut r.log);
    r.reg.step(&mut r.log);
    let cmd: Vec<_> = r
        .bus
        .drain()
        .into_iter()
        .filter(|f| f.raw_id() == 0x201)
        .collect();
    assert_eq!(cmd.len(), 1);
    assert_eq!(cmd[0].data(), &[0, 0, 0]);

    // The node comes back.
    r.reg.dispatch_frame(&status(100.0), &mut r.log);
    r.reg.step(&mut r.log);
    assert_eq!(r.reg.output(r.motor, "timeout"), Some(FieldValue::Bool(false)));
}

#[test]
fn truncated_status_is_reported_not_applied() {
    let mut r = rig(100);
    let short = CanFrame::new(MOTOR_STATUS.id, &[1, 2]).unwrap();
    assert_eq!(r.reg.dispatch_frame(&short, &mut r.log), 0);
    assert_eq!(
        r.log.count(|e| matches!(e, HostEvent::FrameRejected { block: "node_link", .. })),
        1
    );
    assert_eq!(r.reg.output(r.motor, "rx_count"), Some(FieldValue::U16(0)));
}

#[test]
fn every_accepting_block_sees_the_frame() {
    let mut log = EventLog::new();
    let mut reg = Registry::new(BASE_HZ);
    let ex = reg.add(BlockInstance::new_can(ExampleBlock));
    let nl = reg.add(BlockInstance::new_can(NodeLinkBlock));
    reg.add(BlockInstance::new(ScaleBlock));
    reg.init_all(&mut log);

    // ExampleBlock takes everything; NodeLinkBlock only its status id.
    let frame = status(10.0);
    assert_eq!(reg.dispatch_frame(&frame, &mut log), 2);
    assert_eq!(
        reg.output(ex, "outputs_uint8"),
        Some(FieldValue::U8(frame.data()[0]))
    );
    assert_eq!(reg.output(nl, "rx_count"), Some(FieldValue::U16(1)));
}
