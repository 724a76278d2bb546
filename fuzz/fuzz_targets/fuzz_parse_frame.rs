//! Fuzz target: frame delivery through a block instance
//!
//! Feeds arbitrary identifiers and payloads (including over-long and empty
//! ones) to the reference and node-link blocks and asserts they never
//! panic and that a rejected frame leaves outputs untouched.
//!
//! cargo fuzz run fuzz_parse_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use xvcu_block::BlockInstance;
use xvcu_block::blocks::example::ExampleBlock;
use xvcu_block::blocks::node_link::NodeLinkBlock;
use xvcu_block::can::id_from_raw;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    let raw = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let extended = data[4] & 1 == 1;
    let Some(id) = id_from_raw(raw & 0x1FFF_FFFF, extended).or_else(|| id_from_raw(raw & 0x7FF, false))
    else {
        return;
    };
    let payload = &data[5..];

    let mut example = BlockInstance::new_can(ExampleBlock);
    if example.init().is_ok() {
        let before = *example.outputs();
        match example.parse_frame(id, payload) {
            Ok(()) => assert_eq!(example.outputs().outputs_uint8, payload[0]),
            Err(_) => assert_eq!(*example.outputs(), before),
        }
        let _ = example.tick();
    }

    let mut node = BlockInstance::new_can(NodeLinkBlock);
    if node.init().is_ok() {
        let before = *node.outputs();
        if node.parse_frame(id, payload).is_err() {
            assert_eq!(node.outputs().rx_count, before.rx_count);
        }
        let _ = node.tick();
    }
});
