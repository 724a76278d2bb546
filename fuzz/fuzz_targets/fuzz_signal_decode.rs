//! Fuzz target: `SignalSpec::decode_raw` / `encode_raw`
//!
//! Builds a signal layout from the first bytes (any start bit, length and
//! byte order, legal or not) and decodes the rest as a payload.  Decoding
//! must never panic, and re-encoding a decoded value must be stable.
//!
//! cargo fuzz run fuzz_signal_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use xvcu_block::can::MAX_DLC;
use xvcu_block::can::signal::SignalSpec;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let mut sig = SignalSpec::new("fuzz", data[0], data[1]);
    if data[2] & 1 == 1 {
        sig = sig.big_endian();
    }
    if data[2] & 2 == 2 {
        sig = sig.signed();
    }
    let payload = &data[3..];
    // An unsigned 64-bit raw value does not fit the i64 encode path.
    if sig.length == 64 && !sig.signed {
        let _ = sig.decode_raw(payload);
        return;
    }

    let Ok(raw) = sig.decode_raw(payload) else {
        return;
    };
    let _ = sig.decode(payload);

    let mut buf = [0u8; MAX_DLC];
    let n = payload.len().min(MAX_DLC);
    buf[..n].copy_from_slice(&payload[..n]);
    let before = buf;
    sig.encode_raw(raw, &mut buf);
    assert_eq!(buf, before, "re-encoding a decoded value changed the payload");
});
