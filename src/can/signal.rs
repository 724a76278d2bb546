//! DBC-style signal codec.
//!
//! A signal is a bit field inside a CAN payload with a linear conversion
//! to a physical value:
//!
//! ```text
//!   physical = raw * scale + offset
//! ```
//!
//! Bit numbering follows the DBC convention.  For Intel (little-endian)
//! signals `start_bit` is the least significant bit; for Motorola
//! (big-endian) signals it is the most significant bit, counted in the
//! "sawtooth" order where bit 7 is the MSB of byte 0.

use crate::block::fields::FieldType;
use crate::can::MAX_DLC;
use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Layout and scaling of one signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSpec {
    pub name: &'static str,
    pub start_bit: u8,
    /// Length in bits, 1 to 64.
    ///
    /// Raw values travel as `i64`: an unsigned 64-bit signal comes back
    /// from [`decode_raw`](Self::decode_raw) as its bit pattern, and
    /// encoding saturates it at `i64::MAX`.
    pub length: u8,
    pub byte_order: ByteOrder,
    pub signed: bool,
    pub scale: f32,
    pub offset: f32,
}

impl SignalSpec {
    /// Unsigned little-endian signal with unit scaling.
    pub const fn new(name: &'static str, start_bit: u8, length: u8) -> Self {
        Self {
            name,
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            signed: false,
            scale: 1.0,
            offset: 0.0,
        }
    }

    pub const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    pub const fn big_endian(mut self) -> Self {
        self.byte_order = ByteOrder::BigEndian;
        self
    }

    pub const fn scaled(mut self, scale: f32, offset: f32) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Field type used to store the decoded value.
    ///
    /// Scaled signals are floats; the rest get the smallest integer that
    /// holds the raw range, falling back to float beyond 32 bits.  An
    /// offset alone keeps the integer type.
    #[allow(clippy::float_cmp)]
    pub fn storage_type(&self) -> FieldType {
        if self.scale != 1.0 {
            return FieldType::F32;
        }
        match (self.signed, self.length) {
            (true, 0..=8) => FieldType::I8,
            (true, 9..=16) => FieldType::I16,
            (true, 17..=32) => FieldType::I32,
            (false, 0..=8) => FieldType::U8,
            (false, 9..=16) => FieldType::U16,
            (false, 17..=32) => FieldType::U32,
            _ => FieldType::F32,
        }
    }

    /// Shift of the signal's LSB inside the payload word, and the number of
    /// bytes the signal reaches into.
    fn placement(&self) -> Option<(u32, usize)> {
        let len = u32::from(self.length);
        if len == 0 || len > 64 {
            return None;
        }
        let start = u32::from(self.start_bit);
        match self.byte_order {
            ByteOrder::LittleEndian => {
                let end = start + len; // exclusive
                if end > 64 {
                    return None;
                }
                Some((start, end.div_ceil(8) as usize))
            }
            ByteOrder::BigEndian => {
                if start >= 64 {
                    return None;
                }
                // Position of the MSB counted from the MSB of a big-endian word.
                let msb = 8 * (start / 8) + (7 - start % 8);
                let lsb = msb + len - 1;
                if lsb > 63 {
                    return None;
                }
                Some((63 - lsb, (lsb / 8 + 1) as usize))
            }
        }
    }

    /// Number of payload bytes the signal occupies, counting from byte 0.
    pub fn bytes_needed(&self) -> Option<usize> {
        self.placement().map(|(_, bytes)| bytes)
    }

    fn mask(&self) -> u64 {
        if self.length >= 64 {
            u64::MAX
        } else {
            (1u64 << self.length) - 1
        }
    }

    fn word(&self, payload: &[u8]) -> u64 {
        let mut buf = [0u8; MAX_DLC];
        let n = payload.len().min(MAX_DLC);
        buf[..n].copy_from_slice(&payload[..n]);
        match self.byte_order {
            ByteOrder::LittleEndian => u64::from_le_bytes(buf),
            ByteOrder::BigEndian => u64::from_be_bytes(buf),
        }
    }

    /// Extract the raw value, sign-extended for signed signals.
    pub fn decode_raw(&self, payload: &[u8]) -> Result<i64, DecodeError> {
        let (shift, needed) = self
            .placement()
            .ok_or(DecodeError::BadLayout(self.name))?;
        if payload.len() < needed {
            return Err(DecodeError::ShortPayload {
                needed,
                got: payload.len(),
            });
        }
        let raw = (self.word(payload) >> shift) & self.mask();
        if self.signed && self.length < 64 {
            let sign = 1u64 << (self.length - 1);
            Ok(((raw ^ sign).wrapping_sub(sign)) as i64)
        } else {
            Ok(raw as i64)
        }
    }

    /// Physical value of the signal.
    pub fn decode(&self, payload: &[u8]) -> Result<f32, DecodeError> {
        let raw = self.decode_raw(payload)?;
        let raw = if self.signed { raw as f32 } else { raw as u64 as f32 };
        Ok(raw * self.scale + self.offset)
    }

    fn raw_bounds(&self) -> (i64, i64) {
        match (self.signed, self.length) {
            (_, 64) if self.signed => (i64::MIN, i64::MAX),
            (_, 64) => (0, i64::MAX),
            (true, n) => (-(1i64 << (n - 1)), (1i64 << (n - 1)) - 1),
            (false, n) => (0, (1i64 << n) - 1),
        }
    }

    /// Write the raw value into `payload`, saturating to the signal range.
    pub fn encode_raw(&self, raw: i64, payload: &mut [u8; MAX_DLC]) {
        let Some((shift, _)) = self.placement() else {
            return;
        };
        let (lo, hi) = self.raw_bounds();
        let bits = (raw.clamp(lo, hi) as u64) & self.mask();
        let field = self.mask() << shift;
        let mut word = self.word(&payload[..]);
        word = (word & !field) | (bits << shift);
        *payload = match self.byte_order {
            ByteOrder::LittleEndian => word.to_le_bytes(),
            ByteOrder::BigEndian => word.to_be_bytes(),
        };
    }

    /// Write the physical value into `payload`, rounding to the nearest raw
    /// step and saturating to the signal range.
    pub fn encode(&self, value: f32, payload: &mut [u8; MAX_DLC]) {
        #[allow(clippy::float_cmp)]
        let raw = if self.scale == 0.0 || !value.is_finite() {
            0
        } else {
            // `as` saturates on overflow.
            ((f64::from(value) - f64::from(self.offset)) / f64::from(self.scale)).round() as i64
        };
        self.encode_raw(raw, payload);
    }
}
