//! Classic CAN frames.
//!
//! Identifiers use the `embedded-can` types so blocks interoperate with any
//! HAL driver that speaks them.  A frame carries 0 to 8 data bytes; remote
//! frames carry a DLC but no data.

pub mod message;
pub mod signal;

use embedded_can::{ExtendedId, Id, StandardId};

/// Maximum payload of a classic CAN frame.
pub const MAX_DLC: usize = 8;

/// Raw numeric value of an identifier (11 or 29 significant bits).
pub fn raw_id(id: Id) -> u32 {
    match id {
        Id::Standard(s) => u32::from(s.as_raw()),
        Id::Extended(e) => e.as_raw(),
    }
}

/// Build an identifier from its raw value.  Returns `None` if `raw` does
/// not fit in 11 bits (standard) or 29 bits (extended).
pub fn id_from_raw(raw: u32, extended: bool) -> Option<Id> {
    if extended {
        ExtendedId::new(raw).map(Id::Extended)
    } else {
        u16::try_from(raw)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
    }
}

/// A classic CAN 2.0 frame with inline storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: Id,
    remote: bool,
    dlc: u8,
    data: [u8; MAX_DLC],
}

impl CanFrame {
    /// Data frame.  `None` if `data` is longer than 8 bytes.
    pub fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_DLC {
            return None;
        }
        let mut buf = [0u8; MAX_DLC];
        buf[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            remote: false,
            dlc: data.len() as u8,
            data: buf,
        })
    }

    /// Remote frame requesting `dlc` bytes.
    pub fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_DLC {
            return None;
        }
        Some(Self {
            id: id.into(),
            remote: true,
            dlc: dlc as u8,
            data: [0; MAX_DLC],
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn raw_id(&self) -> u32 {
        raw_id(self.id)
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    pub fn is_remote_frame(&self) -> bool {
        self.remote
    }

    pub fn dlc(&self) -> usize {
        self.dlc as usize
    }

    /// Payload bytes (empty for remote frames).
    pub fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.dlc as usize]
        }
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        CanFrame::new(id, data)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        CanFrame::new_remote(id, dlc)
    }

    fn is_extended(&self) -> bool {
        CanFrame::is_extended(self)
    }

    fn is_remote_frame(&self) -> bool {
        CanFrame::is_remote_frame(self)
    }

    fn id(&self) -> Id {
        CanFrame::id(self)
    }

    fn dlc(&self) -> usize {
        CanFrame::dlc(self)
    }

    fn data(&self) -> &[u8] {
        CanFrame::data(self)
    }
}
