//! Tick-counting helpers shared by blocks and the host.
//!
//! ```text
//!   host base tick ──▶ RateDivider ──▶ block.tick()
//!                                         │
//!                         ┌───────────────┴────────────────┐
//!                         ▼                                ▼
//!                    RoundRobin                       RxWatchdog
//!               (which TX message now)          (ticks since last RX)
//! ```
//!
//! Everything here counts ticks, never wall-clock time, so behaviour is
//! identical on target and in host tests.

use log::debug;

// ═══════════════════════════════════════════════════════════════
//  Round-robin transmit slot
// ═══════════════════════════════════════════════════════════════

/// Spreads `n` periodic transmit messages over consecutive ticks so each
/// tick sends at most one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundRobin {
    counter: u16,
}

impl RoundRobin {
    /// Index of the message due this tick, or `None` if there are none.
    pub fn slot(&self, n: usize) -> Option<usize> {
        if n == 0 {
            None
        } else {
            Some(usize::from(self.counter) % n)
        }
    }

    /// Advance to the next tick.
    pub fn advance(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }
}

// ═══════════════════════════════════════════════════════════════
//  Receive watchdog
// ═══════════════════════════════════════════════════════════════

/// The counter stops here so it never wraps back into "fresh".
pub const RX_WATCHDOG_CEILING: u16 = 0xFFF0;

/// Seconds of silence before the link is considered lost.
pub const RX_TIMEOUT_SECS: u16 = 2;

/// Counts ticks since the last accepted frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxWatchdog {
    ticks_since_rx: u16,
}

impl RxWatchdog {
    /// Note a received frame.
    pub fn feed(&mut self) {
        self.ticks_since_rx = 0;
    }

    /// Count one tick, saturating at [`RX_WATCHDOG_CEILING`].
    pub fn advance(&mut self) {
        if self.ticks_since_rx < RX_WATCHDOG_CEILING {
            self.ticks_since_rx += 1;
        }
    }

    /// True once two seconds worth of ticks have passed without a frame.
    pub fn timed_out(&self, ticks_per_s: u8) -> bool {
        self.ticks_since_rx >= u16::from(ticks_per_s) * RX_TIMEOUT_SECS
    }

    pub fn ticks_since_rx(&self) -> u16 {
        self.ticks_since_rx
    }
}

// ═══════════════════════════════════════════════════════════════
//  Rate divider
// ═══════════════════════════════════════════════════════════════

/// Converts a block's own tick rate into a divider of the host base rate.
///
/// The host steps at `base_hz`; a block configured for `ticks_per_s` runs
/// every `base_hz / ticks_per_s` steps (at least every step).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDivider {
    divider: u32,
    elapsed: u32,
}

impl RateDivider {
    pub fn new(base_hz: u32, ticks_per_s: u8) -> Self {
        let rate = u32::from(ticks_per_s.max(1));
        let divider = (base_hz / rate).max(1);
        if base_hz % rate != 0 {
            debug!(
                "RateDivider: {} Hz does not divide {} Hz base, running at {} Hz",
                rate,
                base_hz,
                base_hz / divider
            );
        }
        Self {
            divider,
            // Due on the very first step.
            elapsed: divider - 1,
        }
    }

    /// Count one base step.  Returns `true` when the block is due.
    pub fn step(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed >= self.divider {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }

    pub fn divider(&self) -> u32 {
        self.divider
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
