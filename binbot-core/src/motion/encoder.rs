//! Encoder edge accounting
//!
//! One instance per wheel. The rising-edge capture ISR calls `capture`
//! with the timestamp and the quadrature direction bit; the control loop
//! reads the accumulated position and inter-edge delta from task context.
//! Fields are plain scalars: the ISR writes, the task reads, and a read
//! may observe a slightly stale value but never a torn one.

/// Per-wheel tick accumulator
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickCapture {
    ticks: i32,
    last_edge_us: u32,
    last_delta_us: u32,
}

impl TickCapture {
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            last_edge_us: 0,
            last_delta_us: 0,
        }
    }

    /// Record one rising edge (ISR context)
    ///
    /// The quadrature B-channel level at the edge selects the direction:
    /// `forward` increments the tick count, otherwise it decrements.
    pub fn capture(&mut self, now_us: u32, forward: bool) {
        self.last_delta_us = now_us.wrapping_sub(self.last_edge_us);
        self.last_edge_us = now_us;
        if forward {
            self.ticks = self.ticks.wrapping_add(1);
        } else {
            self.ticks = self.ticks.wrapping_sub(1);
        }
    }

    /// Signed cumulative tick position
    pub fn position(&self) -> i32 {
        self.ticks
    }

    /// Microseconds between the two most recent edges
    pub fn last_delta_us(&self) -> u32 {
        self.last_delta_us
    }

    /// Zero the position at the start of a commanded move
    pub fn reset(&mut self) {
        self.ticks = 0;
    }
}
