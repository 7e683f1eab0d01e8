//! Busy-wait delays on the 8254 PIT.
//!
//! Channel 0 runs as a free-running rate generator reloading at 0xFFFF.
//! Delays poll the down-counter and add up the ticks that pass between
//! reads, so a wrap-around never ends a wait early.

use crate::constants::{
    ports::{PIT_CHANNEL0, PIT_COMMAND},
    timer::{PIT_LATCH, PIT_RATE_GENERATOR, PIT_RELOAD, PIT_TICKS_PER_MS},
};
use x86::io::{inb, outb};

/// PIT ticks for `us` microseconds, never less than one.
pub fn us_to_ticks(us: u32) -> u32 {
    let ticks = u64::from(us) * u64::from(PIT_TICKS_PER_MS) / 1000;
    u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
}

pub fn ms_to_ticks(ms: u32) -> u32 {
    ms.saturating_mul(PIT_TICKS_PER_MS)
}

/// A 16-bit counter that counts down at the PIT input frequency.
pub trait TickCounter {
    fn read_counter(&mut self) -> u16;

    /// Spins until at least `ticks` ticks have elapsed.
    fn delay_ticks(&mut self, ticks: u32) {
        let mut last = self.read_counter();
        let mut elapsed: u32 = 0;

        while elapsed < ticks {
            core::hint::spin_loop();
            let now = self.read_counter();
            // Down-counter: ticks passed since the last read, modulo a reload.
            elapsed = elapsed.saturating_add(u32::from(last.wrapping_sub(now)));
            last = now;
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ticks(us_to_ticks(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks(ms_to_ticks(ms));
    }
}

/// Programmable interval timer, channel 0.
#[derive(Debug, Default)]
pub struct Pit {
    initialized: bool,
}

impl Pit {
    pub const fn new() -> Self {
        Pit { initialized: false }
    }

    /// Programs channel 0 as a rate generator. Calling it again does nothing.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        let [low, high] = PIT_RELOAD.to_le_bytes();
        // SAFETY: ports 0x40/0x43 belong to the PIT on every PC.
        unsafe {
            outb(PIT_COMMAND, PIT_RATE_GENERATOR);
            outb(PIT_CHANNEL0, low);
            outb(PIT_CHANNEL0, high);
        }
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl TickCounter for Pit {
    fn read_counter(&mut self) -> u16 {
        self.init();
        // SAFETY: latching then reading two bytes is the documented sequence.
        unsafe {
            outb(PIT_COMMAND, PIT_LATCH);
            let low = inb(PIT_CHANNEL0);
            let high = inb(PIT_CHANNEL0);
            u16::from_le_bytes([low, high])
        }
    }
}
