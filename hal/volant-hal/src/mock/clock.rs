//! Mock time base

use std::cell::Cell;
use std::rc::Rc;

use crate::clock::{Clock, SystemControl};

/// Simulated clock
///
/// Time only moves when the test advances it or code under test calls
/// [`Clock::delay_ms`].
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now_us: Rc<Cell<u64>>,
}

impl MockClock {
    /// Create a clock at t = 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time by `us` microseconds
    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }

    /// Advance time by `ms` milliseconds
    pub fn advance_ms(&self, ms: u32) {
        self.advance_us(u64::from(ms) * 1000);
    }

    /// Jump to an absolute time
    pub fn set_micros(&self, us: u64) {
        self.now_us.set(us);
    }
}

impl Clock for MockClock {
    fn millis(&self) -> u32 {
        // Truncation reproduces the 32-bit millisecond counter wrap
        (self.now_us.get() / 1000) as u32
    }

    fn micros(&self) -> u64 {
        self.now_us.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(ms);
    }
}

/// Simulated system controller
///
/// `reset` panics, so tests can observe it with `#[should_panic]`.
#[derive(Debug, Clone, Default)]
pub struct MockSystem {
    init_calls: Rc<Cell<u32>>,
}

impl MockSystem {
    /// Create a fresh controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `init` ran
    pub fn init_calls(&self) -> u32 {
        self.init_calls.get()
    }
}

impl SystemControl for MockSystem {
    fn init(&mut self) {
        self.init_calls.set(self.init_calls.get() + 1);
    }

    fn reset(&mut self, bootloader: bool) -> ! {
        panic!("system reset (bootloader: {bootloader})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_advances_shared_time() {
        let clock = MockClock::new();
        let mut handle = clock.clone();

        handle.delay_ms(5);
        assert_eq!(clock.millis(), 5);
        assert_eq!(clock.micros(), 5_000);
    }

    #[test]
    fn test_millis_wraps_at_32_bits() {
        let clock = MockClock::new();
        clock.set_micros((u64::from(u32::MAX) + 1) * 1000 + 7_000);
        assert_eq!(clock.millis(), 7);
    }
}
