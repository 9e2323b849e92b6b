//! Blocking delay on top of the board clock

use embedded_hal::delay::DelayNs;
use volant_hal::Clock;

/// [`DelayNs`] provider backed by [`Clock::delay_ms`]
///
/// Resolution is one millisecond; shorter requests round up. Only used for
/// probe handshakes, where overshooting is harmless.
pub struct ClockDelay<'a, C> {
    clock: &'a mut C,
}

impl<'a, C: Clock> ClockDelay<'a, C> {
    /// Borrow `clock` for the duration of a bring-up sequence
    pub fn new(clock: &'a mut C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> DelayNs for ClockDelay<'_, C> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.delay_ms(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.delay_ms(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volant_hal::mock::MockClock;

    #[test]
    fn test_rounds_up_to_whole_milliseconds() {
        let clock = MockClock::new();
        let mut handle = clock.clone();
        let mut delay = ClockDelay::new(&mut handle);

        delay.delay_us(1);
        assert_eq!(clock.millis(), 1);
        delay.delay_ms(10);
        assert_eq!(clock.millis(), 11);
    }
}
