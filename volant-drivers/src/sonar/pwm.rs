//! PWM-output sonar (MaxBotix LV/HRLV family) on a timer capture channel

use embedded_hal::delay::DelayNs;
use volant_core::{SensorDevice, Stamped};
use volant_hal::PulseCapture;

/// Echo pulse length per metre of range (58 µs per cm)
const US_PER_METRE: f32 = 5800.0;

/// Without a new echo for this long the sonar is considered gone
const STALE_US: u64 = 100_000;

/// PWM sonar driver; readings are range in metres
pub struct PwmSonar<'a, C> {
    capture: &'a C,
    last_seen_at: Option<u64>,
    now_us: u64,
}

impl<'a, C: PulseCapture> PwmSonar<'a, C> {
    pub fn new(capture: &'a C) -> Self {
        Self {
            capture,
            last_seen_at: None,
            now_us: 0,
        }
    }
}

impl<C: PulseCapture> SensorDevice for PwmSonar<'_, C> {
    type Reading = f32;

    fn name(&self) -> &'static str {
        "pwm-sonar"
    }

    fn probe(&mut self, _delay: &mut impl DelayNs) -> bool {
        self.last_seen_at = None;
        match self.capture.last_pulse() {
            Some((_, at)) => {
                self.now_us = at;
                true
            }
            None => false,
        }
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        // The capture runs on its own; a kick only advances the clock used
        // for staleness.
        self.now_us = self.now_us.max(now_us);
        true
    }

    fn try_consume(&mut self) -> Option<Stamped<f32>> {
        let (width_us, at) = self.capture.last_pulse()?;
        if self.last_seen_at == Some(at) {
            return None;
        }
        self.last_seen_at = Some(at);
        Some(Stamped::new(width_us as f32 / US_PER_METRE, at))
    }

    fn present(&mut self) -> bool {
        self.capture
            .last_pulse()
            .is_some_and(|(_, at)| self.now_us.saturating_sub(at) <= STALE_US)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volant_core::ClockDelay;
    use volant_hal::mock::{MockClock, MockPulseCapture};

    #[test]
    fn test_no_echo_fails_probe() {
        let capture = MockPulseCapture::new();
        let mut clock = MockClock::new();
        let mut sonar = PwmSonar::new(&capture);
        assert!(!sonar.probe(&mut ClockDelay::new(&mut clock)));
        assert!(!sonar.present());
    }

    #[test]
    fn test_each_echo_read_once() {
        let capture = MockPulseCapture::new();
        capture.capture(5800, 1_000);
        let mut clock = MockClock::new();
        let mut sonar = PwmSonar::new(&capture);
        assert!(sonar.probe(&mut ClockDelay::new(&mut clock)));

        sonar.kick_update(2_000);
        assert_eq!(sonar.try_consume(), Some(Stamped::new(1.0, 1_000)));
        assert_eq!(sonar.try_consume(), None);

        capture.capture(2900, 3_000);
        assert_eq!(sonar.try_consume(), Some(Stamped::new(0.5, 3_000)));
    }

    #[test]
    fn test_goes_stale() {
        let capture = MockPulseCapture::new();
        capture.capture(5800, 1_000);
        let mut clock = MockClock::new();
        let mut sonar = PwmSonar::new(&capture);
        assert!(sonar.probe(&mut ClockDelay::new(&mut clock)));

        sonar.kick_update(101_000);
        assert!(sonar.present());
        sonar.kick_update(101_001);
        assert!(!sonar.present());
    }
}
