//! RC channel set and signal-loss tracking

use volant_hal::RcReceiver;

use crate::config::BoardConfig;

/// Maximum channels carried by any supported receiver protocol
pub const MAX_RC_CHANNELS: usize = 16;

/// Last received RC frame and when it arrived
#[derive(Debug, Clone)]
pub struct RcChannelSet {
    pulses_us: [u16; MAX_RC_CHANNELS],
    last_update_ms: Option<u32>,
    min_us: u16,
    max_us: u16,
    staleness_ms: u32,
}

impl RcChannelSet {
    /// Empty set; every channel reads as `rc_min_us` until a frame arrives
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            pulses_us: [config.rc_min_us; MAX_RC_CHANNELS],
            last_update_ms: None,
            min_us: config.rc_min_us,
            max_us: config.rc_max_us,
            staleness_ms: config.rc_staleness_ms,
        }
    }

    /// Forget the last frame
    pub fn reset(&mut self) {
        self.pulses_us = [self.min_us; MAX_RC_CHANNELS];
        self.last_update_ms = None;
    }

    /// Pull a new frame from `rx`, stamping it with `now_ms`
    pub fn poll(&mut self, rx: &mut impl RcReceiver, now_ms: u32) -> bool {
        if rx.poll(&mut self.pulses_us) {
            self.last_update_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    /// Raw pulse width of `channel`
    pub fn pulse_us(&self, channel: u8) -> Option<u16> {
        self.pulses_us.get(usize::from(channel)).copied()
    }

    /// Channel value scaled so `rc_min_us` is 0.0 and `rc_max_us` is 1.0
    ///
    /// Not clamped: a receiver that overshoots its endpoints reads slightly
    /// outside the range. Unknown channels read 0.0.
    pub fn normalized(&self, channel: u8) -> f32 {
        let Some(us) = self.pulse_us(channel) else {
            return 0.0;
        };
        let span = f32::from(self.max_us) - f32::from(self.min_us);
        if span <= 0.0 {
            return 0.0;
        }
        (f32::from(us) - f32::from(self.min_us)) / span
    }

    /// Whether the link is down at `now_ms`
    ///
    /// True before the first frame and whenever the newest frame is older
    /// than the staleness window. Uses wrapping arithmetic, so the 32-bit
    /// millisecond counter rolling over does not read as a loss.
    pub fn lost(&self, now_ms: u32) -> bool {
        match self.last_update_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) > self.staleness_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volant_hal::mock::MockRc;

    #[test]
    fn test_lost_before_first_frame() {
        let set = RcChannelSet::new(&BoardConfig::default());
        assert!(set.lost(0));
        assert_eq!(set.normalized(0), 0.0);
    }

    #[test]
    fn test_staleness_window() {
        let mut rx = MockRc::new();
        let mut set = RcChannelSet::new(&BoardConfig::default());

        rx.push_frame(&[1500, 2000]);
        assert!(set.poll(&mut rx, 1000));
        assert!(!set.lost(1040));
        assert!(set.lost(1041));

        // No new frame: polling does not refresh the timestamp
        assert!(!set.poll(&mut rx, 1041));
        assert!(set.lost(1041));
    }

    #[test]
    fn test_wraparound_is_not_loss() {
        let mut rx = MockRc::new();
        let mut set = RcChannelSet::new(&BoardConfig::default());

        rx.push_frame(&[1500]);
        set.poll(&mut rx, u32::MAX - 5);
        assert!(!set.lost(10));
        assert!(set.lost(40));
    }

    #[test]
    fn test_normalization() {
        let mut rx = MockRc::new();
        let mut set = RcChannelSet::new(&BoardConfig::default());

        rx.push_frame(&[1000, 1500, 2000]);
        set.poll(&mut rx, 0);
        assert_eq!(set.normalized(0), 0.0);
        assert_eq!(set.normalized(1), 0.5);
        assert_eq!(set.normalized(2), 1.0);
        assert_eq!(set.normalized(200), 0.0);
    }
}
