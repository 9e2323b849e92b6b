//! Actuator command to pulse-width mapping

use crate::config::BoardConfig;

/// Pulse-width range an actuator command maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseRange {
    /// Pulse for a command of -1.0 (µs)
    pub min_us: u16,
    /// Pulse for a command of +1.0 (µs)
    pub max_us: u16,
}

impl PulseRange {
    /// Range from the board configuration
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            min_us: config.pwm_min_us,
            max_us: config.pwm_max_us,
        }
    }

    /// Map a command in `[-1, 1]` linearly onto the pulse range
    ///
    /// Out-of-range commands clamp to the nearest end; NaN maps to the
    /// minimum pulse.
    pub fn pulse_for(&self, value: f32) -> u16 {
        if value.is_nan() {
            return self.min_us;
        }
        let value = value.clamp(-1.0, 1.0);
        let span = f32::from(self.max_us.saturating_sub(self.min_us));
        let offset = ((value + 1.0) * 0.5 * span + 0.5) as u16;
        self.min_us.saturating_add(offset)
    }
}

impl Default for PulseRange {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}
