//! Board tunables
//!
//! Values that are constants on a given airframe but are not properties of
//! the hardware itself.

use serde::{Deserialize, Serialize};

/// Tunable board parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// RC input is lost after this long without a frame (ms)
    pub rc_staleness_ms: u32,
    /// Pulse width for an actuator command of -1.0 (µs)
    pub pwm_min_us: u16,
    /// Pulse width for an actuator command of +1.0 (µs)
    pub pwm_max_us: u16,
    /// RC pulse width normalized to 0.0 (µs)
    pub rc_min_us: u16,
    /// RC pulse width normalized to 1.0 (µs)
    pub rc_max_us: u16,
    /// Sensors are probed no earlier than this long after boot (ms)
    pub sensor_boot_ms: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rc_staleness_ms: 40,
            pwm_min_us: 1000,
            pwm_max_us: 2000,
            rc_min_us: 1000,
            rc_max_us: 2000,
            sensor_boot_ms: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postcard_roundtrip_of_tuned_config() {
        let config = BoardConfig {
            rc_staleness_ms: 100,
            pwm_max_us: 1900,
            ..Default::default()
        };
        let mut buf = [0u8; 32];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();
        let decoded: BoardConfig = postcard::from_bytes(bytes).unwrap();
        assert_eq!(decoded, config);
    }
}
