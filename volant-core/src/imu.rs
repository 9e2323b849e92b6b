//! IMU sample conversion
//!
//! Raw 16-bit accelerometer and gyro counts come off the part in its own
//! frame. A board turns them into SI units in the body frame using the
//! family's [`AxisMap`] and the [`Calibration`] derived at probe time.

use crate::channel::{SensorDevice, Stamped};
use crate::frame::AxisMap;

/// Standard gravity (m/s²)
pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Raw IMU burst in device axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawImu {
    pub accel: [i16; 3],
    pub temperature: i16,
    pub gyro: [i16; 3],
}

impl RawImu {
    /// An all-zero accelerometer vector means the part returned nothing
    pub fn is_empty(&self) -> bool {
        self.accel == [0; 3]
    }
}

/// Device variant that can fill the IMU role
pub trait ImuDevice: SensorDevice<Reading = RawImu> {
    /// Accelerometer counts per g, as detected at probe time
    fn accel_lsb_per_g(&self) -> u16;

    /// Gyro scale (rad/s per count)
    fn gyro_rad_per_lsb(&self) -> f32;

    /// Convert a raw die temperature to °C
    fn temperature_c(&self, raw: i16) -> f32;
}

/// Board revision and the scale factors derived from the bound IMU
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Board revision; selects the IMU data-ready line on some families
    pub revision: u8,
    /// m/s² per accelerometer count
    pub accel_scale: f32,
    /// rad/s per gyro count
    pub gyro_scale: f32,
}

impl Calibration {
    /// Calibration for `revision` with scales not yet known
    pub const fn new(revision: u8) -> Self {
        Self {
            revision,
            accel_scale: 0.0,
            gyro_scale: 0.0,
        }
    }

    /// Derive the scales from a freshly probed IMU
    pub fn adopt(&mut self, imu: &impl ImuDevice) {
        let lsb_per_g = imu.accel_lsb_per_g();
        self.accel_scale = if lsb_per_g == 0 {
            0.0
        } else {
            STANDARD_GRAVITY / f32::from(lsb_per_g)
        };
        self.gyro_scale = imu.gyro_rad_per_lsb();
    }
}

/// IMU sample in body axes and SI units
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    /// Specific force (m/s²)
    pub accel: [f32; 3],
    /// Angular rate (rad/s)
    pub gyro: [f32; 3],
    /// Die temperature (°C)
    pub temperature_c: f32,
    /// Acquisition time (µs)
    pub time_us: u64,
}

impl ImuSample {
    /// Convert a raw reading
    ///
    /// Returns `None` for the all-zero sentinel.
    pub fn from_raw(
        raw: Stamped<RawImu>,
        axes: &AxisMap,
        cal: &Calibration,
        temperature_c: f32,
    ) -> Option<Self> {
        if raw.value.is_empty() {
            return None;
        }
        Some(Self {
            accel: axes.apply(raw.value.accel, cal.accel_scale),
            gyro: axes.apply(raw.value.gyro, cal.gyro_scale),
            temperature_c,
            time_us: raw.time_us,
        })
    }
}
