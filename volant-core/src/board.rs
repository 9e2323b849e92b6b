//! Board abstraction contract
//!
//! [`Board`] is everything the flight-control stack needs from the
//! hardware. A firmware image links exactly one board family, which
//! implements this trait over its concrete peripherals.
//!
//! Sensor accessors never block and never return errors: a missing part
//! reads as absent from its `*_check` method, and its `*_read` method keeps
//! returning the last good (or zero) value.

use volant_hal::RcInputKind;

use crate::imu::ImuSample;
use crate::registry::ProbeReport;

/// Barometer reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaroReading {
    /// Static pressure (Pa)
    pub pressure_pa: f32,
    /// Sensor temperature (°C)
    pub temperature_c: f32,
}

/// Differential-pressure (airspeed) reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiffPressureReading {
    /// Pitot minus static pressure (Pa)
    pub pressure_pa: f32,
    /// Sensor temperature (°C)
    pub temperature_c: f32,
}

/// Hardware contract of a flight-controller board
///
/// `init_board` must run exactly once, before anything else.
pub trait Board {
    // System

    /// Clock and system bring-up
    fn init_board(&mut self);

    /// Restart, optionally into the bootloader
    fn board_reset(&mut self, bootloader: bool) -> !;

    // Clock

    /// Milliseconds since boot; wraps after about 49.7 days
    fn clock_millis(&self) -> u32;

    /// Microseconds since boot
    fn clock_micros(&self) -> u64;

    /// Busy-wait; not for use inside the control loop
    fn clock_delay(&mut self, ms: u32);

    // Serial

    fn serial_init(&mut self, baudrate: u32);

    /// Queue bytes; whatever does not fit is dropped
    fn serial_write(&mut self, data: &[u8]);

    fn serial_bytes_available(&self) -> u16;

    /// Next received byte, `None` when nothing is waiting
    fn serial_read(&mut self) -> Option<u8>;

    fn serial_flush(&mut self);

    // Sensors

    /// Probe every sensor role and bind what answers
    ///
    /// Safe to call again; the bindings are rebuilt from scratch.
    fn sensors_init(&mut self) -> ProbeReport;

    /// Accumulated bus error count
    fn num_sensor_errors(&self) -> u16;

    /// Whether an IMU sample arrived since the last [`imu_read`](Board::imu_read)
    fn new_imu_data(&mut self) -> bool;

    /// Latest IMU sample in body axes and SI units
    ///
    /// `None` when the part has returned nothing usable (all-zero
    /// accelerometer). Never blocks.
    fn imu_read(&mut self) -> Option<ImuSample>;

    /// Report implausible IMU data; the board reconfigures and re-probes
    fn imu_not_responding_error(&mut self);

    fn mag_check(&mut self) -> bool;

    /// Magnetic field in sensor axes (gauss)
    fn mag_read(&mut self) -> [f32; 3];

    fn baro_check(&mut self) -> bool;

    fn baro_read(&mut self) -> BaroReading;

    fn diff_pressure_check(&mut self) -> bool;

    fn diff_pressure_read(&mut self) -> DiffPressureReading;

    fn sonar_check(&mut self) -> bool;

    /// Range to ground (m); 0.0 when no rangefinder is fitted
    fn sonar_read(&mut self) -> f32;

    // RC input

    fn rc_init(&mut self, kind: RcInputKind);

    /// Channel value, 0.0 at the low endpoint and 1.0 at the high one
    fn rc_read(&mut self, channel: u8) -> f32;

    /// Whether no RC frame arrived within the staleness window
    fn rc_lost(&mut self) -> bool;

    // Actuators

    fn pwm_init(&mut self, refresh_rate_hz: u32, idle_us: u16);

    /// Drive `channel` with a command in `[-1, 1]`; out-of-range clamps
    fn pwm_write(&mut self, channel: u8, value: f32);

    // Non-volatile memory

    fn memory_init(&mut self) -> bool;

    /// Fill `buf` from the stored blob; `false` on any integrity failure
    fn memory_read(&mut self, buf: &mut [u8]) -> bool;

    fn memory_write(&mut self, data: &[u8]) -> bool;

    // LEDs

    fn led0_on(&mut self);
    fn led0_off(&mut self);
    fn led0_toggle(&mut self);

    fn led1_on(&mut self);
    fn led1_off(&mut self);
    fn led1_toggle(&mut self);
}
