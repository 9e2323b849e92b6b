//! InvenSense MPU-6000/6050 IMUs
//!
//! Both parts share one register map; the MPU-6050 talks I2C and the
//! MPU-6000 talks SPI. The board drives them from the data-ready
//! interrupt: each edge kicks a 14-byte burst read of accel, temperature
//! and gyro.

pub mod mpu6000;
pub mod mpu6050;

pub use mpu6000::Mpu6000;
pub use mpu6050::Mpu6050;

use volant_core::RawImu;

/// Value of `WHO_AM_I` (bits 6:1)
pub const WHO_AM_I_VALUE: u8 = 0x68;

/// Shared register map
pub mod reg {
    /// Accelerometer X offset, high byte (revision bits live here)
    pub const XA_OFFS_H: u8 = 0x06;
    pub const PRODUCT_ID: u8 = 0x0C;
    pub const SMPLRT_DIV: u8 = 0x19;
    pub const CONFIG: u8 = 0x1A;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const INT_PIN_CFG: u8 = 0x37;
    pub const INT_ENABLE: u8 = 0x38;
    /// Start of the 14-byte sample burst
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const USER_CTRL: u8 = 0x6A;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const WHO_AM_I: u8 = 0x75;
}

/// Bytes in one accel/temperature/gyro burst
pub const BURST_LEN: usize = 14;

/// `PWR_MGMT_1` device reset bit
pub(crate) const DEVICE_RESET: u8 = 0x80;
/// Time for the part to come back from reset (ms)
pub(crate) const RESET_MS: u32 = 100;

/// Register writes applied after reset, in order
///
/// PLL on the gyro Z axis, full sample rate, 44 Hz DLPF, ±2000 °/s,
/// ±8 g, data-ready latched until any read, data-ready interrupt on.
pub(crate) const CONFIG_SEQUENCE: [(u8, u8); 7] = [
    (reg::PWR_MGMT_1, 0x03),
    (reg::SMPLRT_DIV, 0x00),
    (reg::CONFIG, 0x03),
    (reg::GYRO_CONFIG, 0x18),
    (reg::ACCEL_CONFIG, 0x10),
    (reg::INT_PIN_CFG, 0x10),
    (reg::INT_ENABLE, 0x01),
];

/// Accelerometer counts per g at ±8 g
pub const ACC_1G: u16 = 512 * 8;
/// Counts per g on early MPU-6050 silicon with half accel sensitivity
pub const ACC_1G_HALF: u16 = 255 * 8;

/// rad/s per count at ±2000 °/s (16.4 LSB per °/s)
pub const GYRO_RAD_PER_LSB: f32 = core::f32::consts::PI / (180.0 * 16.4);

/// Die temperature in °C from the raw register value
pub fn temperature_c(raw: i16) -> f32 {
    f32::from(raw) / 340.0 + 36.53
}

/// Split a big-endian burst into its fields
pub fn decode_burst(b: &[u8; BURST_LEN]) -> RawImu {
    let word = |i: usize| i16::from_be_bytes([b[2 * i], b[2 * i + 1]]);
    RawImu {
        accel: [word(0), word(1), word(2)],
        temperature: word(3),
        gyro: [word(4), word(5), word(6)],
    }
}
