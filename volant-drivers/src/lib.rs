//! Sensor device variants
//!
//! Each driver fills one sensor role of [`volant_core::SensorDevice`] and
//! runs its bus traffic through the split kick/consume protocol:
//!
//! - Barometers: BMP280, MS5611
//! - Magnetometer: HMC5883L
//! - Differential pressure: MS4525DO
//! - Rangefinders: MB1242 (I2C), PWM-echo sonar
//! - IMUs: MPU6050 (I2C), MPU6000 (SPI)
//!
//! Drivers are generic over the bus traits in `volant-hal`, so a board
//! shares one I2C bus between several of them through
//! [`volant_hal::SharedI2c`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

mod bus;

pub mod airspeed;
pub mod baro;
pub mod imu;
pub mod mag;
pub mod sonar;

pub use airspeed::Ms4525;
pub use baro::{Bmp280, Ms5611};
pub use imu::{Mpu6000, Mpu6050};
pub use mag::Hmc5883l;
pub use sonar::{Mb1242, PwmSonar};
