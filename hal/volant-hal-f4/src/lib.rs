//! STM32F4-class board family
//!
//! Revo-style boards: an MPU6000 on its own SPI bus, HMC5883L and MS5611
//! on the internal I2C bus, an external I2C port for the airspeed sensor,
//! USB virtual COM port for serial and an SPI flash for settings.
//!
//! Peripherals come from the chip support crate through [`F4Platform`].
//!
//! # Sensor priorities
//!
//! | Role | Variants, in probe order |
//! |---|---|
//! | IMU | MPU6000 |
//! | Barometer | MS5611 |
//! | Magnetometer | HMC5883L |
//! | Differential pressure | MS4525DO (external bus) |
//! | Rangefinder | none |

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod board;
pub mod platform;
pub mod sensors;

pub use board::{F4Board, F4_AXES, F4_REVISIONS};
pub use platform::{F4Peripherals, F4Platform};
pub use sensors::SensorBus;
