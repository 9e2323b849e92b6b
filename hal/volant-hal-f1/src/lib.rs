//! STM32F1-class board family
//!
//! Naze32-style boards: an MPU6050 on the sensor I2C bus, optional
//! barometer, magnetometer, airspeed and rangefinder on the same bus, PPM
//! receiver input and a flash page emulating EEPROM for settings.
//!
//! The chip support crate supplies the peripherals through
//! [`F1Platform`]; [`F1Board`] turns them into a [`volant_core::Board`].
//!
//! # Sensor priorities
//!
//! | Role | Variants, in probe order |
//! |---|---|
//! | IMU | MPU6050 |
//! | Barometer | BMP280, MS5611 |
//! | Magnetometer | HMC5883L |
//! | Differential pressure | MS4525DO |
//! | Rangefinder | MB1242, PWM sonar |

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod board;
pub mod platform;
pub mod sensors;

pub use board::{F1Board, F1_AXES, F1_REVISIONS};
pub use platform::{F1Peripherals, F1Platform};
pub use sensors::{F1Baro, F1Sonar, SensorBus};
