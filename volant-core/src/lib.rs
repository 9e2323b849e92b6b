//! Board-agnostic core of the Volant flight-controller HAL
//!
//! This crate contains everything above the peripheral traits that does
//! not depend on a particular board family:
//!
//! - The [`Board`] contract consumed by the flight-control stack
//! - The async sensor channel (kick/consume split and the shared reading slot)
//! - The sensor probe registry binding each role to a device variant
//! - The IMU fault-recovery policy
//! - Axis remapping and unit conversion
//! - RC staleness tracking, PWM pulse mapping and the persisted blob format

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod board;
pub mod channel;
pub mod config;
pub mod delay;
pub mod error;
pub mod frame;
pub mod imu;
pub mod memory;
pub mod pwm;
pub mod rc;
pub mod recovery;
pub mod registry;

pub use board::{BaroReading, Board, DiffPressureReading};
pub use channel::{ReadingSlot, SensorDevice, Stamped};
pub use config::BoardConfig;
pub use delay::ClockDelay;
pub use error::DeviceError;
pub use frame::AxisMap;
pub use imu::{Calibration, ImuDevice, ImuSample, RawImu, STANDARD_GRAVITY};
pub use memory::{ConfigMemory, MemoryError};
pub use pwm::PulseRange;
pub use rc::RcChannelSet;
pub use recovery::{FaultRecovery, RecoveryState};
pub use registry::{ProbeReport, SensorKind, SensorRole, VariantCtor};
