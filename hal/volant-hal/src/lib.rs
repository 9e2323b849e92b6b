//! Volant Hardware Abstraction Layer
//!
//! This crate defines the peripheral capability traits consumed by the
//! board families (`volant-hal-f1`, `volant-hal-f4`) and the sensor drivers
//! in `volant-drivers`. Chip-level transaction engines implement these
//! traits; everything above them stays chip-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Flight-control stack (uses core Board) │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ volant-hal-f1 │       │ volant-hal-f4 │
//! └───────────────┘       └───────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  volant-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`clock::Clock`], [`clock::SystemControl`] - Time base and reset
//! - [`gpio::OutputPin`], [`gpio::DataReadyLine`] - LEDs and IMU interrupt
//! - [`uart::SerialPort`] - Byte-stream transport
//! - [`i2c::I2cBus`] - Blocking and interrupt-driven I2C
//! - [`spi::SpiBus`] - Blocking and interrupt-driven SPI
//! - [`pwm::PwmOutput`], [`pwm::PulseCapture`] - ESC output and echo timing
//! - [`rc::RcReceiver`] - PPM/SBUS receiver
//! - [`flash::BlobStorage`] - Raw non-volatile region

#![cfg_attr(not(any(test, feature = "mock")), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod pwm;
pub mod rc;
pub mod spi;
pub mod uart;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use clock::{Clock, SystemControl};
pub use flash::{BlobStorage, FlashError};
pub use gpio::{DataReadyLine, InputPin, OutputPin};
pub use i2c::{BusError, I2cBus, JobQueue, SharedI2c};
pub use pwm::{PulseCapture, PwmOutput};
pub use rc::{RcInputKind, RcReceiver};
pub use spi::{SharedSpi, SpiBus};
pub use uart::SerialPort;
