//! Mock peripherals for host-side testing
//!
//! Every mock is cheap to clone and clones share state, so a test can hand
//! one copy to the code under test and keep another to inspect or drive it.
//! The I2C and SPI mocks model register-mapped devices and let the test
//! decide when queued transactions complete.

mod clock;
mod flash;
mod gpio;
mod i2c;
mod pwm;
mod rc;
mod serial;
mod spi;

pub use clock::{MockClock, MockSystem};
pub use flash::MockStorage;
pub use gpio::{MockDataReady, MockLed};
pub use i2c::{MockI2c, MockI2cDevice};
pub use pwm::{MockPulseCapture, MockPwm};
pub use rc::MockRc;
pub use serial::MockSerial;
pub use spi::MockSpi;
