//! Peripheral set of an F4-class board

use core::cell::RefCell;

use volant_hal::{
    BlobStorage, Clock, DataReadyLine, I2cBus, OutputPin, PwmOutput, RcReceiver, SerialPort,
    SpiBus, SystemControl,
};

/// Concrete peripheral types supplied by the chip support crate
pub trait F4Platform {
    type Clock: Clock;
    type System: SystemControl;
    /// USB virtual COM port; the baud rate is ignored
    type Serial: SerialPort;
    /// SPI1 with the MPU6000 chip select
    type Spi: SpiBus;
    /// On-board I2C (magnetometer, barometer)
    type InternalI2c: I2cBus;
    /// I2C on the external connector
    type ExternalI2c: I2cBus;
    type DataReady: DataReadyLine;
    type Ppm: RcReceiver;
    type Sbus: RcReceiver;
    type Pwm: PwmOutput;
    /// Settings region on the SPI flash
    type Storage: BlobStorage;
    type Led: OutputPin;
}

/// Peripherals handed to [`F4Board::new`](crate::F4Board::new)
pub struct F4Peripherals<'a, P: F4Platform> {
    pub clock: P::Clock,
    pub system: P::System,
    pub serial: P::Serial,
    pub spi: &'a RefCell<P::Spi>,
    pub internal_i2c: &'a RefCell<P::InternalI2c>,
    pub external_i2c: &'a RefCell<P::ExternalI2c>,
    pub drdy: P::DataReady,
    pub ppm: P::Ppm,
    pub sbus: P::Sbus,
    pub pwm: P::Pwm,
    pub storage: P::Storage,
    pub led0: P::Led,
    pub led1: P::Led,
}
