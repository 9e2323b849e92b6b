//! Peripheral set of an F1-class board

use core::cell::RefCell;

use volant_hal::{
    BlobStorage, Clock, DataReadyLine, I2cBus, OutputPin, PulseCapture, PwmOutput, RcReceiver,
    SerialPort, SystemControl,
};

/// Concrete peripheral types supplied by the chip support crate
///
/// Implemented on a marker type; the board never constructs it.
pub trait F1Platform {
    type Clock: Clock;
    type System: SystemControl;
    /// USART1
    type Serial: SerialPort;
    /// I2C2, shared by every external sensor
    type I2c: I2cBus;
    /// Timer input capture on the sonar echo pin
    type Capture: PulseCapture;
    /// EXTI line carrying the MPU6050 data-ready signal
    type DataReady: DataReadyLine;
    /// PPM decoder on the RC input timer
    type Rc: RcReceiver;
    /// Motor/servo timer outputs
    type Pwm: PwmOutput;
    /// Flash page reserved for settings
    type Storage: BlobStorage;
    type Led: OutputPin;
}

/// Peripherals handed to [`F1Board::new`](crate::F1Board::new)
///
/// The I2C bus and the echo capture are shared with the sensor drivers,
/// so they are borrowed rather than owned.
pub struct F1Peripherals<'a, P: F1Platform> {
    pub clock: P::Clock,
    pub system: P::System,
    pub serial: P::Serial,
    pub i2c: &'a RefCell<P::I2c>,
    pub sonar_capture: &'a P::Capture,
    /// Data-ready on PB13 (board revisions up to 4)
    pub drdy_pb13: P::DataReady,
    /// Data-ready on PC13 (board revision 5)
    pub drdy_pc13: P::DataReady,
    pub rc: P::Rc,
    pub pwm: P::Pwm,
    pub storage: P::Storage,
    pub led0: P::Led,
    pub led1: P::Led,
}
