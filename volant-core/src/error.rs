//! Device-level error type

use volant_hal::BusError;

/// Errors raised by sensor drivers
///
/// These never cross the [`Board`](crate::Board) boundary: the board turns
/// them into `false` or a stale reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// Bus transaction failed
    Bus(BusError),
    /// Identification register did not match
    WrongDevice,
    /// Calibration memory failed its checksum
    BadCalibration,
    /// Device reported a fault in its status bits
    Fault,
}

impl From<BusError> for DeviceError {
    fn from(e: BusError) -> Self {
        DeviceError::Bus(e)
    }
}
