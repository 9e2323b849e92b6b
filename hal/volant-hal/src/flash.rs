//! Non-volatile storage abstractions
//!
//! A board reserves one raw region (an emulated-EEPROM flash page or an
//! external SPI flash sector) for persisted configuration. Integrity
//! checking lives above this trait, in `volant_core::memory`.

/// Errors from non-volatile storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Access beyond the end of the region
    OutOfBounds,
    /// Erase before write failed
    Erase,
    /// Storage not prepared
    NotReady,
}

/// Raw byte-addressed non-volatile region
pub trait BlobStorage {
    /// Size of the region in bytes
    fn capacity(&self) -> usize;

    /// Bring up the underlying device (SPI flash wake-up, page unlock)
    fn prepare(&mut self) -> Result<(), FlashError>;

    /// Read `buf.len()` bytes starting at `offset`
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Erase the whole region to the all-ones state
    fn erase(&mut self) -> Result<(), FlashError>;

    /// Program `data` starting at `offset`
    ///
    /// The target range must have been erased since it was last written.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), FlashError>;
}
