//! SPI device abstractions
//!
//! Each [`SpiBus`] handle addresses one device: chip select is asserted by
//! the implementation around every transfer.

use core::cell::RefCell;

use crate::i2c::BusError;

/// SPI device on a dedicated chip select
pub trait SpiBus {
    /// Transfer data in place (blocking)
    ///
    /// Writes data from buffer while reading into the same buffer.
    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), BusError>;

    /// Queue a full-duplex transfer (DMA) and return immediately
    ///
    /// Fails with [`BusError::Busy`] while a previous transfer is in flight.
    fn start_transfer(&mut self, data: &[u8]) -> Result<(), BusError>;

    /// Whether a queued transfer is still in flight
    fn is_busy(&self) -> bool;

    /// Collect the bytes clocked in by the last queued transfer
    fn poll_transfer(&mut self, buf: &mut [u8]) -> nb::Result<(), BusError>;
}

/// Handle to an SPI device owned by the board
///
/// Lets a driver built from a shared bus context reach a device the board
/// holds in a `RefCell`, the same way [`SharedI2c`](crate::SharedI2c)
/// does for I2C.
pub struct SharedSpi<'a, S> {
    spi: &'a RefCell<S>,
}

impl<'a, S> SharedSpi<'a, S> {
    /// Wrap a device for sharing
    pub fn new(spi: &'a RefCell<S>) -> Self {
        Self { spi }
    }
}

impl<S> Clone for SharedSpi<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SharedSpi<'_, S> {}

impl<S: SpiBus> SpiBus for SharedSpi<'_, S> {
    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), BusError> {
        self.spi.borrow_mut().transfer_in_place(data)
    }

    fn start_transfer(&mut self, data: &[u8]) -> Result<(), BusError> {
        self.spi.borrow_mut().start_transfer(data)
    }

    fn is_busy(&self) -> bool {
        self.spi.borrow().is_busy()
    }

    fn poll_transfer(&mut self, buf: &mut [u8]) -> nb::Result<(), BusError> {
        self.spi.borrow_mut().poll_transfer(buf)
    }
}
