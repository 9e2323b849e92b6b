//! I2C bus abstractions
//!
//! Provides a bus trait with two halves: blocking transfers used during
//! sensor bring-up, and interrupt-driven transfers used from the control
//! loop. The interrupt-driven half is a job queue: transactions run one
//! at a time in queue order, and each completed result is held for its
//! device until collected.

use core::cell::RefCell;

/// Maximum number of bytes a single queued read may return
pub const MAX_QUEUED_READ: usize = 32;

/// Maximum number of bytes a single queued write may carry
pub const MAX_QUEUED_WRITE: usize = 4;

/// Transactions a bus holds at once, queued or awaiting collection
pub const MAX_QUEUED_JOBS: usize = 8;

/// Error from bus operations (I2C and SPI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Device did not acknowledge its address or data
    Nack,
    /// Arbitration lost to another master
    ArbitrationLost,
    /// Transaction did not finish in time
    Timeout,
    /// A queued transaction is still in flight
    Busy,
    /// No completed transaction is held for this device
    NoTransaction,
    /// Read length exceeds the transaction buffer
    Overrun,
    /// Other error
    Other,
}

/// I2C bus master
pub trait I2cBus {
    /// Write data to a device at the given 7-bit address (blocking)
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError>;

    /// Read data from a device at the given 7-bit address (blocking)
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Write then read with a repeated start (blocking)
    ///
    /// This is commonly used to write a register address then read data.
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError>;

    /// Queue a write-then-read transaction and return immediately
    ///
    /// `read_len` may be zero for a pure command write. Queued
    /// transactions run in order behind any already queued for other
    /// devices. Fails with [`BusError::Busy`] if the queue is full or
    /// `address` already has a transaction queued or uncollected, and with
    /// [`BusError::Overrun`] if the write or read exceeds
    /// [`MAX_QUEUED_WRITE`] or [`MAX_QUEUED_READ`].
    fn start_write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_len: usize,
    ) -> Result<(), BusError>;

    /// Whether any queued transaction has yet to complete
    fn is_busy(&self) -> bool;

    /// Collect the result of the queued transaction for `address`
    ///
    /// Returns `WouldBlock` while the transaction has not completed. On
    /// success the held result is released, so a second call reports
    /// [`BusError::NoTransaction`]. Results held for other addresses are
    /// left alone.
    fn poll_read(&mut self, address: u8, buf: &mut [u8]) -> nb::Result<(), BusError>;

    /// Number of failed transactions since boot
    fn error_count(&self) -> u16;
}

/// A queued transaction waiting for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub address: u8,
    pub write: heapless::Vec<u8, MAX_QUEUED_WRITE>,
    pub read_len: usize,
}

#[derive(Debug, Clone)]
struct Job {
    request: Request,
    result: Option<Result<heapless::Vec<u8, MAX_QUEUED_READ>, BusError>>,
}

/// FIFO of queued transactions for an interrupt-driven bus engine
///
/// The engine starts [`next`](JobQueue::next) on the wire and reports the
/// outcome through [`finish`](JobQueue::finish) from its
/// transfer-complete interrupt. Results wait in the queue until their
/// device collects them with [`take`](JobQueue::take).
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    jobs: heapless::Vec<Job, MAX_QUEUED_JOBS>,
}

impl JobQueue {
    /// Empty queue
    pub const fn new() -> Self {
        Self {
            jobs: heapless::Vec::new(),
        }
    }

    /// Append a transaction; see [`I2cBus::start_write_read`]
    pub fn push(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_len: usize,
    ) -> Result<(), BusError> {
        if read_len > MAX_QUEUED_READ {
            return Err(BusError::Overrun);
        }
        let write = heapless::Vec::from_slice(write_data).map_err(|()| BusError::Overrun)?;
        if self.jobs.iter().any(|job| job.request.address == address) {
            return Err(BusError::Busy);
        }
        self.jobs
            .push(Job {
                request: Request {
                    address,
                    write,
                    read_len,
                },
                result: None,
            })
            .map_err(|_| BusError::Busy)
    }

    /// Oldest transaction that has not run yet
    pub fn next(&self) -> Option<&Request> {
        self.jobs
            .iter()
            .find(|job| job.result.is_none())
            .map(|job| &job.request)
    }

    /// Record the outcome of the transaction returned by [`next`](Self::next)
    pub fn finish(&mut self, result: Result<&[u8], BusError>) {
        let Some(job) = self.jobs.iter_mut().find(|job| job.result.is_none()) else {
            return;
        };
        let n = job.request.read_len;
        job.result = Some(result.map(|data| {
            // n never exceeds MAX_QUEUED_READ, so this cannot fail
            heapless::Vec::from_slice(&data[..n.min(data.len())]).unwrap_or_default()
        }));
    }

    /// Whether any transaction has yet to complete
    pub fn in_flight(&self) -> bool {
        self.next().is_some()
    }

    /// Collect the completed transaction for `address`
    pub fn take(&mut self, address: u8, buf: &mut [u8]) -> nb::Result<(), BusError> {
        let index = self
            .jobs
            .iter()
            .position(|job| job.request.address == address)
            .ok_or(nb::Error::Other(BusError::NoTransaction))?;
        let Some(result) = self.jobs[index].result.clone() else {
            return Err(nb::Error::WouldBlock);
        };
        self.jobs.remove(index);

        let data = result.map_err(nb::Error::Other)?;
        let n = buf.len().min(data.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(())
    }

    /// Drop every transaction, as after a bus reset
    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

/// Handle to an I2C bus shared by several drivers
///
/// Every sensor on a bus holds one of these. Borrows are confined to a
/// single call, and the control loop is single-threaded, so the
/// `RefCell` never sees overlapping borrows.
pub struct SharedI2c<'a, B> {
    bus: &'a RefCell<B>,
}

impl<'a, B> SharedI2c<'a, B> {
    /// Wrap a bus for sharing
    pub fn new(bus: &'a RefCell<B>) -> Self {
        Self { bus }
    }
}

impl<B> Clone for SharedI2c<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for SharedI2c<'_, B> {}

impl<B: I2cBus> I2cBus for SharedI2c<'_, B> {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.bus.borrow_mut().write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.bus.borrow_mut().read(address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        self.bus.borrow_mut().write_read(address, write_data, read_buf)
    }

    fn start_write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_len: usize,
    ) -> Result<(), BusError> {
        self.bus
            .borrow_mut()
            .start_write_read(address, write_data, read_len)
    }

    fn is_busy(&self) -> bool {
        self.bus.borrow().is_busy()
    }

    fn poll_read(&mut self, address: u8, buf: &mut [u8]) -> nb::Result<(), BusError> {
        self.bus.borrow_mut().poll_read(address, buf)
    }

    fn error_count(&self) -> u16 {
        self.bus.borrow().error_count()
    }
}
