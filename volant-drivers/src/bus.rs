//! Outstanding-transaction bookkeeping for I2C drivers

use volant_hal::{BusError, I2cBus};

/// Tracks the one queued transaction a driver may have in flight
///
/// Also remembers whether the device acknowledged its most recent
/// transaction, which is what the drivers report as presence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Transfer {
    address: u8,
    pending: Option<u64>,
    acked: bool,
}

impl Transfer {
    pub(crate) const fn new(address: u8) -> Self {
        Self {
            address,
            pending: None,
            acked: false,
        }
    }

    pub(crate) fn address(&self) -> u8 {
        self.address
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn acked(&self) -> bool {
        self.acked
    }

    /// Record the outcome of a blocking transaction or bring-up sequence
    pub(crate) fn note<T, E>(&mut self, result: &Result<T, E>) {
        self.acked = result.is_ok();
    }

    /// Queue a write-then-read stamped with `now_us`
    ///
    /// Does nothing while this driver already has a transaction
    /// outstanding or the bus queue is full. Returns whether a transaction
    /// was queued.
    pub(crate) fn start<B: I2cBus>(
        &mut self,
        bus: &mut B,
        write: &[u8],
        read_len: usize,
        now_us: u64,
    ) -> bool {
        if self.pending.is_some() {
            return false;
        }
        match bus.start_write_read(self.address, write, read_len) {
            Ok(()) => {
                self.pending = Some(now_us);
                true
            }
            Err(BusError::Busy) => false,
            Err(_) => {
                self.acked = false;
                false
            }
        }
    }

    /// Collect the queued transaction into `buf`
    ///
    /// Returns the kick timestamp once the transaction has completed
    /// successfully.
    pub(crate) fn finish<B: I2cBus>(&mut self, bus: &mut B, buf: &mut [u8]) -> Option<u64> {
        let started = self.pending?;
        match bus.poll_read(self.address, buf) {
            Ok(()) => {
                self.pending = None;
                self.acked = true;
                Some(started)
            }
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(BusError::NoTransaction)) => {
                // Dropped by a bus reset
                self.pending = None;
                None
            }
            Err(nb::Error::Other(_)) => {
                self.pending = None;
                self.acked = false;
                None
            }
        }
    }

    /// Forget any in-flight transaction
    pub(crate) fn reset(&mut self) {
        self.pending = None;
    }
}
