//! Mock SPI device with a register file

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::i2c::BusError;
use crate::spi::SpiBus;

/// Register read flag in the first byte of a transfer
const READ_FLAG: u8 = 0x80;

#[derive(Debug)]
struct SpiState {
    registers: [u8; 128],
    responding: bool,
    auto_complete: bool,
    queued: Option<(Vec<u8>, bool)>,
}

/// Mock SPI device using the common "address byte, then data" convention
///
/// A first byte with bit 7 set reads registers from that address on;
/// otherwise the following bytes are written to the registers. A device
/// that is not responding clocks back zeros.
#[derive(Debug, Clone)]
pub struct MockSpi {
    state: Rc<RefCell<SpiState>>,
}

impl Default for MockSpi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpi {
    /// Create a responding device with zeroed registers
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SpiState {
                registers: [0; 128],
                responding: true,
                auto_complete: true,
                queued: None,
            })),
        }
    }

    /// Overwrite registers starting at `start`
    pub fn set_registers(&self, start: u8, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        for (i, b) in bytes.iter().enumerate() {
            state.registers[(start as usize + i) & 0x7F] = *b;
        }
    }

    /// Read back a register
    pub fn register(&self, reg: u8) -> u8 {
        self.state.borrow().registers[(reg & 0x7F) as usize]
    }

    /// Make the device stop (or resume) driving MISO
    pub fn set_responding(&self, responding: bool) {
        self.state.borrow_mut().responding = responding;
    }

    /// Choose whether queued transfers complete as soon as they start
    pub fn set_auto_complete(&self, auto_complete: bool) {
        self.state.borrow_mut().auto_complete = auto_complete;
    }

    /// Finish the in-flight transfer
    pub fn complete(&self) {
        if let Some((_, done)) = self.state.borrow_mut().queued.as_mut() {
            *done = true;
        }
    }
}

impl SpiState {
    fn exchange(&mut self, data: &mut [u8]) {
        let Some(&first) = data.first() else {
            return;
        };
        let reg = (first & !READ_FLAG) as usize;
        let rest = &mut data[1..];
        if first & READ_FLAG != 0 {
            for (i, b) in rest.iter_mut().enumerate() {
                *b = if self.responding {
                    self.registers[(reg + i) & 0x7F]
                } else {
                    0
                };
            }
        } else if self.responding {
            for (i, b) in rest.iter().enumerate() {
                self.registers[(reg + i) & 0x7F] = *b;
            }
        }
        data[0] = 0;
    }
}

impl SpiBus for MockSpi {
    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), BusError> {
        self.state.borrow_mut().exchange(data);
        Ok(())
    }

    fn start_transfer(&mut self, data: &[u8]) -> Result<(), BusError> {
        if self.is_busy() {
            return Err(BusError::Busy);
        }
        let mut state = self.state.borrow_mut();
        let mut buf = data.to_vec();
        state.exchange(&mut buf);
        let done = state.auto_complete;
        state.queued = Some((buf, done));
        Ok(())
    }

    fn is_busy(&self) -> bool {
        matches!(self.state.borrow().queued, Some((_, false)))
    }

    fn poll_transfer(&mut self, buf: &mut [u8]) -> nb::Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        match state.queued.take() {
            None => Err(nb::Error::Other(BusError::NoTransaction)),
            Some((data, false)) => {
                state.queued = Some((data, false));
                Err(nb::Error::WouldBlock)
            }
            Some((data, true)) => {
                let n = buf.len().min(data.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_read_and_write() {
        let mut spi = MockSpi::new();
        spi.transfer_in_place(&mut [0x6B, 0x01]).unwrap();
        assert_eq!(spi.register(0x6B), 0x01);

        let mut buf = [0x6B | READ_FLAG, 0];
        spi.transfer_in_place(&mut buf).unwrap();
        assert_eq!(buf[1], 0x01);
    }

    #[test]
    fn test_silent_device_reads_zero() {
        let mut spi = MockSpi::new();
        spi.set_registers(0x75, &[0x68]);
        spi.set_responding(false);

        let mut buf = [0x75 | READ_FLAG, 0xFF];
        spi.transfer_in_place(&mut buf).unwrap();
        assert_eq!(buf[1], 0);
    }

    #[test]
    fn test_queued_transfer() {
        let mut spi = MockSpi::new();
        spi.set_registers(0x3B, &[9, 8]);
        spi.set_auto_complete(false);

        spi.start_transfer(&[0x3B | READ_FLAG, 0, 0]).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(spi.poll_transfer(&mut buf), Err(nb::Error::WouldBlock));

        spi.complete();
        spi.poll_transfer(&mut buf).unwrap();
        assert_eq!(&buf[1..], &[9, 8]);
    }
}
