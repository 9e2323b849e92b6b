//! Mock serial port

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::uart::SerialPort;

#[derive(Debug, Default)]
struct SerialState {
    baudrate: Option<u32>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    tx_capacity: usize,
    flushes: u32,
}

/// Mock serial port with a bounded transmit buffer
#[derive(Debug, Clone)]
pub struct MockSerial {
    state: Rc<RefCell<SerialState>>,
}

impl MockSerial {
    /// Create a port whose transmit buffer holds `tx_capacity` bytes
    pub fn new(tx_capacity: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(SerialState {
                tx_capacity,
                ..Default::default()
            })),
        }
    }

    /// Queue bytes as if they arrived on the wire
    pub fn inject_rx(&self, data: &[u8]) {
        self.state.borrow_mut().rx.extend(data.iter().copied());
    }

    /// Bytes transmitted so far
    pub fn transmitted(&self) -> Vec<u8> {
        self.state.borrow().tx.clone()
    }

    /// Baud rate passed to `open`, if the port was opened
    pub fn baudrate(&self) -> Option<u32> {
        self.state.borrow().baudrate
    }

    /// Number of `flush` calls
    pub fn flushes(&self) -> u32 {
        self.state.borrow().flushes
    }
}

impl SerialPort for MockSerial {
    fn open(&mut self, baudrate: u32) {
        self.state.borrow_mut().baudrate = Some(baudrate);
    }

    fn write(&mut self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let room = state.tx_capacity.saturating_sub(state.tx.len());
        let n = room.min(data.len());
        state.tx.extend_from_slice(&data[..n]);
    }

    fn bytes_available(&self) -> u16 {
        u16::try_from(self.state.borrow().rx.len()).unwrap_or(u16::MAX)
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.state.borrow_mut().rx.pop_front()
    }

    fn flush(&mut self) {
        self.state.borrow_mut().flushes += 1;
    }
}
