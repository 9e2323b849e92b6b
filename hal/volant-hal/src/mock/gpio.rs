//! Mock GPIO: LEDs and the IMU data-ready line

use std::cell::Cell;
use std::rc::Rc;

use crate::gpio::{DataReadyLine, OutputPin};

/// Mock output pin
#[derive(Debug, Clone, Default)]
pub struct MockLed {
    high: Rc<Cell<bool>>,
}

impl MockLed {
    /// Create a pin driven low
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputPin for MockLed {
    fn set_high(&mut self) {
        self.high.set(true);
    }

    fn set_low(&mut self) {
        self.high.set(false);
    }

    fn toggle(&mut self) {
        self.high.set(!self.high.get());
    }

    fn is_set_high(&self) -> bool {
        self.high.get()
    }
}

/// Mock external-interrupt line
#[derive(Debug, Clone, Default)]
pub struct MockDataReady {
    edge: Rc<Cell<Option<u64>>>,
}

impl MockDataReady {
    /// Create a line with no pending edge
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch an edge at `at_us`, as the interrupt handler would
    pub fn fire(&self, at_us: u64) {
        self.edge.set(Some(at_us));
    }

    /// Whether an edge is waiting to be serviced
    pub fn pending(&self) -> bool {
        self.edge.get().is_some()
    }
}

impl DataReadyLine for MockDataReady {
    fn take_edge(&mut self) -> Option<u64> {
        self.edge.take()
    }
}
