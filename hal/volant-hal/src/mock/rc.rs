//! Mock RC receiver

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::rc::{RcInputKind, RcReceiver};

#[derive(Debug, Default)]
struct RcState {
    kind: Option<RcInputKind>,
    pending: Option<Vec<u16>>,
}

/// Mock receiver delivering frames pushed by the test
#[derive(Debug, Clone, Default)]
pub struct MockRc {
    state: Rc<RefCell<RcState>>,
}

impl MockRc {
    /// Create a receiver with no pending frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a frame of pulse widths
    pub fn push_frame(&self, channels: &[u16]) {
        self.state.borrow_mut().pending = Some(channels.to_vec());
    }

    /// Protocol passed to `start`
    pub fn kind(&self) -> Option<RcInputKind> {
        self.state.borrow().kind
    }
}

impl RcReceiver for MockRc {
    fn start(&mut self, kind: RcInputKind) {
        self.state.borrow_mut().kind = Some(kind);
    }

    fn poll(&mut self, channels: &mut [u16]) -> bool {
        let Some(frame) = self.state.borrow_mut().pending.take() else {
            return false;
        };
        let n = channels.len().min(frame.len());
        channels[..n].copy_from_slice(&frame[..n]);
        true
    }
}
