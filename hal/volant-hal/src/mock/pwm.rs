//! Mock PWM output and pulse capture

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use crate::pwm::{PulseCapture, PwmOutput};

#[derive(Debug, Default)]
struct PwmState {
    refresh_rate_hz: Option<u32>,
    pulses: Vec<u16>,
}

/// Mock PWM output recording the last pulse width per channel
#[derive(Debug, Clone)]
pub struct MockPwm {
    state: Rc<RefCell<PwmState>>,
}

impl MockPwm {
    /// Create an output with `channels` channels, all at 0 µs
    pub fn new(channels: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(PwmState {
                refresh_rate_hz: None,
                pulses: vec![0; channels as usize],
            })),
        }
    }

    /// Last pulse width written to `channel`
    pub fn pulse_us(&self, channel: u8) -> u16 {
        self.state.borrow().pulses[channel as usize]
    }

    /// Refresh rate passed to `configure`
    pub fn refresh_rate_hz(&self) -> Option<u32> {
        self.state.borrow().refresh_rate_hz
    }
}

impl PwmOutput for MockPwm {
    fn configure(&mut self, refresh_rate_hz: u32, idle_us: u16) {
        let mut state = self.state.borrow_mut();
        state.refresh_rate_hz = Some(refresh_rate_hz);
        state.pulses.iter_mut().for_each(|p| *p = idle_us);
    }

    fn write_us(&mut self, channel: u8, pulse_us: u16) {
        if let Some(p) = self.state.borrow_mut().pulses.get_mut(channel as usize) {
            *p = pulse_us;
        }
    }

    fn channel_count(&self) -> u8 {
        self.state.borrow().pulses.len() as u8
    }
}

/// Mock input-capture channel
#[derive(Debug, Clone, Default)]
pub struct MockPulseCapture {
    pulse: Rc<Cell<Option<(u32, u64)>>>,
}

impl MockPulseCapture {
    /// Create a channel that has not captured anything
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pulse of `width_us` captured at `at_us`
    pub fn capture(&self, width_us: u32, at_us: u64) {
        self.pulse.set(Some((width_us, at_us)));
    }
}

impl PulseCapture for MockPulseCapture {
    fn last_pulse(&self) -> Option<(u32, u64)> {
        self.pulse.get()
    }
}
