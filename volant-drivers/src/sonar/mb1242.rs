//! MaxBotix MB1242 I2CXL-MaxSonar rangefinder

use embedded_hal::delay::DelayNs;
use volant_core::{SensorDevice, Stamped};
use volant_hal::I2cBus;

use crate::bus::Transfer;

/// Factory-default I2C address
pub const ADDRESS: u8 = 0x70;

/// Take a range reading
pub const RANGE_COMMAND: u8 = 0x51;

/// Ranging takes up to 100 ms; reading earlier NACKs
const RANGING_US: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Commanding,
    Ranging(u64),
    Reading,
}

/// MB1242 driver; readings are range in metres
pub struct Mb1242<B> {
    bus: B,
    phase: Phase,
    transfer: Transfer,
}

impl<B: I2cBus> Mb1242<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            phase: Phase::Idle,
            transfer: Transfer::new(ADDRESS),
        }
    }
}

impl<B: I2cBus> SensorDevice for Mb1242<B> {
    type Reading = f32;

    fn name(&self) -> &'static str {
        "mb1242"
    }

    fn probe(&mut self, _delay: &mut impl DelayNs) -> bool {
        self.transfer.reset();
        self.phase = Phase::Idle;
        let result = self.bus.write(ADDRESS, &[RANGE_COMMAND]);
        self.transfer.note(&result);
        if result.is_ok() {
            self.phase = Phase::Ranging(0);
        }
        result.is_ok()
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        let next = match self.phase {
            Phase::Idle => self
                .transfer
                .start(&mut self.bus, &[RANGE_COMMAND], 0, now_us)
                .then_some(Phase::Commanding),
            Phase::Ranging(since) => (now_us.saturating_sub(since) >= RANGING_US
                && self.transfer.start(&mut self.bus, &[], 2, now_us))
            .then_some(Phase::Reading),
            Phase::Commanding | Phase::Reading => None,
        };
        let started = next.is_some();
        if let Some(phase) = next {
            self.phase = phase;
        }
        started
    }

    fn try_consume(&mut self) -> Option<Stamped<f32>> {
        let mut raw = [0u8; 2];
        let was_pending = self.transfer.is_pending();
        let Some(at) = self.transfer.finish(&mut self.bus, &mut raw) else {
            if was_pending && !self.transfer.is_pending() {
                self.phase = Phase::Idle;
            }
            return None;
        };

        match self.phase {
            Phase::Commanding => {
                self.phase = Phase::Ranging(at);
                None
            }
            Phase::Reading => {
                self.phase = Phase::Idle;
                let cm = u16::from_be_bytes(raw);
                Some(Stamped::new(f32::from(cm) / 100.0, at))
            }
            Phase::Idle | Phase::Ranging(_) => None,
        }
    }

    fn present(&mut self) -> bool {
        self.transfer.acked()
    }
}
