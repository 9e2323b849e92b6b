//! TE MS5611 barometer (I2C)
//!
//! The MS5611 has no free-running mode. Every reading takes two
//! conversions (temperature D2, then pressure D1), each started by a
//! command byte and collected with an ADC read at least 10 ms later. The
//! driver walks that sequence one bus transaction per kick.

use embedded_hal::delay::DelayNs;
use volant_core::{BaroReading, DeviceError, SensorDevice, Stamped};
use volant_hal::I2cBus;

use crate::bus::Transfer;

/// I2C address with CSB tied low
pub const ADDRESS: u8 = 0x77;

/// MS5611 commands
pub mod cmd {
    /// Reload PROM into the internal registers
    pub const RESET: u8 = 0x1E;
    /// Start a D1 (pressure) conversion at OSR 4096
    pub const CONVERT_D1: u8 = 0x48;
    /// Start a D2 (temperature) conversion at OSR 4096
    pub const CONVERT_D2: u8 = 0x58;
    /// Read the 24-bit result of the last conversion
    pub const ADC_READ: u8 = 0x00;
    /// First PROM word; words follow at 2-byte steps
    pub const PROM_READ: u8 = 0xA0;
}

/// Conversion time at OSR 4096 (µs)
const CONVERSION_US: u64 = 10_000;

/// PROM reload time after reset (ms)
const RESET_MS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Temperature,
    Pressure,
}

impl Conversion {
    fn command(self) -> u8 {
        match self {
            Conversion::Temperature => cmd::CONVERT_D2,
            Conversion::Pressure => cmd::CONVERT_D1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Next kick sends the conversion command
    Idle(Conversion),
    /// Command queued on the bus
    Commanding(Conversion),
    /// Converting since the command completed at the given time
    Converting(Conversion, u64),
    /// ADC read queued on the bus
    Reading(Conversion),
}

/// Verify the 4-bit CRC stored in the low nibble of PROM word 7
///
/// Follows TE application note AN520.
fn prom_crc_ok(prom: &[u16; 8]) -> bool {
    let mut words = *prom;
    let stored = words[7] & 0x000F;
    words[7] &= 0xFF00;

    let mut rem: u16 = 0;
    for cnt in 0..16 {
        let word = words[cnt >> 1];
        rem ^= if cnt % 2 == 1 { word & 0x00FF } else { word >> 8 };
        for _ in 0..8 {
            rem = if rem & 0x8000 != 0 {
                (rem << 1) ^ 0x3000
            } else {
                rem << 1
            };
        }
    }
    (rem >> 12) & 0x000F == stored
}

/// First-order compensation with the datasheet's low-temperature
/// correction
fn compensate(prom: &[u16; 8], d1: u32, d2: u32) -> BaroReading {
    let c = |i: usize| i64::from(prom[i]);
    let d1 = i64::from(d1);
    let d2 = i64::from(d2);

    let dt = d2 - (c(5) << 8);
    let mut temp = 2000 + ((dt * c(6)) >> 23);
    let mut off = (c(2) << 16) + ((c(4) * dt) >> 7);
    let mut sens = (c(1) << 15) + ((c(3) * dt) >> 8);

    if temp < 2000 {
        let t2 = (dt * dt) >> 31;
        let cold = (temp - 2000) * (temp - 2000);
        let mut off2 = 5 * cold / 2;
        let mut sens2 = 5 * cold / 4;
        if temp < -1500 {
            let frigid = (temp + 1500) * (temp + 1500);
            off2 += 7 * frigid;
            sens2 += 11 * frigid / 2;
        }
        temp -= t2;
        off -= off2;
        sens -= sens2;
    }

    let pressure = (((d1 * sens) >> 21) - off) >> 15;
    BaroReading {
        pressure_pa: pressure as f32,
        temperature_c: temp as f32 / 100.0,
    }
}

/// MS5611 driver
pub struct Ms5611<B> {
    bus: B,
    prom: [u16; 8],
    phase: Phase,
    d2: u32,
    transfer: Transfer,
}

impl<B: I2cBus> Ms5611<B> {
    /// Driver for the part at [`ADDRESS`]
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            prom: [0; 8],
            phase: Phase::Idle(Conversion::Temperature),
            d2: 0,
            transfer: Transfer::new(ADDRESS),
        }
    }

    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        let address = self.transfer.address();
        self.bus.write(address, &[cmd::RESET])?;
        delay.delay_ms(RESET_MS);

        for (i, word) in self.prom.iter_mut().enumerate() {
            let mut raw = [0u8; 2];
            self.bus
                .write_read(address, &[cmd::PROM_READ + 2 * i as u8], &mut raw)?;
            *word = u16::from_be_bytes(raw);
        }

        if self.prom.iter().all(|w| *w == 0) || !prom_crc_ok(&self.prom) {
            return Err(DeviceError::BadCalibration);
        }
        Ok(())
    }
}

impl<B: I2cBus> SensorDevice for Ms5611<B> {
    type Reading = BaroReading;

    fn name(&self) -> &'static str {
        "ms5611"
    }

    fn probe(&mut self, delay: &mut impl DelayNs) -> bool {
        self.transfer.reset();
        self.phase = Phase::Idle(Conversion::Temperature);
        let result = self.init(delay);
        self.transfer.note(&result);
        if let Err(e) = result {
            debug!("ms5611: probe failed: {:?}", e);
        }
        result.is_ok()
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        let next = match self.phase {
            Phase::Idle(conv) => self
                .transfer
                .start(&mut self.bus, &[conv.command()], 0, now_us)
                .then_some(Phase::Commanding(conv)),
            Phase::Converting(conv, since) => (now_us.saturating_sub(since) >= CONVERSION_US
                && self
                    .transfer
                    .start(&mut self.bus, &[cmd::ADC_READ], 3, now_us))
            .then_some(Phase::Reading(conv)),
            Phase::Commanding(_) | Phase::Reading(_) => None,
        };
        let started = next.is_some();
        if let Some(phase) = next {
            self.phase = phase;
        }
        started
    }

    fn try_consume(&mut self) -> Option<Stamped<BaroReading>> {
        let mut raw = [0u8; 3];
        let was_pending = self.transfer.is_pending();
        let done = self.transfer.finish(&mut self.bus, &mut raw);

        let Some(at) = done else {
            if was_pending && !self.transfer.is_pending() {
                // Lost the transaction; restart the sequence
                self.phase = Phase::Idle(Conversion::Temperature);
            }
            return None;
        };

        match self.phase {
            Phase::Commanding(conv) => {
                self.phase = Phase::Converting(conv, at);
                None
            }
            Phase::Reading(Conversion::Temperature) => {
                self.d2 = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]);
                self.phase = Phase::Idle(Conversion::Pressure);
                None
            }
            Phase::Reading(Conversion::Pressure) => {
                let d1 = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]);
                self.phase = Phase::Idle(Conversion::Temperature);
                Some(Stamped::new(compensate(&self.prom, d1, self.d2), at))
            }
            Phase::Idle(_) | Phase::Converting(..) => None,
        }
    }

    fn present(&mut self) -> bool {
        self.transfer.acked()
    }
}
