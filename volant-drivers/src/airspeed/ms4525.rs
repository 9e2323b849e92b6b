//! TE MS4525DO differential pressure sensor (I2C)
//!
//! Assumes the ±1 psi, output type A (10 % to 90 %) part usually fitted to
//! pitot tubes. A plain 4-byte read returns status, bridge and temperature
//! data; there are no registers.

use embedded_hal::delay::DelayNs;
use volant_core::{DeviceError, DiffPressureReading, SensorDevice, Stamped};
use volant_hal::I2cBus;

use crate::bus::Transfer;

/// Fixed I2C address (interface type I)
pub const ADDRESS: u8 = 0x28;

/// Full-scale counts of the 14-bit bridge output
const BRIDGE_FULL_SCALE: f32 = 16383.0;
const P_MIN_PSI: f32 = -1.0;
const P_MAX_PSI: f32 = 1.0;
const PA_PER_PSI: f32 = 6894.757;

/// Status field of the first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Normal,
    Reserved,
    Stale,
    Fault,
}

impl Status {
    fn from_byte(b: u8) -> Self {
        match b >> 6 {
            0 => Status::Normal,
            1 => Status::Reserved,
            2 => Status::Stale,
            _ => Status::Fault,
        }
    }
}

fn decode(raw: &[u8; 4]) -> Result<Option<DiffPressureReading>, DeviceError> {
    match Status::from_byte(raw[0]) {
        Status::Normal => {}
        Status::Stale | Status::Reserved => return Ok(None),
        Status::Fault => return Err(DeviceError::Fault),
    }

    let bridge = (u16::from(raw[0] & 0x3F) << 8) | u16::from(raw[1]);
    let temp = (u16::from(raw[2]) << 3) | u16::from(raw[3] >> 5);

    let span = 0.8 * BRIDGE_FULL_SCALE;
    let psi = (f32::from(bridge) - 0.1 * BRIDGE_FULL_SCALE) * (P_MAX_PSI - P_MIN_PSI) / span
        + P_MIN_PSI;
    Ok(Some(DiffPressureReading {
        pressure_pa: psi * PA_PER_PSI,
        temperature_c: f32::from(temp) * 200.0 / 2047.0 - 50.0,
    }))
}

/// MS4525DO driver
pub struct Ms4525<B> {
    bus: B,
    transfer: Transfer,
}

impl<B: I2cBus> Ms4525<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            transfer: Transfer::new(ADDRESS),
        }
    }

    fn init(&mut self) -> Result<(), DeviceError> {
        let mut raw = [0u8; 4];
        self.bus.read(ADDRESS, &mut raw)?;
        decode(&raw).map(|_| ())
    }
}

impl<B: I2cBus> SensorDevice for Ms4525<B> {
    type Reading = DiffPressureReading;

    fn name(&self) -> &'static str {
        "ms4525"
    }

    fn probe(&mut self, _delay: &mut impl DelayNs) -> bool {
        self.transfer.reset();
        let result = self.init();
        self.transfer.note(&result);
        result.is_ok()
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        self.transfer.start(&mut self.bus, &[], 4, now_us)
    }

    fn try_consume(&mut self) -> Option<Stamped<DiffPressureReading>> {
        let mut raw = [0u8; 4];
        let at = self.transfer.finish(&mut self.bus, &mut raw)?;
        match decode(&raw) {
            Ok(reading) => reading.map(|r| Stamped::new(r, at)),
            Err(e) => {
                warn!("ms4525: {:?}", e);
                None
            }
        }
    }

    fn present(&mut self) -> bool {
        self.transfer.acked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use volant_core::ClockDelay;
    use volant_hal::mock::{MockClock, MockI2c, MockI2cDevice};
    use volant_hal::SharedI2c;

    /// Bridge 11468 (about +0.5 psi), temperature count 1535 (about 100 °C)
    const HALF_PSI: [u8; 4] = [44, 204, 191, 224];

    #[test]
    fn test_decode() {
        let reading = decode(&HALF_PSI).unwrap().unwrap();
        assert!((reading.pressure_pa - 3447.27).abs() < 0.05);
        assert!((reading.temperature_c - 99.976).abs() < 0.01);
    }

    #[test]
    fn test_status_bits() {
        let mut stale = HALF_PSI;
        stale[0] |= 0x80;
        assert_eq!(decode(&stale), Ok(None));

        let mut fault = HALF_PSI;
        fault[0] |= 0xC0;
        assert_eq!(decode(&fault), Err(DeviceError::Fault));
    }

    #[test]
    fn test_zero_differential_at_mid_scale() {
        // 8191.5 counts is the zero point; 8192 is a hair above it
        let reading = decode(&[0x20, 0x00, 0, 0]).unwrap().unwrap();
        assert!(reading.pressure_pa.abs() < 1.0);
        assert_eq!(reading.temperature_c, -50.0);
    }

    #[test]
    fn test_async_read() {
        let bus = RefCell::new(MockI2c::new());
        bus.borrow_mut()
            .attach(ADDRESS, MockI2cDevice::new().with_registers(0, &HALF_PSI));
        let mut clock = MockClock::new();
        let mut airspeed = Ms4525::new(SharedI2c::new(&bus));
        assert!(airspeed.probe(&mut ClockDelay::new(&mut clock)));

        airspeed.kick_update(3_000);
        let reading = airspeed.try_consume().unwrap();
        assert_eq!(reading.time_us, 3_000);
        assert!(airspeed.present());
    }

    #[test]
    fn test_missing_part() {
        let bus = RefCell::new(MockI2c::new());
        let mut clock = MockClock::new();
        let mut airspeed = Ms4525::new(SharedI2c::new(&bus));
        assert!(!airspeed.probe(&mut ClockDelay::new(&mut clock)));
    }
}
