//! Honeywell HMC5883L magnetometer (I2C)

use embedded_hal::delay::DelayNs;
use volant_core::{DeviceError, SensorDevice, Stamped};
use volant_hal::I2cBus;

use crate::bus::Transfer;

/// Fixed I2C address
pub const ADDRESS: u8 = 0x1E;

/// Contents of the three identification registers
pub const IDENTIFICATION: [u8; 3] = *b"H43";

/// HMC5883L register addresses
pub mod reg {
    pub const CONFIG_A: u8 = 0x00;
    pub const CONFIG_B: u8 = 0x01;
    pub const MODE: u8 = 0x02;
    /// X MSB; data continues as X, Z, Y
    pub const DATA: u8 = 0x03;
    pub const ID_A: u8 = 0x0A;
}

/// 8-sample averaging, 15 Hz output, normal bias
const CONFIG_A_VALUE: u8 = 0x70;
/// Gain 1090 LSB/gauss (±1.3 Ga)
const CONFIG_B_VALUE: u8 = 0x20;
/// Continuous measurement
const MODE_CONTINUOUS: u8 = 0x00;

/// Counts per gauss at the configured gain
const LSB_PER_GAUSS: f32 = 1090.0;

/// Output value flagging an ADC overflow on that axis
const OVERFLOW: i16 = -4096;

/// HMC5883L driver; readings are `[x, y, z]` in gauss
pub struct Hmc5883l<B> {
    bus: B,
    transfer: Transfer,
}

impl<B: I2cBus> Hmc5883l<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            transfer: Transfer::new(ADDRESS),
        }
    }

    fn init(&mut self) -> Result<(), DeviceError> {
        let mut id = [0u8; 3];
        self.bus.write_read(ADDRESS, &[reg::ID_A], &mut id)?;
        if id != IDENTIFICATION {
            return Err(DeviceError::WrongDevice);
        }

        self.bus.write(ADDRESS, &[reg::CONFIG_A, CONFIG_A_VALUE])?;
        self.bus.write(ADDRESS, &[reg::CONFIG_B, CONFIG_B_VALUE])?;
        self.bus.write(ADDRESS, &[reg::MODE, MODE_CONTINUOUS])?;
        Ok(())
    }
}

/// Decode the X, Z, Y register block into `[x, y, z]` counts
fn decode(raw: &[u8; 6]) -> [i16; 3] {
    let x = i16::from_be_bytes([raw[0], raw[1]]);
    let z = i16::from_be_bytes([raw[2], raw[3]]);
    let y = i16::from_be_bytes([raw[4], raw[5]]);
    [x, y, z]
}

impl<B: I2cBus> SensorDevice for Hmc5883l<B> {
    type Reading = [f32; 3];

    fn name(&self) -> &'static str {
        "hmc5883l"
    }

    fn probe(&mut self, _delay: &mut impl DelayNs) -> bool {
        self.transfer.reset();
        let result = self.init();
        self.transfer.note(&result);
        result.is_ok()
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        self.transfer.start(&mut self.bus, &[reg::DATA], 6, now_us)
    }

    fn try_consume(&mut self) -> Option<Stamped<[f32; 3]>> {
        let mut raw = [0u8; 6];
        let at = self.transfer.finish(&mut self.bus, &mut raw)?;
        let counts = decode(&raw);
        if counts.contains(&OVERFLOW) {
            // Saturated; keep the previous reading
            return None;
        }
        Some(Stamped::new(counts.map(|c| f32::from(c) / LSB_PER_GAUSS), at))
    }

    fn present(&mut self) -> bool {
        self.transfer.acked()
    }
}
