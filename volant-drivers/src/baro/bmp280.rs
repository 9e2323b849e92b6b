//! Bosch BMP280 barometer (I2C)
//!
//! Runs in normal mode, so the part converts continuously and a read is a
//! single 6-byte burst of the latest pressure and temperature.

use core::ops::RangeInclusive;

use embedded_hal::delay::DelayNs;
use volant_core::{BaroReading, DeviceError, SensorDevice, Stamped};
use volant_hal::I2cBus;

use crate::bus::Transfer;

/// I2C address with SDO tied low
pub const ADDRESS: u8 = 0x76;

/// Value of the chip-id register
pub const CHIP_ID: u8 = 0x58;

/// BMP280 register addresses
pub mod reg {
    /// Chip identification
    pub const ID: u8 = 0xD0;
    /// First trimming parameter (dig_T1 LSB)
    pub const CALIB: u8 = 0x88;
    /// Oversampling and power mode
    pub const CTRL_MEAS: u8 = 0xF4;
    /// Standby time and IIR filter
    pub const CONFIG: u8 = 0xF5;
    /// First data register (press_msb)
    pub const DATA: u8 = 0xF7;
}

/// IIR filter coefficient 16
const CONFIG_VALUE: u8 = 0x10;
/// Temperature ×1, pressure ×16, normal mode
const CTRL_MEAS_VALUE: u8 = 0x2F;

/// Factory trimming parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Trim {
    t1: u16,
    t2: i16,
    t3: i16,
    p1: u16,
    p2: i16,
    p3: i16,
    p4: i16,
    p5: i16,
    p6: i16,
    p7: i16,
    p8: i16,
    p9: i16,
}

impl Trim {
    fn from_bytes(b: &[u8; 24]) -> Self {
        let u = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([b[i], b[i + 1]]);
        Self {
            t1: u(0),
            t2: s(2),
            t3: s(4),
            p1: u(6),
            p2: s(8),
            p3: s(10),
            p4: s(12),
            p5: s(14),
            p6: s(16),
            p7: s(18),
            p8: s(20),
            p9: s(22),
        }
    }

    /// Returns `(t_fine, temperature in 0.01 °C)`
    fn temperature(&self, adc_t: i32) -> (i64, i64) {
        let adc_t = i64::from(adc_t);
        let t1 = i64::from(self.t1);
        let var1 = (((adc_t >> 3) - (t1 << 1)) * i64::from(self.t2)) >> 11;
        let delta = (adc_t >> 4) - t1;
        let var2 = (((delta * delta) >> 12) * i64::from(self.t3)) >> 14;
        let t_fine = var1 + var2;
        (t_fine, (t_fine * 5 + 128) >> 8)
    }

    /// Pressure in Pa as Q24.8, or `None` for an unusable trim set
    ///
    /// Runs in `i128`; with `t_fine` inside [`T_FINE_RANGE`] nothing here
    /// can overflow.
    fn pressure(&self, adc_p: i32, t_fine: i64) -> Option<i64> {
        let mut var1 = i128::from(t_fine) - 128_000;
        let mut var2 = var1 * var1 * i128::from(self.p6);
        var2 += (var1 * i128::from(self.p5)) << 17;
        var2 += i128::from(self.p4) << 35;
        var1 = ((var1 * var1 * i128::from(self.p3)) >> 8) + ((var1 * i128::from(self.p2)) << 12);
        var1 = (((1i128 << 47) + var1) * i128::from(self.p1)) >> 33;
        if var1 == 0 {
            return None;
        }

        let mut p = 1_048_576 - i128::from(adc_p);
        p = (((p << 31) - var2) * 3125) / var1;
        let var1 = (i128::from(self.p9) * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (i128::from(self.p8) * p) >> 19;
        i64::try_from(((p + var1 + var2) >> 8) + (i128::from(self.p7) << 4)).ok()
    }

    fn compensate(&self, adc_p: i32, adc_t: i32) -> Option<BaroReading> {
        let (t_fine, centi_c) = self.temperature(adc_t);
        if !T_FINE_RANGE.contains(&t_fine) {
            // Corrupted sample
            return None;
        }
        let q24_8 = self.pressure(adc_p, t_fine)?;
        Some(BaroReading {
            pressure_pa: q24_8 as f32 / 256.0,
            temperature_c: centi_c as f32 / 100.0,
        })
    }
}

/// `t_fine` (°C × 5120) from -50 °C to 100 °C, beyond the rated range
const T_FINE_RANGE: RangeInclusive<i64> = -256_000..=512_000;

/// 20-bit ADC value from an msb/lsb/xlsb triple
fn adc20(b: &[u8]) -> i32 {
    (i32::from(b[0]) << 12) | (i32::from(b[1]) << 4) | (i32::from(b[2]) >> 4)
}

/// BMP280 driver
pub struct Bmp280<B> {
    bus: B,
    trim: Trim,
    transfer: Transfer,
}

impl<B: I2cBus> Bmp280<B> {
    /// Driver for the part at [`ADDRESS`]
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, ADDRESS)
    }

    /// Driver for a part strapped to another address
    pub fn with_address(bus: B, address: u8) -> Self {
        Self {
            bus,
            trim: Trim::default(),
            transfer: Transfer::new(address),
        }
    }

    fn init(&mut self) -> Result<(), DeviceError> {
        let address = self.transfer.address();
        let mut id = [0u8];
        self.bus.write_read(address, &[reg::ID], &mut id)?;
        if id[0] != CHIP_ID {
            return Err(DeviceError::WrongDevice);
        }

        let mut calib = [0u8; 24];
        self.bus.write_read(address, &[reg::CALIB], &mut calib)?;
        self.trim = Trim::from_bytes(&calib);
        if self.trim.p1 == 0 {
            return Err(DeviceError::BadCalibration);
        }

        self.bus.write(address, &[reg::CONFIG, CONFIG_VALUE])?;
        self.bus.write(address, &[reg::CTRL_MEAS, CTRL_MEAS_VALUE])?;
        Ok(())
    }
}

impl<B: I2cBus> SensorDevice for Bmp280<B> {
    type Reading = BaroReading;

    fn name(&self) -> &'static str {
        "bmp280"
    }

    fn probe(&mut self, _delay: &mut impl DelayNs) -> bool {
        self.transfer.reset();
        let result = self.init();
        self.transfer.note(&result);
        if let Err(e) = result {
            debug!("bmp280: probe failed: {:?}", e);
        }
        result.is_ok()
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        self.transfer.start(&mut self.bus, &[reg::DATA], 6, now_us)
    }

    fn try_consume(&mut self) -> Option<Stamped<BaroReading>> {
        let mut raw = [0u8; 6];
        let at = self.transfer.finish(&mut self.bus, &mut raw)?;
        let reading = self.trim.compensate(adc20(&raw[0..3]), adc20(&raw[3..6]))?;
        Some(Stamped::new(reading, at))
    }

    fn present(&mut self) -> bool {
        self.transfer.acked()
    }
}
