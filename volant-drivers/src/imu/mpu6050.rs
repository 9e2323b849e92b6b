//! MPU-6050 over I2C

use embedded_hal::delay::DelayNs;
use volant_core::{DeviceError, ImuDevice, RawImu, SensorDevice, Stamped};
use volant_hal::I2cBus;

use super::{
    decode_burst, reg, ACC_1G, ACC_1G_HALF, BURST_LEN, CONFIG_SEQUENCE, DEVICE_RESET,
    GYRO_RAD_PER_LSB, RESET_MS, WHO_AM_I_VALUE,
};
use crate::bus::Transfer;

/// I2C address with AD0 tied low
pub const ADDRESS: u8 = 0x68;

/// MPU-6050 driver
pub struct Mpu6050<B> {
    bus: B,
    acc_1g: u16,
    transfer: Transfer,
}

impl<B: I2cBus> Mpu6050<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            acc_1g: ACC_1G,
            transfer: Transfer::new(ADDRESS),
        }
    }

    /// Whether the silicon revision has half accelerometer sensitivity
    ///
    /// The revision is spread over bit 0 of the three accel offset high
    /// bytes; parts with those bits clear report it in `PRODUCT_ID`
    /// instead.
    fn half_accel(&mut self) -> Result<bool, DeviceError> {
        let mut offs = [0u8; 6];
        self.bus.write_read(ADDRESS, &[reg::XA_OFFS_H], &mut offs)?;
        let rev = ((offs[5] & 0x01) << 2) | ((offs[3] & 0x01) << 1) | (offs[1] & 0x01);
        match rev {
            0 => {}
            1 => return Ok(true),
            2 => return Ok(false),
            _ => {
                warn!("mpu6050: unknown revision {}", rev);
                return Ok(false);
            }
        }

        let mut product = [0u8];
        self.bus.write_read(ADDRESS, &[reg::PRODUCT_ID], &mut product)?;
        match product[0] & 0x0F {
            0 => {
                warn!("mpu6050: no product revision");
                Ok(false)
            }
            4 => Ok(true),
            _ => Ok(false),
        }
    }

    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        let mut id = [0u8];
        self.bus.write_read(ADDRESS, &[reg::WHO_AM_I], &mut id)?;
        if id[0] & 0x7E != WHO_AM_I_VALUE {
            return Err(DeviceError::WrongDevice);
        }

        self.bus.write(ADDRESS, &[reg::PWR_MGMT_1, DEVICE_RESET])?;
        delay.delay_ms(RESET_MS);
        for (register, value) in CONFIG_SEQUENCE {
            self.bus.write(ADDRESS, &[register, value])?;
        }

        self.acc_1g = if self.half_accel()? { ACC_1G_HALF } else { ACC_1G };
        Ok(())
    }
}

impl<B: I2cBus> SensorDevice for Mpu6050<B> {
    type Reading = RawImu;

    fn name(&self) -> &'static str {
        "mpu6050"
    }

    fn probe(&mut self, delay: &mut impl DelayNs) -> bool {
        self.transfer.reset();
        let result = self.init(delay);
        self.transfer.note(&result);
        if let Err(e) = result {
            debug!("mpu6050: probe failed: {:?}", e);
        }
        result.is_ok()
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        self.transfer
            .start(&mut self.bus, &[reg::ACCEL_XOUT_H], BURST_LEN, now_us)
    }

    fn try_consume(&mut self) -> Option<Stamped<RawImu>> {
        let mut raw = [0u8; BURST_LEN];
        let at = self.transfer.finish(&mut self.bus, &mut raw)?;
        Some(Stamped::new(decode_burst(&raw), at))
    }

    fn present(&mut self) -> bool {
        self.transfer.acked()
    }
}

impl<B: I2cBus> ImuDevice for Mpu6050<B> {
    fn accel_lsb_per_g(&self) -> u16 {
        self.acc_1g
    }

    fn gyro_rad_per_lsb(&self) -> f32 {
        GYRO_RAD_PER_LSB
    }

    fn temperature_c(&self, raw: i16) -> f32 {
        super::temperature_c(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use volant_core::ClockDelay;
    use volant_hal::mock::{MockClock, MockI2c, MockI2cDevice};
    use volant_hal::{Clock, SharedI2c};

    fn device() -> MockI2cDevice {
        MockI2cDevice::new()
            .with_registers(reg::WHO_AM_I, &[WHO_AM_I_VALUE])
            .with_registers(reg::PRODUCT_ID, &[0x05])
    }

    #[test]
    fn test_probe_resets_and_configures() {
        let bus = RefCell::new(MockI2c::new());
        bus.borrow_mut().attach(ADDRESS, device());
        let mut clock = MockClock::new();
        let mut imu = Mpu6050::new(SharedI2c::new(&bus));

        assert!(imu.probe(&mut ClockDelay::new(&mut clock)));
        assert!(clock.millis() >= RESET_MS);
        assert_eq!(imu.accel_lsb_per_g(), ACC_1G);

        let bus = bus.borrow();
        let dev = bus.device(ADDRESS).unwrap();
        assert!(dev.writes().contains(&vec![reg::PWR_MGMT_1, DEVICE_RESET]));
        for (register, value) in CONFIG_SEQUENCE {
            assert_eq!(dev.register(register), value);
        }
    }

    #[test]
    fn test_half_sensitivity_from_offset_bits() {
        let bus = RefCell::new(MockI2c::new());
        bus.borrow_mut().attach(
            ADDRESS,
            device().with_registers(reg::XA_OFFS_H, &[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]),
        );
        let mut clock = MockClock::new();
        let mut imu = Mpu6050::new(SharedI2c::new(&bus));

        assert!(imu.probe(&mut ClockDelay::new(&mut clock)));
        assert_eq!(imu.accel_lsb_per_g(), ACC_1G_HALF);
    }

    #[test]
    fn test_half_sensitivity_from_product_id() {
        let bus = RefCell::new(MockI2c::new());
        bus.borrow_mut()
            .attach(ADDRESS, device().with_registers(reg::PRODUCT_ID, &[0x04]));
        let mut clock = MockClock::new();
        let mut imu = Mpu6050::new(SharedI2c::new(&bus));

        assert!(imu.probe(&mut ClockDelay::new(&mut clock)));
        assert_eq!(imu.accel_lsb_per_g(), ACC_1G_HALF);
    }

    #[test]
    fn test_burst_read() {
        let bus = RefCell::new(MockI2c::new());
        bus.borrow_mut().attach(ADDRESS, device());
        let mut clock = MockClock::new();
        let mut imu = Mpu6050::new(SharedI2c::new(&bus));
        assert!(imu.probe(&mut ClockDelay::new(&mut clock)));

        bus.borrow_mut()
            .device_mut(ADDRESS)
            .unwrap()
            .set_registers(reg::ACCEL_XOUT_H, &[0, 0, 0, 0, 0x10, 0, 0, 0, 0, 1, 0, 2, 0, 3]);
        imu.kick_update(4_000);
        let sample = imu.try_consume().unwrap();
        assert_eq!(sample.time_us, 4_000);
        assert_eq!(sample.value.accel, [0, 0, 4096]);
        assert_eq!(sample.value.gyro, [1, 2, 3]);
    }
}
