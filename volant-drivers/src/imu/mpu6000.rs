//! MPU-6000 over SPI
//!
//! SPI has no acknowledge, so a missing part reads as zeros. Probing
//! relies on `WHO_AM_I`; afterwards a dead part shows up as all-zero
//! samples, which the board rejects.

use embedded_hal::delay::DelayNs;
use volant_core::{DeviceError, ImuDevice, RawImu, SensorDevice, Stamped};
use volant_hal::SpiBus;

use super::{
    decode_burst, reg, ACC_1G, BURST_LEN, CONFIG_SEQUENCE, DEVICE_RESET, GYRO_RAD_PER_LSB,
    RESET_MS, WHO_AM_I_VALUE,
};

/// Read flag on the register address byte
const READ: u8 = 0x80;

/// `USER_CTRL`: disable the I2C slave interface
const I2C_IF_DIS: u8 = 0x10;

/// MPU-6000 driver
pub struct Mpu6000<S> {
    spi: S,
    pending: Option<u64>,
    ok: bool,
}

impl<S: SpiBus> Mpu6000<S> {
    pub fn new(spi: S) -> Self {
        Self {
            spi,
            pending: None,
            ok: false,
        }
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), DeviceError> {
        self.spi.transfer_in_place(&mut [register, value])?;
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, DeviceError> {
        let mut buf = [register | READ, 0];
        self.spi.transfer_in_place(&mut buf)?;
        Ok(buf[1])
    }

    fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        if self.read_register(reg::WHO_AM_I)? & 0x7E != WHO_AM_I_VALUE {
            return Err(DeviceError::WrongDevice);
        }

        self.write_register(reg::PWR_MGMT_1, DEVICE_RESET)?;
        delay.delay_ms(RESET_MS);
        self.write_register(reg::USER_CTRL, I2C_IF_DIS)?;
        for (register, value) in CONFIG_SEQUENCE {
            self.write_register(register, value)?;
        }
        Ok(())
    }
}

impl<S: SpiBus> SensorDevice for Mpu6000<S> {
    type Reading = RawImu;

    fn name(&self) -> &'static str {
        "mpu6000"
    }

    fn probe(&mut self, delay: &mut impl DelayNs) -> bool {
        self.pending = None;
        let result = self.init(delay);
        self.ok = result.is_ok();
        if let Err(e) = result {
            debug!("mpu6000: probe failed: {:?}", e);
        }
        self.ok
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let mut frame = [0u8; BURST_LEN + 1];
        frame[0] = reg::ACCEL_XOUT_H | READ;
        match self.spi.start_transfer(&frame) {
            Ok(()) => {
                self.pending = Some(now_us);
                true
            }
            Err(volant_hal::BusError::Busy) => false,
            Err(_) => {
                self.ok = false;
                false
            }
        }
    }

    fn try_consume(&mut self) -> Option<Stamped<RawImu>> {
        let started = self.pending?;
        let mut frame = [0u8; BURST_LEN + 1];
        match self.spi.poll_transfer(&mut frame) {
            Ok(()) => {
                self.pending = None;
                self.ok = true;
                let mut burst = [0u8; BURST_LEN];
                burst.copy_from_slice(&frame[1..]);
                Some(Stamped::new(decode_burst(&burst), started))
            }
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                self.pending = None;
                self.ok = false;
                None
            }
        }
    }

    fn present(&mut self) -> bool {
        self.ok
    }
}

impl<S: SpiBus> ImuDevice for Mpu6000<S> {
    fn accel_lsb_per_g(&self) -> u16 {
        ACC_1G
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
    use volant_core::ClockDelay;
    use volant_hal::mock::{MockClock, MockSpi};

    fn part() -> MockSpi {
        let spi = MockSpi::new();
        spi.set_registers(reg::WHO_AM_I, &[WHO_AM_I_VALUE]);
        spi
    }

    #[test]
    fn test_probe_disables_i2c_and_configures() {
        let spi = part();
        let mut clock = MockClock::new();
        let mut imu = Mpu6000::new(spi.clone());

        assert!(imu.probe(&mut ClockDelay::new(&mut clock)));
        assert_eq!(spi.register(reg::USER_CTRL), I2C_IF_DIS);
        assert_eq!(spi.register(reg::ACCEL_CONFIG), 0x10);
        assert_eq!(imu.accel_lsb_per_g(), 4096);
    }

    #[test]
    fn test_silent_bus_fails_probe() {
        let spi = part();
        spi.set_responding(false);
        let mut clock = MockClock::new();
        let mut imu = Mpu6000::new(spi);

        assert!(!imu.probe(&mut ClockDelay::new(&mut clock)));
        assert!(!imu.present());
    }

    #[test]
    fn test_queued_burst() {
        let spi = part();
        let mut clock = MockClock::new();
        let mut imu = Mpu6000::new(spi.clone());
        assert!(imu.probe(&mut ClockDelay::new(&mut clock)));

        spi.set_registers(reg::ACCEL_XOUT_H, &[0xF0, 0, 0, 0, 0x10, 0, 0, 0, 0, 0, 0, 0, 0, 7]);
        spi.set_auto_complete(false);
        imu.kick_update(9_000);
        imu.kick_update(9_500);
        assert_eq!(imu.try_consume(), None);

        spi.complete();
        let sample = imu.try_consume().unwrap();
        assert_eq!(sample.time_us, 9_000);
        assert_eq!(sample.value.accel, [-4096, 0, 4096]);
        assert_eq!(sample.value.gyro, [0, 0, 7]);
    }
}
