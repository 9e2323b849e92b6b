//! Device variants bound to each sensor role on the F1 family

use embedded_hal::delay::DelayNs;
use volant_core::{BaroReading, SensorDevice, Stamped};
use volant_drivers::{Bmp280, Hmc5883l, Mb1242, Ms4525, Ms5611, Mpu6050, PwmSonar};
use volant_hal::SharedI2c;

use crate::platform::F1Platform;

/// Handle every I2C sensor driver holds
pub type I2c<'a, P> = SharedI2c<'a, <P as F1Platform>::I2c>;

/// What a device variant needs to be built
pub struct SensorBus<'a, P: F1Platform> {
    pub i2c: I2c<'a, P>,
    pub capture: &'a P::Capture,
}

impl<'a, P: F1Platform> SensorBus<'a, P> {
    pub fn mpu6050(&self) -> Mpu6050<I2c<'a, P>> {
        Mpu6050::new(self.i2c)
    }

    pub fn hmc5883l(&self) -> Hmc5883l<I2c<'a, P>> {
        Hmc5883l::new(self.i2c)
    }

    pub fn ms4525(&self) -> Ms4525<I2c<'a, P>> {
        Ms4525::new(self.i2c)
    }
}

/// Barometer variants
pub enum F1Baro<'a, P: F1Platform> {
    Bmp280(Bmp280<I2c<'a, P>>),
    Ms5611(Ms5611<I2c<'a, P>>),
}

impl<'a, P: F1Platform> F1Baro<'a, P> {
    pub fn bmp280(bus: &SensorBus<'a, P>) -> Self {
        F1Baro::Bmp280(Bmp280::new(bus.i2c))
    }

    pub fn ms5611(bus: &SensorBus<'a, P>) -> Self {
        F1Baro::Ms5611(Ms5611::new(bus.i2c))
    }
}

impl<P: F1Platform> SensorDevice for F1Baro<'_, P> {
    type Reading = BaroReading;

    fn name(&self) -> &'static str {
        match self {
            F1Baro::Bmp280(d) => d.name(),
            F1Baro::Ms5611(d) => d.name(),
        }
    }

    fn probe(&mut self, delay: &mut impl DelayNs) -> bool {
        match self {
            F1Baro::Bmp280(d) => d.probe(delay),
            F1Baro::Ms5611(d) => d.probe(delay),
        }
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        match self {
            F1Baro::Bmp280(d) => d.kick_update(now_us),
            F1Baro::Ms5611(d) => d.kick_update(now_us),
        }
    }

    fn try_consume(&mut self) -> Option<Stamped<BaroReading>> {
        match self {
            F1Baro::Bmp280(d) => d.try_consume(),
            F1Baro::Ms5611(d) => d.try_consume(),
        }
    }

    fn present(&mut self) -> bool {
        match self {
            F1Baro::Bmp280(d) => d.present(),
            F1Baro::Ms5611(d) => d.present(),
        }
    }
}

/// Rangefinder variants
pub enum F1Sonar<'a, P: F1Platform> {
    Mb1242(Mb1242<I2c<'a, P>>),
    Pwm(PwmSonar<'a, P::Capture>),
}

impl<'a, P: F1Platform> F1Sonar<'a, P> {
    pub fn mb1242(bus: &SensorBus<'a, P>) -> Self {
        F1Sonar::Mb1242(Mb1242::new(bus.i2c))
    }

    pub fn pwm(bus: &SensorBus<'a, P>) -> Self {
        F1Sonar::Pwm(PwmSonar::new(bus.capture))
    }
}

impl<P: F1Platform> SensorDevice for F1Sonar<'_, P> {
    type Reading = f32;

    fn name(&self) -> &'static str {
        match self {
            F1Sonar::Mb1242(d) => d.name(),
            F1Sonar::Pwm(d) => d.name(),
        }
    }

    fn probe(&mut self, delay: &mut impl DelayNs) -> bool {
        match self {
            F1Sonar::Mb1242(d) => d.probe(delay),
            F1Sonar::Pwm(d) => d.probe(delay),
        }
    }

    fn kick_update(&mut self, now_us: u64) -> bool {
        match self {
            F1Sonar::Mb1242(d) => d.kick_update(now_us),
            F1Sonar::Pwm(d) => d.kick_update(now_us),
        }
    }

    fn try_consume(&mut self) -> Option<Stamped<f32>> {
        match self {
            F1Sonar::Mb1242(d) => d.try_consume(),
            F1Sonar::Pwm(d) => d.try_consume(),
        }
    }

    fn present(&mut self) -> bool {
        match self {
            F1Sonar::Mb1242(d) => d.present(),
            F1Sonar::Pwm(d) => d.present(),
        }
    }
}
