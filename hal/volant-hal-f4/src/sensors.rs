//! Device variants bound to each sensor role on the F4 family

use volant_drivers::{Hmc5883l, Ms4525, Ms5611, Mpu6000};
use volant_hal::{SharedI2c, SharedSpi};

use crate::platform::F4Platform;

pub type InternalI2c<'a, P> = SharedI2c<'a, <P as F4Platform>::InternalI2c>;
pub type ExternalI2c<'a, P> = SharedI2c<'a, <P as F4Platform>::ExternalI2c>;
pub type ImuSpi<'a, P> = SharedSpi<'a, <P as F4Platform>::Spi>;

/// Buses the device variants are built on
pub struct SensorBus<'a, P: F4Platform> {
    pub internal: InternalI2c<'a, P>,
    pub external: ExternalI2c<'a, P>,
    pub spi: ImuSpi<'a, P>,
}

impl<'a, P: F4Platform> SensorBus<'a, P> {
    pub fn mpu6000(&self) -> Mpu6000<ImuSpi<'a, P>> {
        Mpu6000::new(self.spi)
    }

    pub fn hmc5883l(&self) -> Hmc5883l<InternalI2c<'a, P>> {
        Hmc5883l::new(self.internal)
    }

    pub fn ms5611(&self) -> Ms5611<InternalI2c<'a, P>> {
        Ms5611::new(self.internal)
    }

    pub fn ms4525(&self) -> Ms4525<ExternalI2c<'a, P>> {
        Ms4525::new(self.external)
    }
}
