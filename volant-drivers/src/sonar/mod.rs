//! Rangefinders

pub mod mb1242;
pub mod pwm;

pub use mb1242::Mb1242;
pub use pwm::PwmSonar;
