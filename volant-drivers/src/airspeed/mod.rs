//! Differential-pressure (airspeed) sensors

pub mod ms4525;

pub use ms4525::Ms4525;
