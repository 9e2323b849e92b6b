//! Barometers

pub mod bmp280;
pub mod ms5611;

pub use bmp280::Bmp280;
pub use ms5611::Ms5611;
