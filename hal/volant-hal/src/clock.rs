//! Time base and system control abstractions

/// Monotonic time source
///
/// Both counters start at zero on power-up.
pub trait Clock {
    /// Milliseconds since boot
    ///
    /// Wraps around after `u32::MAX` ms (about 49.7 days). Callers comparing
    /// timestamps must use `wrapping_sub`.
    fn millis(&self) -> u32;

    /// Microseconds since boot
    ///
    /// 64 bits wide, so wrap-around is not a practical concern.
    fn micros(&self) -> u64;

    /// Busy-wait for the given number of milliseconds
    ///
    /// Only legal during bring-up or outside the control loop.
    fn delay_ms(&mut self, ms: u32);
}

/// Vendor system bring-up and reset routines
pub trait SystemControl {
    /// Configure clocks and core peripherals
    ///
    /// Called exactly once, before anything else touches the hardware.
    fn init(&mut self);

    /// Restart the MCU, optionally into the bootloader
    fn reset(&mut self, bootloader: bool) -> !;
}
