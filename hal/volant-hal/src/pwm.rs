//! Timer-driven PWM output and pulse capture

/// Multi-channel servo/ESC PWM output
pub trait PwmOutput {
    /// Configure the timers for the given refresh rate and drive every
    /// channel to `idle_us`
    fn configure(&mut self, refresh_rate_hz: u32, idle_us: u16);

    /// Set the pulse width of one channel in microseconds
    ///
    /// Writes to channels at or beyond [`channel_count`] are ignored.
    ///
    /// [`channel_count`]: PwmOutput::channel_count
    fn write_us(&mut self, channel: u8, pulse_us: u16);

    /// Number of output channels
    fn channel_count(&self) -> u8;
}

/// Input-capture channel measuring echo pulse widths
///
/// Used by PWM-output rangefinders, whose echo pulse length is proportional
/// to distance.
pub trait PulseCapture {
    /// Latest captured pulse as `(width_us, captured_at_us)`
    fn last_pulse(&self) -> Option<(u32, u64)>;
}
