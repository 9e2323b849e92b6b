//! RC receiver abstraction

/// Receiver protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RcInputKind {
    /// Pulse-position modulation on a timer input
    #[default]
    Ppm,
    /// Futaba SBUS on an inverted UART
    Sbus,
}

impl RcInputKind {
    /// Lowercase protocol name for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            RcInputKind::Ppm => "ppm",
            RcInputKind::Sbus => "sbus",
        }
    }
}

/// Decoded RC receiver
///
/// Implementations decode frames in interrupt context and hold the latest
/// one until polled.
pub trait RcReceiver {
    /// Start decoding the given protocol
    fn start(&mut self, kind: RcInputKind);

    /// Copy out a frame received since the last poll
    ///
    /// Channel values are pulse widths in microseconds. Returns `false` when
    /// no new frame arrived, leaving `channels` untouched.
    fn poll(&mut self, channels: &mut [u16]) -> bool;
}
