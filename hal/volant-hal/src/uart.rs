//! Serial byte-stream abstractions
//!
//! Covers both hardware UARTs and USB virtual COM ports. Framing above the
//! byte stream belongs to the caller.

/// Bidirectional byte-stream transport
pub trait SerialPort {
    /// Open the port
    ///
    /// Transports without a physical line rate (USB VCP) ignore `baudrate`.
    fn open(&mut self, baudrate: u32);

    /// Queue bytes for transmission
    ///
    /// Bytes that do not fit in the transmit buffer are dropped.
    fn write(&mut self, data: &[u8]);

    /// Number of received bytes waiting to be read
    fn bytes_available(&self) -> u16;

    /// Pop one received byte, or `None` if the receive buffer is empty
    fn read_byte(&mut self) -> Option<u8>;

    /// Push any buffered transmit data out to the wire
    fn flush(&mut self);
}
