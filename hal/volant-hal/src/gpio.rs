//! GPIO pin abstractions
//!
//! Status LEDs use [`OutputPin`]; the IMU data-ready interrupt is exposed
//! through [`DataReadyLine`].

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// External interrupt line latched by an edge
///
/// The interrupt handler records the microsecond timestamp of the most
/// recent rising edge. The main loop collects it with [`take_edge`].
///
/// [`take_edge`]: DataReadyLine::take_edge
pub trait DataReadyLine {
    /// Return and clear the timestamp of the latest unserviced edge
    fn take_edge(&mut self) -> Option<u64>;
}
