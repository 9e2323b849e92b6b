//! Async sensor channel
//!
//! Every sensor is driven through a split protocol: a non-blocking
//! "kick" that starts a bus transaction, and a later "consume" that picks
//! up whatever completed. Completed readings land in a [`ReadingSlot`],
//! the only state shared between the producer (transaction completion,
//! possibly in interrupt context) and the control loop.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;

/// A reading tagged with its acquisition time
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stamped<T> {
    /// Decoded value
    pub value: T,
    /// Microsecond timestamp of the kick that produced it
    pub time_us: u64,
}

impl<T> Stamped<T> {
    /// Tag `value` with `time_us`
    pub const fn new(value: T, time_us: u64) -> Self {
        Self { value, time_us }
    }
}

#[derive(Clone, Copy)]
struct SlotState<T> {
    latest: Option<Stamped<T>>,
    fresh: bool,
}

/// Single-producer/single-consumer cell holding the latest reading
///
/// The reading and its freshness flag are replaced together inside a
/// critical section, so a reader never sees a half-written update. A
/// `ReadingSlot` in a `static` may be published to from an interrupt
/// handler.
pub struct ReadingSlot<T> {
    state: Mutex<CriticalSectionRawMutex, Cell<SlotState<T>>>,
}

impl<T: Copy> Default for ReadingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> ReadingSlot<T> {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(SlotState {
                latest: None,
                fresh: false,
            })),
        }
    }

    /// Replace the held reading and mark it fresh
    pub fn publish(&self, reading: Stamped<T>) {
        self.state.lock(|s| {
            s.set(SlotState {
                latest: Some(reading),
                fresh: true,
            })
        });
    }

    /// Latest reading, fresh or not
    pub fn latest(&self) -> Option<Stamped<T>> {
        self.state.lock(|s| s.get().latest)
    }

    /// Whether a reading arrived since the last [`take`](Self::take)
    pub fn has_fresh(&self) -> bool {
        self.state.lock(|s| s.get().fresh)
    }

    /// Latest reading, clearing the fresh flag
    ///
    /// The reading itself stays in place so later calls still see it.
    pub fn take(&self) -> Option<Stamped<T>> {
        self.state.lock(|s| {
            let state = s.get();
            s.set(SlotState {
                fresh: false,
                ..state
            });
            state.latest
        })
    }

    /// Forget the held reading
    pub fn clear(&self) {
        self.state.lock(|s| {
            s.set(SlotState {
                latest: None,
                fresh: false,
            })
        });
    }
}

/// Capability set of one device variant filling a sensor role
pub trait SensorDevice {
    /// Decoded reading type
    type Reading: Copy;

    /// Short part name for logs and probe reports
    fn name(&self) -> &'static str;

    /// Run the identification handshake and configure the part
    ///
    /// Runs at boot or during recovery only, so it may block on the bus
    /// and on `delay`.
    fn probe(&mut self, delay: &mut impl DelayNs) -> bool;

    /// Start the next transaction if none is outstanding
    ///
    /// Never blocks. A kick while a transaction is outstanding does
    /// nothing. Returns whether the kick was taken up.
    fn kick_update(&mut self, now_us: u64) -> bool;

    /// Collect and decode a completed transaction, if any
    fn try_consume(&mut self) -> Option<Stamped<Self::Reading>>;

    /// Whether the part acknowledged its most recent transaction
    fn present(&mut self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot() {
        let slot = ReadingSlot::<u32>::new();
        assert_eq!(slot.latest(), None);
        assert!(!slot.has_fresh());
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_take_clears_fresh_but_keeps_value() {
        let slot = ReadingSlot::new();
        slot.publish(Stamped::new(7u32, 100));

        assert!(slot.has_fresh());
        assert_eq!(slot.take(), Some(Stamped::new(7, 100)));
        assert!(!slot.has_fresh());
        assert_eq!(slot.latest(), Some(Stamped::new(7, 100)));
    }

    #[test]
    fn test_publish_overwrites() {
        let slot = ReadingSlot::new();
        slot.publish(Stamped::new(1u8, 10));
        slot.publish(Stamped::new(2u8, 20));
        assert_eq!(slot.take(), Some(Stamped::new(2, 20)));
    }

    #[test]
    fn test_clear() {
        let slot = ReadingSlot::new();
        slot.publish(Stamped::new(1u8, 10));
        slot.clear();
        assert_eq!(slot.latest(), None);
        assert!(!slot.has_fresh());
    }

    #[test]
    fn test_concurrent_reader_never_sees_torn_update() {
        use std::sync::Arc;
        use std::thread;

        // Each reading stores the same value in every field; a torn
        // update would show mismatched fields.
        let slot = Arc::new(ReadingSlot::<[u64; 4]>::new());
        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..20_000u64 {
                    slot.publish(Stamped::new([i; 4], i));
                }
            })
        };

        for _ in 0..20_000 {
            if let Some(r) = slot.latest() {
                assert!(r.value.iter().all(|v| *v == r.time_us));
            }
        }
        writer.join().unwrap();
    }
}
