//! Sensor probe registry
//!
//! Each sensor role owns a fixed, priority-ordered table of device
//! variants. Probing walks the table and binds the first variant whose
//! identification handshake succeeds; a role whose table is exhausted is
//! absent until the next probe pass.

use embedded_hal::delay::DelayNs;

use crate::channel::{ReadingSlot, SensorDevice, Stamped};

/// Sensor roles a board can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorKind {
    Barometer,
    Rangefinder,
    DifferentialPressure,
    Magnetometer,
    Imu,
    RcInput,
}

impl SensorKind {
    /// Every role, in report order
    pub const ALL: [SensorKind; 6] = [
        SensorKind::Imu,
        SensorKind::Magnetometer,
        SensorKind::Barometer,
        SensorKind::DifferentialPressure,
        SensorKind::Rangefinder,
        SensorKind::RcInput,
    ];

    /// Lowercase role name for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            SensorKind::Barometer => "baro",
            SensorKind::Rangefinder => "sonar",
            SensorKind::DifferentialPressure => "airspeed",
            SensorKind::Magnetometer => "mag",
            SensorKind::Imu => "imu",
            SensorKind::RcInput => "rc",
        }
    }
}

/// Builds an unprobed device variant from the board's bus context
pub type VariantCtor<C, D> = fn(&C) -> D;

/// Outcome of one probe pass: the variant bound to each role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    entries: heapless::Vec<(SensorKind, Option<&'static str>), 6>,
}

impl ProbeReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the binding for `kind`, replacing any earlier entry
    pub fn record(&mut self, kind: SensorKind, bound: Option<&'static str>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = bound;
            return;
        }
        // One slot per role, so this cannot overflow
        let _ = self.entries.push((kind, bound));
    }

    /// Variant bound to `kind`, or `None` if absent or not probed
    pub fn bound(&self, kind: SensorKind) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, name)| *name)
    }

    /// Whether `kind` was probed in this pass
    pub fn probed(&self, kind: SensorKind) -> bool {
        self.entries.iter().any(|(k, _)| *k == kind)
    }

    /// Iterate over `(role, bound variant)` pairs in probe order
    pub fn iter(&self) -> impl Iterator<Item = &(SensorKind, Option<&'static str>)> {
        self.entries.iter()
    }
}

/// One sensor role: its bound variant and the slot its readings land in
pub struct SensorRole<D: SensorDevice> {
    kind: SensorKind,
    bound: Option<D>,
    slot: ReadingSlot<D::Reading>,
}

impl<D: SensorDevice> SensorRole<D> {
    /// Unbound role
    pub const fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            bound: None,
            slot: ReadingSlot::new(),
        }
    }

    /// Role this slot fills
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Drop any binding and try `variants` in order
    ///
    /// Returns the name of the bound variant. Readings from an earlier
    /// binding are discarded.
    pub fn probe<C>(
        &mut self,
        ctx: &C,
        variants: &[VariantCtor<C, D>],
        delay: &mut impl DelayNs,
    ) -> Option<&'static str> {
        self.bound = None;
        self.slot.clear();

        for ctor in variants {
            let mut device = ctor(ctx);
            if device.probe(delay) {
                let name = device.name();
                info!("{}: found {}", self.kind.as_str(), name);
                self.bound = Some(device);
                return Some(name);
            }
            debug!("{}: no {}", self.kind.as_str(), device.name());
        }

        info!("{}: absent", self.kind.as_str());
        None
    }

    /// Whether a variant is bound
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Name of the bound variant
    pub fn bound_name(&self) -> Option<&'static str> {
        self.bound.as_ref().map(|d| d.name())
    }

    /// The bound variant
    pub fn device(&self) -> Option<&D> {
        self.bound.as_ref()
    }

    /// The bound variant, mutably
    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.bound.as_mut()
    }

    /// Start a transaction on the bound variant
    ///
    /// Returns `false` if nothing is bound or the variant did not start one.
    pub fn kick(&mut self, now_us: u64) -> bool {
        self.bound
            .as_mut()
            .is_some_and(|device| device.kick_update(now_us))
    }

    /// Move a completed reading into the slot
    ///
    /// Returns `true` if a reading was published.
    pub fn collect(&mut self) -> bool {
        let Some(device) = self.bound.as_mut() else {
            return false;
        };
        match device.try_consume() {
            Some(reading) => {
                self.slot.publish(reading);
                true
            }
            None => false,
        }
    }

    /// One update cycle: consume, kick, consume
    ///
    /// A variant holds one transaction at a time, so anything already
    /// finished is collected first. The second collect picks up
    /// transactions that complete as soon as they are started.
    pub fn update(&mut self, now_us: u64) {
        self.collect();
        self.kick(now_us);
        self.collect();
    }

    /// Run an update cycle and report whether the bound variant answered
    pub fn check(&mut self, now_us: u64) -> bool {
        self.update(now_us);
        self.bound.as_mut().is_some_and(|d| d.present())
    }

    /// Latest reading, fresh or not
    pub fn latest(&self) -> Option<Stamped<D::Reading>> {
        self.slot.latest()
    }

    /// Latest reading, clearing its fresh flag
    pub fn take(&self) -> Option<Stamped<D::Reading>> {
        self.slot.take()
    }

    /// Whether a reading arrived since the last [`take`](Self::take)
    pub fn has_fresh(&self) -> bool {
        self.slot.has_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use volant_hal::mock::MockClock;

    use crate::delay::ClockDelay;

    /// Bench of fake parts shared by the test variants
    struct Bench {
        alpha_present: bool,
        beta_present: bool,
        probes: Rc<Cell<u32>>,
    }

    struct Fake {
        name: &'static str,
        probes: Rc<Cell<u32>>,
        answers: bool,
        pending: Option<u64>,
        kicks: u32,
    }

    impl SensorDevice for Fake {
        type Reading = u32;

        fn name(&self) -> &'static str {
            self.name
        }

        fn probe(&mut self, _delay: &mut impl DelayNs) -> bool {
            self.probes.set(self.probes.get() + 1);
            self.answers
        }

        fn kick_update(&mut self, now_us: u64) -> bool {
            if self.pending.is_some() {
                return false;
            }
            self.kicks += 1;
            self.pending = Some(now_us);
            true
        }

        fn try_consume(&mut self) -> Option<Stamped<u32>> {
            self.pending.take().map(|t| Stamped::new(self.kicks, t))
        }

        fn present(&mut self) -> bool {
            self.answers
        }
    }

    fn alpha(bench: &Bench) -> Fake {
        Fake {
            name: "alpha",
            probes: Rc::clone(&bench.probes),
            answers: bench.alpha_present,
            pending: None,
            kicks: 0,
        }
    }

    fn beta(bench: &Bench) -> Fake {
        Fake {
            name: "beta",
            probes: Rc::clone(&bench.probes),
            answers: bench.beta_present,
            pending: None,
            kicks: 0,
        }
    }

    fn bench(alpha_present: bool, beta_present: bool) -> Bench {
        Bench {
            alpha_present,
            beta_present,
            probes: Rc::new(Cell::new(0)),
        }
    }

    #[test]
    fn test_first_responding_variant_wins() {
        let bench = bench(true, true);
        let mut clock = MockClock::new();
        let mut role = SensorRole::new(SensorKind::Barometer);

        let bound = role.probe(&bench, &[alpha, beta], &mut ClockDelay::new(&mut clock));
        assert_eq!(bound, Some("alpha"));
        assert_eq!(bench.probes.get(), 1);
    }

    #[test]
    fn test_falls_through_to_second_variant() {
        let bench = bench(false, true);
        let mut clock = MockClock::new();
        let mut role = SensorRole::new(SensorKind::Barometer);

        let bound = role.probe(&bench, &[alpha, beta], &mut ClockDelay::new(&mut clock));
        assert_eq!(bound, Some("beta"));
        assert_eq!(role.bound_name(), Some("beta"));
    }

    #[test]
    fn test_absent_role_checks_false_and_has_no_reading() {
        let bench = bench(false, false);
        let mut clock = MockClock::new();
        let mut role = SensorRole::new(SensorKind::Rangefinder);

        assert_eq!(
            role.probe(&bench, &[alpha, beta], &mut ClockDelay::new(&mut clock)),
            None
        );
        assert!(!role.check(0));
        assert_eq!(role.latest(), None);
    }

    #[test]
    fn test_reprobe_is_idempotent_and_drops_old_readings() {
        let bench = bench(false, true);
        let mut clock = MockClock::new();
        let mut role = SensorRole::new(SensorKind::Barometer);

        role.probe(&bench, &[alpha, beta], &mut ClockDelay::new(&mut clock));
        role.update(10);
        assert!(role.latest().is_some());

        let again = role.probe(&bench, &[alpha, beta], &mut ClockDelay::new(&mut clock));
        assert_eq!(again, Some("beta"));
        assert_eq!(role.latest(), None);
    }

    #[test]
    fn test_update_publishes_immediate_completion() {
        let bench = bench(true, false);
        let mut clock = MockClock::new();
        let mut role = SensorRole::new(SensorKind::Magnetometer);
        role.probe(&bench, &[alpha], &mut ClockDelay::new(&mut clock));

        role.update(500);
        assert!(role.has_fresh());
        assert_eq!(role.take(), Some(Stamped::new(1, 500)));
        assert!(!role.has_fresh());
    }

    #[test]
    fn test_probe_report_replaces_entries() {
        let mut report = ProbeReport::new();
        report.record(SensorKind::Barometer, Some("bmp280"));
        report.record(SensorKind::Rangefinder, None);
        report.record(SensorKind::Barometer, Some("ms5611"));

        assert_eq!(report.bound(SensorKind::Barometer), Some("ms5611"));
        assert!(report.probed(SensorKind::Rangefinder));
        assert_eq!(report.bound(SensorKind::Rangefinder), None);
        assert!(!report.probed(SensorKind::Imu));
        assert_eq!(report.iter().count(), 2);
    }
}
