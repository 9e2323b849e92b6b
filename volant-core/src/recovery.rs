//! IMU fault recovery
//!
//! Some board families shipped in revisions that route the IMU data-ready
//! interrupt to different pins, and the revision cannot be read back from
//! the hardware. When the caller reports that the IMU stopped producing
//! plausible samples, the board assumes the other revision and re-probes.

use crate::imu::Calibration;

/// Recovery state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryState {
    /// IMU samples are arriving
    #[default]
    Nominal,
    /// Revision changed and sensors re-probed; waiting for a good sample
    Reconfiguring,
}

/// Cycles the board revision through a fixed set on IMU faults
///
/// There is no retry limit here. Callers that want to give up after a
/// number of attempts can read [`reconfigurations`](Self::reconfigurations).
#[derive(Debug, Clone)]
pub struct FaultRecovery {
    revisions: &'static [u8],
    state: RecoveryState,
    in_progress: bool,
    reconfigurations: u32,
}

impl FaultRecovery {
    /// Policy cycling through `revisions` (the first entry is the boot
    /// assumption)
    pub const fn new(revisions: &'static [u8]) -> Self {
        Self {
            revisions,
            state: RecoveryState::Nominal,
            in_progress: false,
            reconfigurations: 0,
        }
    }

    /// Revision assumed at boot
    pub fn initial_revision(&self) -> u8 {
        self.revisions.first().copied().unwrap_or(0)
    }

    /// Current state
    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Number of times recovery has been started
    pub fn reconfigurations(&self) -> u32 {
        self.reconfigurations
    }

    /// Start a reconfiguration, advancing `cal.revision`
    ///
    /// Returns `false` if a reconfiguration is already running; the fault
    /// hook must not re-enter itself through the re-probe. The caller
    /// re-runs sensor initialization and then calls
    /// [`finish`](Self::finish).
    pub fn begin(&mut self, cal: &mut Calibration) -> bool {
        if self.in_progress {
            return false;
        }
        self.in_progress = true;
        self.state = RecoveryState::Reconfiguring;
        self.reconfigurations = self.reconfigurations.wrapping_add(1);

        let previous = cal.revision;
        cal.revision = self.next_revision(previous);
        warn!(
            "imu not responding, board revision {} -> {}",
            previous, cal.revision
        );
        true
    }

    /// Re-probe finished
    pub fn finish(&mut self) {
        self.in_progress = false;
    }

    /// A plausible IMU sample arrived
    pub fn on_good_sample(&mut self) {
        if self.state == RecoveryState::Reconfiguring {
            info!("imu recovered after {} reconfigurations", self.reconfigurations);
            self.state = RecoveryState::Nominal;
        }
    }

    fn next_revision(&self, current: u8) -> u8 {
        match self.revisions.iter().position(|r| *r == current) {
            Some(i) => self.revisions[(i + 1) % self.revisions.len()],
            None => self.initial_revision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TWO_REVISIONS: [u8; 2] = [2, 5];
    static ONE_REVISION: [u8; 1] = [1];

    #[test]
    fn test_cycles_between_revisions() {
        let mut policy = FaultRecovery::new(&TWO_REVISIONS);
        let mut cal = Calibration::new(policy.initial_revision());
        assert_eq!(cal.revision, 2);

        assert!(policy.begin(&mut cal));
        assert_eq!(cal.revision, 5);
        assert_eq!(policy.state(), RecoveryState::Reconfiguring);
        policy.finish();

        assert!(policy.begin(&mut cal));
        assert_eq!(cal.revision, 2);
        policy.finish();
        assert_eq!(policy.reconfigurations(), 2);
    }

    #[test]
    fn test_single_revision_stays_put() {
        let mut policy = FaultRecovery::new(&ONE_REVISION);
        let mut cal = Calibration::new(1);
        assert!(policy.begin(&mut cal));
        assert_eq!(cal.revision, 1);
    }

    #[test]
    fn test_unknown_revision_restarts_cycle() {
        let mut policy = FaultRecovery::new(&TWO_REVISIONS);
        let mut cal = Calibration::new(3);
        policy.begin(&mut cal);
        assert_eq!(cal.revision, 2);
    }

    #[test]
    fn test_not_reentrant() {
        let mut policy = FaultRecovery::new(&TWO_REVISIONS);
        let mut cal = Calibration::new(2);

        assert!(policy.begin(&mut cal));
        assert!(!policy.begin(&mut cal));
        assert_eq!(cal.revision, 5);
        assert_eq!(policy.reconfigurations(), 1);
    }

    #[test]
    fn test_good_sample_returns_to_nominal() {
        let mut policy = FaultRecovery::new(&TWO_REVISIONS);
        let mut cal = Calibration::new(2);
        policy.begin(&mut cal);
        policy.finish();

        policy.on_good_sample();
        assert_eq!(policy.state(), RecoveryState::Nominal);
    }
}
