//! Sensor-to-body axis remapping
//!
//! IMU parts are mounted in whatever orientation suits the PCB layout.
//! Each board family carries a fixed [`AxisMap`] that rotates raw
//! device-frame samples into the forward-right-down body frame.

/// 3×3 signed-permutation matrix from device axes to body axes
///
/// Row `i` selects which device axis (and with which sign) becomes body
/// axis `i`. Every row and every column holds exactly one non-zero entry,
/// either `1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMap {
    rows: [[i8; 3]; 3],
}

impl AxisMap {
    /// Device frame already matches the body frame
    pub const IDENTITY: AxisMap = AxisMap::new([[1, 0, 0], [0, 1, 0], [0, 0, 1]]);

    /// Build a map from its rows
    ///
    /// Board crates check their maps at compile time with
    /// [`is_signed_permutation`](Self::is_signed_permutation).
    pub const fn new(rows: [[i8; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Matrix rows
    pub const fn rows(&self) -> [[i8; 3]; 3] {
        self.rows
    }

    /// Whether every row and column has exactly one entry of ±1
    pub const fn is_signed_permutation(&self) -> bool {
        let mut col_hits = [0u8; 3];
        let mut i = 0;
        while i < 3 {
            let mut row_hits = 0;
            let mut j = 0;
            while j < 3 {
                match self.rows[i][j] {
                    0 => {}
                    1 | -1 => {
                        row_hits += 1;
                        col_hits[j] += 1;
                    }
                    _ => return false,
                }
                j += 1;
            }
            if row_hits != 1 {
                return false;
            }
            i += 1;
        }
        col_hits[0] == 1 && col_hits[1] == 1 && col_hits[2] == 1
    }

    /// Inverse map (the transpose, for a signed permutation)
    pub const fn inverse(&self) -> Self {
        let r = self.rows;
        Self::new([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    /// Remap a raw sample and scale it by `gain`
    ///
    /// The sign flip happens in `f32`, so `i16::MIN` does not overflow.
    pub fn apply(&self, raw: [i16; 3], gain: f32) -> [f32; 3] {
        self.apply_f32([f32::from(raw[0]), f32::from(raw[1]), f32::from(raw[2])], gain)
    }

    /// Remap an already-converted vector and scale it by `gain`
    pub fn apply_f32(&self, v: [f32; 3], gain: f32) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (o, row) in out.iter_mut().zip(self.rows.iter()) {
            let sum: f32 = row.iter().zip(v.iter()).map(|(m, x)| f32::from(*m) * x).sum();
            *o = sum * gain;
        }
        out
    }
}

impl Default for AxisMap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FLIP_YZ: AxisMap = AxisMap::new([[1, 0, 0], [0, -1, 0], [0, 0, -1]]);
    const SWAP_XY: AxisMap = AxisMap::new([[0, -1, 0], [-1, 0, 0], [0, 0, -1]]);

    const _: () = assert!(FLIP_YZ.is_signed_permutation());
    const _: () = assert!(SWAP_XY.is_signed_permutation());

    #[test]
    fn test_rejects_non_permutations() {
        assert!(!AxisMap::new([[1, 0, 0], [1, 0, 0], [0, 0, 1]]).is_signed_permutation());
        assert!(!AxisMap::new([[2, 0, 0], [0, 1, 0], [0, 0, 1]]).is_signed_permutation());
        assert!(!AxisMap::new([[1, 1, 0], [0, 0, 0], [0, 0, 1]]).is_signed_permutation());
    }

    #[test]
    fn test_flip_yz() {
        assert_eq!(FLIP_YZ.apply([100, 200, 300], 0.5), [50.0, -100.0, -150.0]);
    }

    #[test]
    fn test_swap_xy() {
        assert_eq!(SWAP_XY.apply([1, 2, 3], 1.0), [-2.0, -1.0, -3.0]);
    }

    #[test]
    fn test_min_value_negates_without_overflow() {
        assert_eq!(FLIP_YZ.apply([0, i16::MIN, 0], 1.0), [0.0, 32768.0, 0.0]);
    }

    fn signed_permutation() -> impl Strategy<Value = AxisMap> {
        let perms = [
            [0usize, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        (0..6usize, prop::array::uniform3(prop::bool::ANY)).prop_map(move |(p, signs)| {
            let mut rows = [[0i8; 3]; 3];
            for (i, col) in perms[p].iter().enumerate() {
                rows[i][*col] = if signs[i] { -1 } else { 1 };
            }
            AxisMap::new(rows)
        })
    }

    proptest! {
        #[test]
        fn prop_inverse_restores_sample(
            map in signed_permutation(),
            raw in prop::array::uniform3(any::<i16>()),
        ) {
            prop_assert!(map.is_signed_permutation());
            let body = map.apply(raw, 1.0);
            let back = map.inverse().apply_f32(body, 1.0);
            prop_assert_eq!(back, [f32::from(raw[0]), f32::from(raw[1]), f32::from(raw[2])]);
        }

        #[test]
        fn prop_preserves_magnitude(
            map in signed_permutation(),
            raw in prop::array::uniform3(any::<i16>()),
        ) {
            let body = map.apply(raw, 1.0);
            let norm = |v: [f32; 3]| v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>();
            let raw_f = [f32::from(raw[0]), f32::from(raw[1]), f32::from(raw[2])];
            prop_assert_eq!(norm(body), norm(raw_f));
        }
    }
}
