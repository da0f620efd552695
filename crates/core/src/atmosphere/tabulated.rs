//! In-memory tabulated atmosphere
//!
//! Holds pre-computed profiles on an (altitude, ground range) grid per haze
//! index. Loading the tables from disk is left to the caller; this type only
//! indexes and interpolates them.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::provider::{AtmosphereError, AtmosphereProvider, AtmosphericProfile};

/// Grid key for one tabulated point. `-0.0` and `0.0` share a key.
#[inline]
fn grid_key(altitude: f64, ground_range: f64) -> (u64, u64) {
    ((altitude + 0.0).to_bits(), (ground_range + 0.0).to_bits())
}

/// Insert `value` into a sorted axis if not already present
fn insert_sorted(axis: &mut Vec<f64>, value: f64) {
    if let Err(idx) = axis.binary_search_by(|probe| probe.total_cmp(&value)) {
        axis.insert(idx, value);
    }
}

/// Find the grid interval containing `value`
///
/// Returns `(lo, hi, t)` where `t` is the fractional position between
/// `axis[lo]` and `axis[hi]`. Exact grid hits return `lo == hi` and `t == 0`.
/// Values outside the axis (or NaN) return `None`.
fn bracket(axis: &[f64], value: f64) -> Option<(usize, usize, f64)> {
    let value = value + 0.0;
    let (first, last) = (*axis.first()?, *axis.last()?);
    if !(value >= first && value <= last) {
        return None;
    }

    match axis.binary_search_by(|probe| probe.total_cmp(&value)) {
        Ok(idx) => Some((idx, idx, 0.0)),
        Err(idx) => {
            let (lo, hi) = (idx - 1, idx);
            let t = (value - axis[lo]) / (axis[hi] - axis[lo]);
            Some((lo, hi, t))
        }
    }
}

/// Profiles tabulated for a single haze index
#[derive(Debug, Clone, Default)]
struct HazeTable {
    /// Tabulated altitudes, sorted ascending
    altitudes: Vec<f64>,
    /// Tabulated ground ranges, sorted ascending
    ground_ranges: Vec<f64>,
    profiles: FxHashMap<(u64, u64), AtmosphericProfile>,
}

impl HazeTable {
    fn get(&self, altitude_idx: usize, range_idx: usize) -> Option<&AtmosphericProfile> {
        self.profiles.get(&grid_key(
            self.altitudes[altitude_idx],
            self.ground_ranges[range_idx],
        ))
    }
}

/// Atmosphere provider backed by in-memory tables
///
/// The grid for each haze index may be sparse; a lookup only succeeds when
/// all grid corners surrounding the requested geometry are present.
///
/// # Example
///
/// ```
/// use sensor_radiometry_core::atmosphere::{AtmosphereProvider, TabulatedAtmosphere};
///
/// let mut table = TabulatedAtmosphere::new();
/// table.insert(1, 1000.0, 0.0, vec![0.8, 0.2]).unwrap();
/// table.insert(1, 1000.0, 100.0, vec![0.6, 0.4]).unwrap();
///
/// let profile = table.lookup(1000.0, 50.0, 1).unwrap();
/// assert!((profile[0] - 0.7).abs() < 1e-12);
/// assert!(table.lookup(1000.0, 50.0, 2).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TabulatedAtmosphere {
    tables: FxHashMap<i32, HazeTable>,
    /// Sample count shared by every profile, fixed by the first insert
    profile_len: Option<usize>,
}

impl TabulatedAtmosphere {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tabulate a profile at one grid point, replacing any existing entry
    ///
    /// # Errors
    ///
    /// - [`AtmosphereError::InvalidGridPoint`] if altitude or ground range is not finite
    /// - [`AtmosphereError::ProfileLength`] if the profile length differs from
    ///   profiles already in the table
    pub fn insert(
        &mut self,
        ihaze: i32,
        altitude: f64,
        ground_range: f64,
        profile: impl Into<AtmosphericProfile>,
    ) -> Result<(), AtmosphereError> {
        if !altitude.is_finite() || !ground_range.is_finite() {
            return Err(AtmosphereError::InvalidGridPoint {
                altitude,
                ground_range,
            });
        }

        let profile = profile.into();
        match self.profile_len {
            Some(expected) if expected != profile.len() => {
                return Err(AtmosphereError::ProfileLength {
                    expected,
                    found: profile.len(),
                });
            }
            Some(_) => {}
            None => self.profile_len = Some(profile.len()),
        }

        let (altitude, ground_range) = (altitude + 0.0, ground_range + 0.0);
        let table = self.tables.entry(ihaze).or_default();
        insert_sorted(&mut table.altitudes, altitude);
        insert_sorted(&mut table.ground_ranges, ground_range);
        table
            .profiles
            .insert(grid_key(altitude, ground_range), profile);
        Ok(())
    }

    /// Haze indices with at least one tabulated profile, ascending
    pub fn haze_codes(&self) -> Vec<i32> {
        let mut codes: Vec<i32> = self.tables.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Tabulated altitudes for a haze index (empty if unknown)
    pub fn altitudes(&self, ihaze: i32) -> &[f64] {
        self.tables
            .get(&ihaze)
            .map(|table| table.altitudes.as_slice())
            .unwrap_or_default()
    }

    /// Tabulated ground ranges for a haze index (empty if unknown)
    pub fn ground_ranges(&self, ihaze: i32) -> &[f64] {
        self.tables
            .get(&ihaze)
            .map(|table| table.ground_ranges.as_slice())
            .unwrap_or_default()
    }

    /// Number of samples in every profile, `None` while the table is empty
    pub fn profile_len(&self) -> Option<usize> {
        self.profile_len
    }

    /// Total number of tabulated profiles
    pub fn len(&self) -> usize {
        self.tables.values().map(|table| table.profiles.len()).sum()
    }

    /// Whether no profile has been tabulated yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AtmosphereProvider for TabulatedAtmosphere {
    fn lookup(
        &self,
        altitude: f64,
        ground_range: f64,
        ihaze: i32,
    ) -> Result<AtmosphericProfile, AtmosphereError> {
        let out_of_range = || AtmosphereError::OutOfRange {
            ihaze,
            altitude,
            ground_range,
        };

        let table = self.tables.get(&ihaze).ok_or_else(out_of_range)?;
        let (a_lo, a_hi, ta) = bracket(&table.altitudes, altitude).ok_or_else(out_of_range)?;
        let (r_lo, r_hi, tr) =
            bracket(&table.ground_ranges, ground_range).ok_or_else(out_of_range)?;

        let p00 = table.get(a_lo, r_lo).ok_or_else(out_of_range)?;
        if a_lo == a_hi && r_lo == r_hi {
            return Ok(p00.clone());
        }
        let p01 = table.get(a_lo, r_hi).ok_or_else(out_of_range)?;
        let p10 = table.get(a_hi, r_lo).ok_or_else(out_of_range)?;
        let p11 = table.get(a_hi, r_hi).ok_or_else(out_of_range)?;

        debug!(
            ihaze,
            altitude,
            ground_range,
            altitude_weight = ta,
            range_weight = tr,
            "Interpolating tabulated atmosphere"
        );

        // Bilinear blend: along ground range first, then along altitude
        let samples = p00
            .iter()
            .zip(p01.iter())
            .zip(p10.iter())
            .zip(p11.iter())
            .map(|(((v00, v01), v10), v11)| {
                let low = v00 + tr * (v01 - v00);
                let high = v10 + tr * (v11 - v10);
                low + ta * (high - low)
            })
            .collect();

        Ok(AtmosphericProfile::new(samples))
    }
}
