//! Atmosphere provider trait definition
//!
//! `AtmosphereProvider` is the boundary between the scenario model and
//! whatever holds the radiative-transfer tables. The core only invokes it and
//! caches the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Tabulated atmospheric profile for one haze regime and viewing geometry
///
/// An ordered sequence of transmission, attenuation and path radiance samples
/// exactly as the provider tabulates them. Read access is through `Deref` to
/// `[f64]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtmosphericProfile(Vec<f64>);

impl AtmosphericProfile {
    /// Wrap tabulated samples
    #[must_use]
    pub fn new(samples: Vec<f64>) -> Self {
        AtmosphericProfile(samples)
    }

    /// Borrow the samples
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consume the profile and return the samples
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for AtmosphericProfile {
    type Target = [f64];
    #[inline]
    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for AtmosphericProfile {
    fn from(samples: Vec<f64>) -> Self {
        AtmosphericProfile(samples)
    }
}

/// Errors raised while looking up or tabulating atmospheric profiles
#[derive(Debug, Clone, PartialEq)]
pub enum AtmosphereError {
    /// No tabulated profile matches the haze index / geometry combination
    OutOfRange {
        ihaze: i32,
        altitude: f64,
        ground_range: f64,
    },
    /// A profile being tabulated does not match the length of the existing table
    ProfileLength { expected: usize, found: usize },
    /// A tabulated grid point must have finite coordinates
    InvalidGridPoint { altitude: f64, ground_range: f64 },
}

impl fmt::Display for AtmosphereError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtmosphereError::OutOfRange {
                ihaze,
                altitude,
                ground_range,
            } => write!(
                f,
                "No tabulated atmosphere for ihaze {ihaze} at altitude {altitude} m, ground range {ground_range} m"
            ),
            AtmosphereError::ProfileLength { expected, found } => write!(
                f,
                "Profile has {found} samples but the table holds {expected}-sample profiles"
            ),
            AtmosphereError::InvalidGridPoint {
                altitude,
                ground_range,
            } => write!(
                f,
                "Grid point (altitude {altitude}, ground range {ground_range}) must be finite"
            ),
        }
    }
}

impl std::error::Error for AtmosphereError {}

/// Source of atmospheric profiles for a viewing geometry
///
/// Implementations must be shareable across threads so one table can back
/// any number of scenarios.
pub trait AtmosphereProvider: Send + Sync {
    /// Look up the profile for a sensor at `altitude` (m) viewing a target
    /// `ground_range` (m) away under haze regime `ihaze`.
    ///
    /// # Errors
    ///
    /// Returns [`AtmosphereError::OutOfRange`] when no tabulated profile
    /// matches the combination (unsupported haze code or geometry outside the
    /// tabulated envelope).
    fn lookup(
        &self,
        altitude: f64,
        ground_range: f64,
        ihaze: i32,
    ) -> Result<AtmosphericProfile, AtmosphereError>;
}
