//! Atmospheric propagation profiles.
//!
//! A scenario never computes radiative transfer itself: it asks an
//! [`AtmosphereProvider`] for a pre-computed profile matching its haze regime
//! and viewing geometry. This module defines that seam plus an in-memory
//! tabulated implementation.
//!
//! # Lookup Model
//!
//! Profiles are pre-computed offline (e.g. with MODTRAN) on a grid of:
//! - Haze index (`ihaze`): discrete visibility regime, never interpolated
//! - Sensor altitude (m)
//! - Ground range from nadir to target (m)
//!
//! Geometry between tabulated grid points is bilinearly interpolated;
//! geometry outside the tabulated envelope is an out-of-range error.
//!
//! # References
//!
//! - Berk, A. et al. (2014). "MODTRAN6: a major upgrade of the MODTRAN radiative
//!   transfer code." Proc. SPIE 9088.
//! - Leachtenauer, J.C. & Driggers, R.G. (2001). "Surveillance and Reconnaissance
//!   Imaging Systems: Modeling and Performance Prediction." Artech House.

mod provider;
mod tabulated;

pub use provider::{AtmosphereError, AtmosphereProvider, AtmosphericProfile};
pub use tabulated::TabulatedAtmosphere;
