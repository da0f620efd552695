//! Sensor Radiometry Core Library
//!
//! Radiometric and atmospheric building blocks for imaging sensor performance
//! models. Produces the quantities consumed by downstream image-quality
//! metrics:
//!
//! - Atmospheric transmission/attenuation profiles, cached per scenario
//! - Quantization noise and filter noise gain
//! - Reflectance-mapped imagery from calibrated raw frames
//!
//! ## Scenario and Atmosphere
//!
//! A [`Scenario`] holds the collection geometry and scene parameters and pulls
//! its atmospheric profile from an [`AtmosphereProvider`] on first use. The
//! profile stays cached until the haze index, altitude or ground range is
//! written again.

// Core types and utilities
pub mod core_types;

pub mod atmosphere;
pub mod noise;
pub mod reflectance;
pub mod scenario;

// Re-export commonly used types
pub use atmosphere::{AtmosphereError, AtmosphereProvider, AtmosphericProfile, TabulatedAtmosphere};
pub use core_types::{Kelvin, Meters, MetersPerSecond};
pub use noise::{noise_gain, quantization_noise};
pub use reflectance::{img2reflectance, CalibrationCurve, ReflectanceError};
pub use scenario::{Scenario, ScenarioConfig};
