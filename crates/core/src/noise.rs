//! Sensor noise terms
//!
//! Closed-form noise contributions that do not depend on scene content:
//! - Quantization noise from digitizing the photoelectron signal
//! - Noise gain of linear post-processing (sharpening) kernels
//!
//! Degenerate inputs are reported through IEEE-754 NaN/Inf, never as errors,
//! so batch evaluation over parameter sweeps never short-circuits.
//!
//! # References
//!
//! - Widrow, B. & Kollár, I. (2008). "Quantization Noise." Cambridge University Press.
//! - Leachtenauer, J.C. & Driggers, R.G. (2001). "Surveillance and Reconnaissance
//!   Imaging Systems." Artech House, ch. 6.

use ndarray::{ArrayBase, Data, Dimension};

/// Standard deviation of a uniform distribution one unit wide is `1 / sqrt(12)`
const SQRT_12: f64 = 3.4641016151377544;

/// RMS quantization noise in photoelectrons
///
/// The full photoelectron range `pe_range` is split into `2^bit_depth - 1`
/// quantization steps; each step contributes uniform rounding error with
/// standard deviation `step / sqrt(12)`.
///
/// # Parameters
/// - `pe_range`: Dynamic range mapped onto the ADC (photoelectrons)
/// - `bit_depth`: ADC resolution (bits)
///
/// # Degenerate inputs
/// - `pe_range == 0`, `bit_depth == 0`: NaN (0/0)
/// - `pe_range > 0`, `bit_depth == 0`: +Inf (a single level has no steps)
///
/// # Example
///
/// ```
/// use sensor_radiometry_core::noise::quantization_noise;
///
/// assert!((quantization_noise(1.0, 1.0) - 0.2886751345948129).abs() < 1e-15);
/// assert!(quantization_noise(1.0, 0.0).is_infinite());
/// assert!(quantization_noise(0.0, 0.0).is_nan());
/// ```
#[inline]
pub fn quantization_noise(pe_range: f64, bit_depth: f64) -> f64 {
    let steps = bit_depth.exp2() - 1.0;
    pe_range / (steps * SQRT_12)
}

/// Noise gain of a linear filter kernel
///
/// White noise passed through the kernel has its standard deviation scaled by
/// the root-sum-square of the kernel coefficients. An empty kernel passes no
/// signal and has zero gain.
pub fn noise_gain<S, D>(kernel: &ArrayBase<S, D>) -> f64
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    kernel.iter().map(|k| k * k).sum::<f64>().sqrt()
}
