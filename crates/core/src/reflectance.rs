//! Inverse radiometric mapping from pixel values to reflectance
//!
//! A calibration curve pairs raw pixel values with the known reflectance of
//! reference panels in the scene. Every pixel of an image is mapped through
//! the piecewise-linear curve those pairs define.
//!
//! # Mapping Rules
//!
//! - Knots are ordered by pixel value before use
//! - Values between knots are linearly interpolated; knots map exactly
//! - Values beyond the outermost knots extend the nearest segment
//! - The result is truncated to the physical reflectance interval [0, 1]
//! - A zero-width segment (repeated pixel value) yields NaN, not an error
//!
//! Reflectance here is contrast across the camera bandpass.

use ndarray::{Array, ArrayBase, Data, Dimension};
use std::fmt;
use tracing::debug;

/// Images at least this large are mapped on the rayon pool
#[cfg(feature = "parallel")]
const PARALLEL_MIN_PIXELS: usize = 1 << 14;

/// Errors raised before any pixel is mapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectanceError {
    /// Image, pixel and reflectance lengths are inconsistent, or a non-empty
    /// calibration has fewer than the two knots a segment needs
    ShapeMismatch {
        image: usize,
        pixels: usize,
        reflectances: usize,
    },
}

impl fmt::Display for ReflectanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectanceError::ShapeMismatch {
                image,
                pixels,
                reflectances,
            } => write!(
                f,
                "Shape mismatch: image has {image} pixels, calibration has {pixels} pixel values and {reflectances} reflectance values"
            ),
        }
    }
}

impl std::error::Error for ReflectanceError {}

/// Piecewise-linear pixel value → reflectance curve
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationCurve {
    /// (pixel value, reflectance) pairs sorted by pixel value
    knots: Vec<(f64, f64)>,
}

impl CalibrationCurve {
    /// Build a curve from paired calibration samples, in any order
    ///
    /// # Errors
    ///
    /// [`ReflectanceError::ShapeMismatch`] if the sequences differ in length or
    /// fewer than two pairs are given
    pub fn new(pixel_values: &[f64], reflectance_values: &[f64]) -> Result<Self, ReflectanceError> {
        if pixel_values.len() != reflectance_values.len() || pixel_values.len() < 2 {
            return Err(ReflectanceError::ShapeMismatch {
                image: 0,
                pixels: pixel_values.len(),
                reflectances: reflectance_values.len(),
            });
        }

        let mut knots: Vec<(f64, f64)> = pixel_values
            .iter()
            .copied()
            .zip(reflectance_values.iter().copied())
            .collect();
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(Self { knots })
    }

    /// Calibration knots sorted by pixel value
    pub fn knots(&self) -> &[(f64, f64)] {
        &self.knots
    }

    /// Reflectance on the extended curve, before truncation to [0, 1]
    ///
    /// Picks the segment whose upper knot is the first at or above `pixel`,
    /// clipped to the first and last segments for extrapolation.
    pub fn interpolate(&self, pixel: f64) -> f64 {
        let upper = self
            .knots
            .partition_point(|&(p, _)| p < pixel)
            .clamp(1, self.knots.len() - 1);
        let (x0, y0) = self.knots[upper - 1];
        let (x1, y1) = self.knots[upper];

        let slope = (y1 - y0) / (x1 - x0);
        slope * (pixel - x0) + y0
    }

    /// Reflectance for a raw pixel value, truncated to [0, 1]
    ///
    /// NaN (degenerate segment or NaN input) passes through untouched.
    #[inline]
    pub fn reflectance(&self, pixel: f64) -> f64 {
        self.interpolate(pixel).clamp(0.0, 1.0)
    }
}

/// Map every pixel of `img` to reflectance through a calibration curve
///
/// The output has the same shape as `img`. An empty image with an empty
/// calibration maps to an empty output.
///
/// # Errors
///
/// [`ReflectanceError::ShapeMismatch`] when:
/// - `pixel_values` and `reflectance_values` differ in length
/// - the calibration is empty but `img` is not
/// - `img` is empty but the calibration is not
/// - the calibration has a single knot
///
/// # Example
///
/// ```
/// use ndarray::arr1;
/// use sensor_radiometry_core::reflectance::img2reflectance;
///
/// let img = arr1(&[0.0, 0.25, 0.5]);
/// let refl = img2reflectance(&img, &[0.0, 1.0], &[0.0, 2.0]).unwrap();
/// assert_eq!(refl, arr1(&[0.0, 0.5, 1.0]));
/// ```
pub fn img2reflectance<S, D>(
    img: &ArrayBase<S, D>,
    pixel_values: &[f64],
    reflectance_values: &[f64],
) -> Result<Array<f64, D>, ReflectanceError>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let mismatch = || ReflectanceError::ShapeMismatch {
        image: img.len(),
        pixels: pixel_values.len(),
        reflectances: reflectance_values.len(),
    };

    if pixel_values.len() != reflectance_values.len() {
        return Err(mismatch());
    }
    if img.is_empty() != pixel_values.is_empty() || pixel_values.len() == 1 {
        return Err(mismatch());
    }
    if img.is_empty() {
        return Ok(Array::zeros(img.raw_dim()));
    }

    let curve = CalibrationCurve::new(pixel_values, reflectance_values)?;
    debug!(
        pixels = img.len(),
        knots = curve.knots.len(),
        "Mapping image to reflectance"
    );

    #[cfg(feature = "parallel")]
    if img.len() >= PARALLEL_MIN_PIXELS {
        return Ok(ndarray::Zip::from(img).par_map_collect(|&p| curve.reflectance(p)));
    }

    Ok(img.mapv(|p| curve.reflectance(p)))
}
