use crate::{precision_bits_for_zoom, BigFloat, EngineError, PixelSample};
use serde::{Deserialize, Serialize};

/// A render frame in fractal space with BigFloat precision
///
/// - `center_re`, `center_im`: the anchor point, also the reference orbit seed
/// - `zoom`: scale factor, larger is deeper (a pixel sample is divided by it)
///
/// All arbitrary-precision arithmetic for the frame runs at `precision_bits`.
/// At extreme depths (zoom 10^2000) the center needs thousands of bits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    pub center_re: BigFloat,
    pub center_im: BigFloat,
    pub zoom: BigFloat,
    precision_bits: usize,
}

impl Frame {
    /// Create new frame with BigFloat coordinates
    ///
    /// This is the primary constructor that preserves full precision.
    /// The frame precision is the widest of its components.
    pub fn with_bigfloat(center_re: BigFloat, center_im: BigFloat, zoom: BigFloat) -> Self {
        let precision_bits = center_re
            .precision_bits()
            .max(center_im.precision_bits())
            .max(zoom.precision_bits());
        Self {
            center_re,
            center_im,
            zoom,
            precision_bits,
        }
    }

    /// Create new frame from f64 values with explicit precision
    ///
    /// Use this for shallow frames or tests. For extreme depths, use `from_strings`.
    pub fn from_f64(center_re: f64, center_im: f64, zoom: f64, precision_bits: usize) -> Self {
        Self {
            center_re: BigFloat::with_precision(center_re, precision_bits),
            center_im: BigFloat::with_precision(center_im, precision_bits),
            zoom: BigFloat::with_precision(zoom, precision_bits),
            precision_bits,
        }
    }

    /// Create frame from string representations (for extreme precision coordinates)
    ///
    /// Returns an error if any string cannot be parsed.
    pub fn from_strings(
        center_re: &str,
        center_im: &str,
        zoom: &str,
        precision_bits: usize,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            center_re: BigFloat::from_string(center_re, precision_bits)?,
            center_im: BigFloat::from_string(center_im, precision_bits)?,
            zoom: BigFloat::from_string(zoom, precision_bits)?,
            precision_bits,
        })
    }

    /// Create frame from strings, choosing the precision from the zoom depth.
    pub fn with_auto_precision(
        center_re: &str,
        center_im: &str,
        zoom: &str,
        canvas_width: u32,
        iteration_cap: u32,
    ) -> Result<Self, EngineError> {
        let zoom_log10 = decimal_log10(zoom)
            .ok_or_else(|| EngineError::Parse(format!("'{}' is not a positive zoom", zoom)))?;
        let precision_bits = precision_bits_for_zoom(zoom_log10, canvas_width, iteration_cap);
        Self::from_strings(center_re, center_im, zoom, precision_bits)
    }

    /// Get the precision bits of this frame
    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Reject frames no formula can map samples through.
    ///
    /// The zoom must be strictly positive: zero would divide by zero and a
    /// negative or NaN zoom has no meaning.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.zoom > BigFloat::zero(self.precision_bits) {
            Ok(())
        } else {
            Err(EngineError::Frame(format!("zoom must be positive, got {}", self.zoom)))
        }
    }

    /// Center rounded to f64, for the direct double-precision formula.
    pub fn center_f64(&self) -> (f64, f64) {
        (self.center_re.to_f64(), self.center_im.to_f64())
    }

    /// Size of one sample unit in fractal space (1 / zoom), rounded to f64.
    ///
    /// Computed in BigFloat so the reciprocal stays representable for zooms
    /// past the f64 range of `zoom` itself.
    pub fn sample_scale(&self) -> f64 {
        BigFloat::with_precision(1.0, self.precision_bits)
            .div(&self.zoom)
            .to_f64()
    }

    /// Absolute fractal-space point for a sample: `sample / zoom + center`.
    pub fn sample_to_point(&self, sample: PixelSample) -> (BigFloat, BigFloat) {
        let re = BigFloat::with_precision(sample.re, self.precision_bits)
            .div(&self.zoom)
            .add(&self.center_re);
        let im = BigFloat::with_precision(sample.im, self.precision_bits)
            .div(&self.zoom)
            .add(&self.center_im);
        (re, im)
    }
}

/// log10 of a positive decimal string, tolerating exponents past the f64 range.
fn decimal_log10(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let parsed: f64 = trimmed.parse().ok()?;
    if parsed.is_finite() {
        return (parsed > 0.0).then(|| parsed.log10());
    }
    let (mantissa, exponent) = trimmed.split_once(|c| c == 'e' || c == 'E')?;
    let mantissa: f64 = mantissa.parse().ok()?;
    let exponent: f64 = exponent.parse().ok()?;
    (mantissa > 0.0).then(|| mantissa.log10() + exponent)
}
