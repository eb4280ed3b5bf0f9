//! Reference orbit computation for perturbation rendering.
//!
//! Computes the orbit of the frame center at the frame precision using
//! BigFloat, storing each step rounded to f64 for fast delta iterations.

use deepzoom_core::error::try_alloc_vec;
use deepzoom_core::{BigFloat, EngineError, Frame};

/// Orbit truncation threshold (|Z|² > 256²).
///
/// Looser than `PERTURBATION_BAILOUT_SQ`: pixels near the reference escape
/// before the orbit ends.
pub const ORBIT_ESCAPE_RADIUS_SQ: f64 = 65536.0;

/// A pre-computed reference orbit for perturbation rendering.
#[derive(Clone, Debug)]
pub struct ReferenceOrbit {
    /// Reference point C as f64
    pub c_ref: (f64, f64),
    /// Orbit values Z_n as f64. `orbit[0]` is always the origin.
    pub orbit: Vec<(f64, f64)>,
    /// Step at which the reference passed the truncation threshold (None if never)
    pub escaped_at: Option<u32>,
}

impl ReferenceOrbit {
    /// Build the orbit of a frame's center at the frame precision.
    pub fn build(frame: &Frame, iteration_cap: u32) -> Result<Self, EngineError> {
        Self::compute_at(
            &(frame.center_re.clone(), frame.center_im.clone()),
            frame.precision_bits(),
            iteration_cap,
        )
    }

    /// Compute a reference orbit at the precision of `c_ref` itself.
    pub fn compute(c_ref: &(BigFloat, BigFloat), iteration_cap: u32) -> Result<Self, EngineError> {
        let precision = c_ref.0.precision_bits().max(c_ref.1.precision_bits());
        Self::compute_at(c_ref, precision, iteration_cap)
    }

    /// Compute a reference orbit with every BigFloat step at `precision` bits.
    ///
    /// Holds at most `iteration_cap` points (one point, the origin, when the cap
    /// is 0). The step that crosses the truncation threshold is kept as the last
    /// point.
    pub fn compute_at(
        c_ref: &(BigFloat, BigFloat),
        precision: usize,
        iteration_cap: u32,
    ) -> Result<Self, EngineError> {
        let len = iteration_cap.max(1) as usize;
        let mut orbit = try_alloc_vec(len, "reference orbit")?;
        orbit.push((0.0, 0.0));

        let mut re = BigFloat::zero(precision);
        let mut im = BigFloat::zero(precision);
        let mut re_sq = BigFloat::zero(precision);
        let mut im_sq = BigFloat::zero(precision);
        let escape_radius_sq = BigFloat::with_precision(ORBIT_ESCAPE_RADIUS_SQ, precision);

        let mut escaped_at = None;

        for n in 1..iteration_cap {
            // Imaginary part first: it needs the previous re
            im = re.mul(&im).double().add(&c_ref.1);
            re = re_sq.sub(&im_sq).add(&c_ref.0);
            re_sq = re.square();
            im_sq = im.square();

            orbit.push((re.to_f64(), im.to_f64()));

            if re_sq.add(&im_sq) > escape_radius_sq {
                escaped_at = Some(n);
                break;
            }
        }

        Ok(Self {
            c_ref: (c_ref.0.to_f64(), c_ref.1.to_f64()),
            orbit,
            escaped_at,
        })
    }

    pub fn len(&self) -> usize {
        self.orbit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbit.is_empty()
    }
}
