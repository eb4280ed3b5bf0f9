//! Direct escape-time formulas.
//!
//! `compute_pixel_direct` is the classic f64 loop, only valid while f64 can
//! tell adjacent pixels apart (roughly zoom < 10^14).
//! `compute_pixel_arbitrary` runs the same loop in BigFloat; it is far too slow
//! for the per-pixel path at depth and exists to validate perturbation.

use deepzoom_core::{BigFloat, SENTINEL_NO_ESCAPE};

/// Classic bailout (|z|² > 2²).
pub const DIRECT_BAILOUT_SQ: f64 = 4.0;

/// Escape time of `c` in f64.
pub fn compute_pixel_direct(c_re: f64, c_im: f64, max_iterations: u32) -> u32 {
    let mut re = 0.0_f64;
    let mut im = 0.0_f64;
    let mut re_sq = 0.0_f64;
    let mut im_sq = 0.0_f64;

    for n in 0..max_iterations {
        // Imaginary part first: it needs the previous re
        im = 2.0 * re * im + c_im;
        re = re_sq - im_sq + c_re;
        re_sq = re * re;
        im_sq = im * im;

        if re_sq + im_sq > DIRECT_BAILOUT_SQ {
            return n;
        }
    }

    SENTINEL_NO_ESCAPE
}

/// Escape time of `c` in BigFloat at the precision of `c`.
pub fn compute_pixel_arbitrary(c: &(BigFloat, BigFloat), max_iterations: u32) -> u32 {
    let precision = c.0.precision_bits().max(c.1.precision_bits());
    let mut re = BigFloat::zero(precision);
    let mut im = BigFloat::zero(precision);
    let mut re_sq = BigFloat::zero(precision);
    let mut im_sq = BigFloat::zero(precision);
    let bailout_sq = BigFloat::with_precision(DIRECT_BAILOUT_SQ, precision);

    for n in 0..max_iterations {
        im = re.mul(&im).double().add(&c.1);
        re = re_sq.sub(&im_sq).add(&c.0);
        re_sq = re.square();
        im_sq = im.square();

        if re_sq.add(&im_sq) > bailout_sq {
            return n;
        }
    }

    SENTINEL_NO_ESCAPE
}
