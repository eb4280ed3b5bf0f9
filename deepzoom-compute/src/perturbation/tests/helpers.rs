use crate::{compute_pixel_arbitrary, compute_pixel_direct, ReferenceOrbit};
use deepzoom_core::{escaped, BigFloat, Frame, PixelSample, SENTINEL_NO_ESCAPE};

/// Largest escape-time gap accepted between perturbation (|z| > 10) and the
/// direct formulas (|z| > 2). Past |z| = 2 the orbit needs a few more steps
/// to clear the wider bailout.
pub const BAILOUT_SLACK: u32 = 5;

/// Reference orbit for an f64 point at 128 bits.
pub fn orbit_at(re: f64, im: f64, max_iter: u32) -> ReferenceOrbit {
    let c_ref = (BigFloat::with_precision(re, 128), BigFloat::with_precision(im, 128));
    ReferenceOrbit::compute(&c_ref, max_iter).unwrap()
}

/// Direct f64 escape time of `c_ref + delta_c`.
pub fn direct_at(orbit: &ReferenceOrbit, delta_c: (f64, f64), max_iter: u32) -> u32 {
    compute_pixel_direct(orbit.c_ref.0 + delta_c.0, orbit.c_ref.1 + delta_c.1, max_iter)
}

/// Direct BigFloat escape time of a frame sample.
pub fn arbitrary_at(frame: &Frame, sample: PixelSample, max_iter: u32) -> u32 {
    compute_pixel_arbitrary(&frame.sample_to_point(sample), max_iter)
}

/// Whether a perturbation result is consistent with a direct one.
pub fn agrees(perturbation: u32, direct: u32) -> bool {
    match (escaped(perturbation), escaped(direct)) {
        (true, true) => perturbation >= direct && perturbation - direct <= BAILOUT_SLACK,
        (false, false) => true,
        _ => false,
    }
}

pub fn describe(iterations: u32) -> String {
    if iterations == SENTINEL_NO_ESCAPE {
        "no escape".to_string()
    } else {
        iterations.to_string()
    }
}
