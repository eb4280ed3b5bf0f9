//! Perturbation pixel computation.
//!
//! Iterates a pixel's f64 delta against the shared reference orbit:
//! δz' = 2·Z_m·δz + δz² + δc, with the true point Z_m + δz.

use super::ReferenceOrbit;
use deepzoom_core::SENTINEL_NO_ESCAPE;

/// Per-pixel bailout (|z|² > 10²). Wider than the classic 2² to absorb delta drift.
pub const PERTURBATION_BAILOUT_SQ: f64 = 100.0;

/// Rebase check: restart from the reference origin when the delta dominates
/// the true point, or when the orbit is about to run out.
///
/// Only consulted when rebasing is enabled.
#[inline]
pub fn should_rebase(z_norm_sq: f64, dz_norm_sq: f64, ref_index: usize, orbit_len: usize) -> bool {
    z_norm_sq < dz_norm_sq || ref_index + 1 >= orbit_len
}

/// Escape time of `c_ref + delta_c`, or `SENTINEL_NO_ESCAPE`.
///
/// Without rebasing the result is approximate near minibrots: a pixel whose
/// delta outgrows the reference keeps following the wrong orbit. It also
/// returns the sentinel when the reference orbit ends before the pixel
/// escapes.
pub fn compute_pixel_perturbation(
    orbit: &ReferenceOrbit,
    delta_c: (f64, f64),
    max_iterations: u32,
    rebase: bool,
) -> u32 {
    let reference = orbit.orbit.as_slice();
    if reference.is_empty() {
        return SENTINEL_NO_ESCAPE;
    }
    let (dc_re, dc_im) = delta_c;
    let mut dz_re = 0.0_f64;
    let mut dz_im = 0.0_f64;
    let mut m: usize = 0;

    for n in 0..max_iterations {
        let (z_re, z_im) = reference[m];

        // 2·Z_m·δz + δz² + δc, from the previous δz
        let new_dz_re = 2.0 * (dz_re * z_re - dz_im * z_im) + dz_re * dz_re - dz_im * dz_im + dc_re;
        let new_dz_im = 2.0 * (dz_re * z_im + dz_im * z_re) + 2.0 * dz_re * dz_im + dc_im;
        dz_re = new_dz_re;
        dz_im = new_dz_im;
        m += 1;

        let Some(&(ref_re, ref_im)) = reference.get(m) else {
            return SENTINEL_NO_ESCAPE;
        };

        let full_re = ref_re + dz_re;
        let full_im = ref_im + dz_im;
        let z_norm_sq = full_re * full_re + full_im * full_im;

        if z_norm_sq > PERTURBATION_BAILOUT_SQ {
            return n;
        }

        if rebase
            && should_rebase(
                z_norm_sq,
                dz_re * dz_re + dz_im * dz_im,
                m,
                reference.len(),
            )
        {
            dz_re = full_re;
            dz_im = full_im;
            m = 0;
        }
    }

    SENTINEL_NO_ESCAPE
}
