//! Perturbation theory computation for deep Mandelbrot zoom.
//!
//! Computes one reference orbit at high precision, then uses fast f64
//! delta iterations for individual pixels.

mod pixel;
mod reference_orbit;

pub use pixel::{compute_pixel_perturbation, should_rebase, PERTURBATION_BAILOUT_SQ};
pub use reference_orbit::{ReferenceOrbit, ORBIT_ESCAPE_RADIUS_SQ};

#[cfg(test)]
mod tests;
