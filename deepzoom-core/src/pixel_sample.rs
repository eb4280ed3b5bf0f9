use serde::{Deserialize, Serialize};

/// Escape time returned by every iteration formula when a sample never escapes.
///
/// One canonical value for the whole pipeline; colorizers and tests compare
/// against this constant only.
pub const SENTINEL_NO_ESCAPE: u32 = u32::MAX;

/// Whether an escape time denotes an escaped sample.
#[inline]
pub fn escaped(iterations: u32) -> bool {
    iterations != SENTINEL_NO_ESCAPE
}

/// Frame-relative sample offset in double precision.
///
/// Samples span [-2, 2) horizontally. The vertical axis is normalized by the
/// image width too, so non-square images keep a square pixel aspect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSample {
    pub re: f64,
    pub im: f64,
}

impl PixelSample {
    /// Map pixel `(x, y)` of a `width x height` image to its sample offset.
    ///
    /// Samples sit at pixel centers.
    #[inline]
    pub fn from_pixel(x: u32, y: u32, width: u32, height: u32) -> Self {
        let scale = 4.0 / width as f64;
        Self {
            re: (x as f64 + 0.5 - width as f64 / 2.0) * scale,
            im: (y as f64 + 0.5 - height as f64 / 2.0) * scale,
        }
    }
}
