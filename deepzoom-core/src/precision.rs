//! Precision calculation for deep-zoom rendering.
//!
//! Determines how many mantissa bits the reference orbit needs to
//! accurately track a frame center at a given zoom and resolution.

/// Safety margin for rounding errors in arithmetic operations.
const SAFETY_BITS: u64 = 64;

/// Width of the sample plane in sample units (samples span [-2, 2)).
const SAMPLE_SPAN_LOG2: f64 = 2.0;

/// Calculate required precision bits for a frame.
///
/// The reference orbit needs enough bits to:
/// 1. Distinguish adjacent pixels at the frame's zoom (`4 / (zoom * width)` apart)
/// 2. Survive error amplification over many iterations
///
/// # Arguments
/// * `zoom_log10` - log10 of the frame zoom (20.0 for a zoom of 1e20)
/// * `canvas_width` - horizontal resolution in pixels
/// * `iteration_cap` - maximum iterations per pixel
///
/// # Returns
/// Required precision bits, rounded up to a power of 2, minimum 64.
pub fn precision_bits_for_zoom(zoom_log10: f64, canvas_width: u32, iteration_cap: u32) -> usize {
    let log2_zoom = (zoom_log10 * std::f64::consts::LOG2_10).max(0.0);
    let log2_pixels = (canvas_width.max(1) as f64).log2();

    // Pixel spacing is span / (zoom * width); the span adds its own bits on top
    let bits_from_ratio = (log2_zoom + log2_pixels + SAMPLE_SPAN_LOG2).ceil() as u64;

    let iter_bits = if iteration_cap > 1 {
        (iteration_cap as f64).log2().ceil() as u64
    } else {
        0
    };

    let total_bits = bits_from_ratio + iter_bits + SAFETY_BITS;

    (total_bits as usize).next_power_of_two().max(64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_at_1x_zoom_is_reasonable() {
        let bits = precision_bits_for_zoom(0.0, 3840, 1000);
        assert!(bits >= 64);
        assert!(bits <= 256);
    }

    #[test]
    fn precision_increases_with_zoom() {
        let bits_1x = precision_bits_for_zoom(0.0, 1920, 10_000);
        let bits_deep = precision_bits_for_zoom(20.0, 1920, 10_000);
        // 10^20 needs roughly 66 more bits
        assert!(bits_deep > bits_1x, "Expected {} > {}", bits_deep, bits_1x);
    }

    #[test]
    fn precision_at_extreme_zoom() {
        // ~1661 bits for 10^500 plus margins
        let bits = precision_bits_for_zoom(500.0, 1920, 10_000);
        assert!(bits >= 1024);
        assert!(bits <= 4096);
    }

    #[test]
    fn precision_is_power_of_two() {
        let bits = precision_bits_for_zoom(37.0, 1920, 40_000);
        assert!(bits.is_power_of_two());
    }

    #[test]
    fn precision_minimum_is_64() {
        let bits = precision_bits_for_zoom(-3.0, 1, 0);
        assert!(bits >= 64);
        assert!(bits <= 128);
    }
}
