use crate::pixel_buffer::{Rgba, BLACK};
use crate::pixel_sample::SENTINEL_NO_ESCAPE;
use serde::{Deserialize, Serialize};

/// Deterministic mapping from escape time to display color.
///
/// Samples that never escape are always opaque black.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorMapper {
    /// Fully saturated hue advancing a fixed number of degrees per iteration.
    HueCycle { degrees_per_iteration: u32 },
    /// Brightness proportional to escape time.
    Grayscale { max_iterations: u32 },
}

impl Default for ColorMapper {
    fn default() -> Self {
        ColorMapper::HueCycle {
            degrees_per_iteration: 36,
        }
    }
}

impl ColorMapper {
    pub fn color(&self, iterations: u32) -> Rgba {
        if iterations == SENTINEL_NO_ESCAPE {
            return BLACK;
        }

        match *self {
            ColorMapper::HueCycle {
                degrees_per_iteration,
            } => {
                // Widen so large escape times cannot wrap before the modulo
                let hue = (iterations as u64 * degrees_per_iteration as u64) % 360;
                hsv_to_rgba(hue as f32, 1.0, 1.0)
            }
            ColorMapper::Grayscale { max_iterations } => {
                if max_iterations == 0 {
                    return BLACK;
                }
                let normalized = (iterations as f64 / max_iterations as f64).min(1.0);
                let gray = (normalized * 255.0) as u8;
                [gray, gray, gray, 255]
            }
        }
    }
}

/// HSV to opaque RGBA. Hue in degrees, saturation and value in [0, 1].
fn hsv_to_rgba(hue: f32, saturation: f32, value: f32) -> Rgba {
    let channel = |offset: f32| -> u8 {
        let k = (offset + hue / 60.0) % 6.0;
        let k = k.min(4.0 - k).clamp(0.0, 1.0);
        ((value - value * saturation * k) * 255.0) as u8
    };
    [channel(5.0), channel(3.0), channel(1.0), 255]
}
