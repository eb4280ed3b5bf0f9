pub mod bigfloat;
pub mod colormap;
pub mod config;
pub mod error;
pub mod frame;
pub mod pixel_buffer;
pub mod pixel_sample;
pub mod precision;

pub use bigfloat::BigFloat;
pub use colormap::ColorMapper;
pub use config::{EngineConfig, FormulaKind, DEFAULT_ENGINE_CONFIG};
pub use error::EngineError;
pub use frame::Frame;
pub use pixel_buffer::{PixelBuffer, Rgba, BLACK, BYTES_PER_PIXEL};
pub use pixel_sample::{escaped, PixelSample, SENTINEL_NO_ESCAPE};
pub use precision::precision_bits_for_zoom;
