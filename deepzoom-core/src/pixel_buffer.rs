use crate::error::try_alloc_vec;
use crate::EngineError;

/// Bytes per pixel in the RGBA8 raster.
pub const BYTES_PER_PIXEL: usize = 4;

pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];

/// Row-major RGBA8 raster with no padding between rows.
///
/// This byte layout is the contract with the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a buffer filled with `fill`.
    ///
    /// Allocation failure is reported, not aborted on.
    pub fn new(width: u32, height: u32, fill: Rgba) -> Result<Self, EngineError> {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        let mut data = try_alloc_vec(len, "pixel buffer")?;
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&fill);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes in one row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.row_stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Overwrite row `y`. `pixels` must hold exactly one row.
    pub fn write_row(&mut self, y: u32, pixels: &[u8]) {
        debug_assert_eq!(pixels.len(), self.row_stride(), "row length mismatch");
        let stride = self.row_stride();
        let start = y as usize * stride;
        self.data[start..start + stride].copy_from_slice(pixels);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }
}
