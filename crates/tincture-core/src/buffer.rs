//! RGBA8 pixel buffer shared by every transform.

use std::fmt;

use image::RgbaImage;

use crate::error::BufferError;

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Number of bytes a `width × height` RGBA8 image occupies.
pub const fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

/// Convert an accumulated channel value to storage.
///
/// Rounds to nearest with ties to even, the way canvas image data stores
/// fractional channel writes, then clamps to `[0, 255]`. NaN stores as 0.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Row-major RGBA8 image, 4 bytes per pixel, top row first.
///
/// The byte length always equals `width * height * 4`.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A fully transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// A buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.pixels_mut().fill(rgba);
        buffer
    }

    /// Wrap raw RGBA8 bytes, checking the length against the dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A zeroed buffer with the same dimensions as `self`.
    pub fn blank_like(&self) -> Self {
        Self::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel view over the bytes.
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// The pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels()[y as usize * self.width as usize + x as usize])
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

impl TryFrom<PixelBuffer> for RgbaImage {
    type Error = BufferError;

    fn try_from(buffer: PixelBuffer) -> Result<Self, Self::Error> {
        let (width, height) = buffer.dimensions();
        let actual = buffer.data.len();
        RgbaImage::from_raw(width, height, buffer.data).ok_or(BufferError::SizeMismatch {
            width,
            height,
            expected: byte_len(width, height),
            actual,
        })
    }
}

pub(crate) fn check_len(width: u32, height: u32, actual: usize) -> Result<(), BufferError> {
    let expected = byte_len(width, height);
    if actual != expected {
        return Err(BufferError::SizeMismatch {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Validate an input/output pair for a `width × height` transform.
pub fn check_frame(input: &[u8], output: &[u8], width: u32, height: u32) -> Result<(), BufferError> {
    if input.len() != output.len() {
        return Err(BufferError::DimensionMismatch {
            input: input.len(),
            output: output.len(),
        });
    }
    check_len(width, height, input.len())
}
