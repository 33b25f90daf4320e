//! Drawing surfaces the engine reads pixels from and paints results onto.

use image::RgbaImage;

use crate::buffer::PixelBuffer;
use crate::error::SurfaceError;

/// A 2D RGBA8 surface owned by the host viewer.
pub trait Surface {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Copy the `width × height` region at `(x, y)` out of the surface.
    fn read_pixels(&self, x: u32, y: u32, width: u32, height: u32)
    -> Result<PixelBuffer, SurfaceError>;

    /// Paint `buffer` with its top-left corner at `(x, y)`.
    fn write_pixels(&mut self, buffer: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError>;
}

fn check_region(
    surface: (u32, u32),
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<(), SurfaceError> {
    let fits_x = x.checked_add(width).is_some_and(|end| end <= surface.0);
    let fits_y = y.checked_add(height).is_some_and(|end| end <= surface.1);
    if fits_x && fits_y {
        Ok(())
    } else {
        Err(SurfaceError::OutOfBounds {
            x,
            y,
            width,
            height,
            surface_width: surface.0,
            surface_height: surface.1,
        })
    }
}

/// In-memory surface backed by an [`RgbaImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSurface {
    image: RgbaImage,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl From<RgbaImage> for ImageSurface {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}

impl From<PixelBuffer> for ImageSurface {
    fn from(buffer: PixelBuffer) -> Self {
        let mut surface = Self::new(buffer.width(), buffer.height());
        let bytes: &mut [u8] = &mut surface.image;
        bytes.copy_from_slice(buffer.as_bytes());
        surface
    }
}

impl Surface for ImageSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn read_pixels(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, SurfaceError> {
        check_region(self.dimensions(), x, y, width, height)?;
        let stride = self.image.width() as usize * 4;
        let row = width as usize * 4;
        let mut data = Vec::with_capacity(row * height as usize);
        let bytes: &[u8] = &self.image;
        for yy in y as usize..(y + height) as usize {
            let start = yy * stride + x as usize * 4;
            data.extend_from_slice(&bytes[start..start + row]);
        }
        Ok(PixelBuffer::from_raw(width, height, data)?)
    }

    fn write_pixels(&mut self, buffer: &PixelBuffer, x: u32, y: u32) -> Result<(), SurfaceError> {
        let (width, height) = buffer.dimensions();
        check_region(self.dimensions(), x, y, width, height)?;
        let stride = self.image.width() as usize * 4;
        let row = width as usize * 4;
        let bytes: &mut [u8] = &mut self.image;
        for (i, src) in buffer.as_bytes().chunks_exact(row.max(1)).enumerate() {
            let start = (y as usize + i) * stride + x as usize * 4;
            bytes[start..start + row].copy_from_slice(src);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> ImageSurface {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([x as u8, y as u8, (x + y) as u8, 255])
        });
        ImageSurface::from(image)
    }

    #[test]
    fn test_read_region() {
        let surface = checker(4, 3);
        let region = surface.read_pixels(1, 1, 2, 2).unwrap();
        assert_eq!(region.dimensions(), (2, 2));
        assert_eq!(region.pixel(0, 0), Some([1, 1, 2, 255]));
        assert_eq!(region.pixel(1, 1), Some([2, 2, 4, 255]));
    }

    #[test]
    fn test_read_out_of_bounds_fails() {
        let surface = checker(4, 3);
        assert!(matches!(
            surface.read_pixels(3, 0, 2, 1),
            Err(SurfaceError::OutOfBounds { .. })
        ));
        assert!(surface.read_pixels(u32::MAX, 0, 2, 1).is_err());
    }

    #[test]
    fn test_write_then_read_back() {
        let mut surface = checker(4, 4);
        let patch = PixelBuffer::filled(2, 1, [9, 9, 9, 9]);
        surface.write_pixels(&patch, 2, 3).unwrap();
        assert_eq!(surface.read_pixels(2, 3, 2, 1).unwrap(), patch);
        assert_eq!(surface.image().get_pixel(1, 3).0, [1, 3, 4, 255]);
    }

    #[test]
    fn test_full_frame_roundtrip_through_buffer() {
        let surface = checker(3, 2);
        let buffer = surface.read_pixels(0, 0, 3, 2).unwrap();
        assert_eq!(ImageSurface::from(buffer), surface);
    }
}
