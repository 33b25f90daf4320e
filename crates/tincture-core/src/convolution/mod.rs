//! Spatial convolution with edge-clamped sampling.
//!
//! Every output pixel is the kernel-weighted sum of its neighborhood:
//!
//! ```text
//! out(x, y) = Σ  K[r][c] · in(clamp(x + c - R, 0, W-1), clamp(y + r - R, 0, H-1))
//!            r,c
//! ```
//!
//! where `R` is the kernel radius. Samples past the border repeat the edge
//! pixel; the image is never zero-padded and never wraps.

mod kernel;

pub use kernel::Kernel;

use crate::buffer::{check_frame, to_channel};
use crate::error::EffectError;
use crate::progress::Progress;

/// Post-processing switches for [`convolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvolveOptions {
    /// Convolve alpha too; otherwise alpha is copied from the input pixel.
    pub apply_to_alpha: bool,
    /// Replace each color channel with `255 - value` after convolving.
    pub invert: bool,
    /// Replace R, G, B with their average after inversion.
    pub monochrome: bool,
}

impl ConvolveOptions {
    pub fn inverted() -> Self {
        Self {
            invert: true,
            ..Self::default()
        }
    }

    pub fn inverted_monochrome() -> Self {
        Self {
            invert: true,
            monochrome: true,
            ..Self::default()
        }
    }
}

#[inline]
fn clamp_coord(coord: isize, len: usize) -> usize {
    coord.clamp(0, len as isize - 1) as usize
}

/// Weighted neighborhood sum for the pixel at `(x, y)`.
fn accumulate(
    kernel: &Kernel,
    pixels: &[[u8; 4]],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    apply_to_alpha: bool,
) -> [f32; 4] {
    let radius = kernel.radius() as isize;
    let mut sum = [0.0f32; 4];
    for row in 0..kernel.size() {
        let sy = clamp_coord(y as isize + row as isize - radius, height);
        let line = &pixels[sy * width..(sy + 1) * width];
        for col in 0..kernel.size() {
            let weight = kernel.weight(row, col);
            if weight == 0.0 {
                continue;
            }
            let sx = clamp_coord(x as isize + col as isize - radius, width);
            let px = line[sx];
            sum[0] += weight * px[0] as f32;
            sum[1] += weight * px[1] as f32;
            sum[2] += weight * px[2] as f32;
            if apply_to_alpha {
                sum[3] += weight * px[3] as f32;
            }
        }
    }
    if !apply_to_alpha {
        sum[3] = pixels[y * width + x][3] as f32;
    }
    sum
}

/// Convolve `input` into `output`, both `width × height` RGBA8.
///
/// Channels are accumulated in floating point, then `invert` and
/// `monochrome` are applied in that order, and the result is rounded and
/// clamped to `[0, 255]` for storage.
pub fn convolve(
    kernel: &Kernel,
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    options: ConvolveOptions,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let (w, h) = (width as usize, height as usize);
    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = w * h;

    for y in 0..h {
        for x in 0..w {
            let mut sum = accumulate(kernel, src, w, h, x, y, options.apply_to_alpha);
            if options.invert {
                for channel in &mut sum[..3] {
                    *channel = 255.0 - *channel;
                }
            }
            if options.monochrome {
                let avg = (sum[0] + sum[1] + sum[2]) / 3.0;
                sum[..3].fill(avg);
            }
            let idx = y * w + x;
            dst[idx] = sum.map(to_channel);
            progress.step(idx + 1, total)?;
        }
    }
    Ok(())
}

/// Convolve without clamping, returning the raw per-channel sums.
///
/// Used by effects that post-process the signed response (emboss, edge
/// detection). Alpha holds the input alpha unless `apply_to_alpha` is set.
pub fn convolve_raw(
    kernel: &Kernel,
    input: &[u8],
    width: u32,
    height: u32,
    apply_to_alpha: bool,
    progress: &mut Progress<'_>,
) -> Result<Vec<[f32; 4]>, EffectError> {
    crate::buffer::check_len(width, height, input.len())?;
    let (w, h) = (width as usize, height as usize);
    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let total = w * h;
    let mut out = Vec::with_capacity(total);

    for y in 0..h {
        for x in 0..w {
            out.push(accumulate(kernel, src, w, h, x, y, apply_to_alpha));
            progress.step(out.len(), total)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;

    fn run(kernel: &Kernel, input: &PixelBuffer, options: ConvolveOptions) -> PixelBuffer {
        let mut output = input.blank_like();
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        convolve(
            kernel,
            input.as_bytes(),
            output.as_bytes_mut(),
            input.width(),
            input.height(),
            options,
            &mut progress,
        )
        .unwrap();
        output
    }

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let data = (0..width * height)
            .flat_map(|i| {
                let v = (i * 37 % 256) as u8;
                [v, v.wrapping_mul(3), 255 - v, 200]
            })
            .collect();
        PixelBuffer::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_identity_kernel_is_identity() {
        let input = gradient(5, 4);
        for size in [3, 5] {
            let kernel = Kernel::identity(size).unwrap();
            assert_eq!(run(&kernel, &input, ConvolveOptions::default()), input);
        }
    }

    #[test]
    fn test_edges_replicate_rather_than_zero_pad() {
        // Uniform kernel over a uniform image must stay uniform at the borders.
        let input = PixelBuffer::filled(4, 3, [90, 120, 30, 255]);
        let kernel = Kernel::uniform(5, 1.0 / 25.0).unwrap();
        let output = run(&kernel, &input, ConvolveOptions::default());
        assert!(output.pixels().iter().all(|p| *p == [90, 120, 30, 255]));
    }

    #[test]
    fn test_rows_clamp_against_height() {
        // Taller than wide: a shift-up kernel at the bottom row reads the last row.
        let mut input = PixelBuffer::new(2, 4);
        for (i, px) in input.pixels_mut().iter_mut().enumerate() {
            *px = [(i / 2) as u8 * 10, 0, 0, 255];
        }
        let kernel = Kernel::from_3x3([[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let output = run(&kernel, &input, ConvolveOptions::default());
        assert_eq!(output.pixel(0, 0).unwrap()[0], 10);
        assert_eq!(output.pixel(0, 3).unwrap()[0], 30);
    }

    #[test]
    fn test_alpha_copied_unless_requested() {
        let input = PixelBuffer::filled(3, 3, [10, 10, 10, 77]);
        let kernel = Kernel::uniform(3, 2.0).unwrap();
        let copied = run(&kernel, &input, ConvolveOptions::default());
        assert_eq!(copied.pixel(1, 1), Some([180, 180, 180, 77]));

        let options = ConvolveOptions {
            apply_to_alpha: true,
            ..ConvolveOptions::default()
        };
        let convolved = run(&kernel, &input, options);
        assert_eq!(convolved.pixel(1, 1), Some([180, 180, 180, 255]));
    }

    #[test]
    fn test_invert_then_monochrome() {
        let input = PixelBuffer::filled(2, 2, [0, 30, 60, 255]);
        let kernel = Kernel::identity(3).unwrap();
        let output = run(&kernel, &input, ConvolveOptions::inverted_monochrome());
        // 255 - (0, 30, 60) = (255, 225, 195), averaged to 225.
        assert_eq!(output.pixel(0, 0), Some([225, 225, 225, 255]));
    }

    #[test]
    fn test_raw_keeps_signed_response() {
        let mut input = PixelBuffer::filled(3, 1, [0, 0, 0, 255]);
        input.pixels_mut()[2] = [100, 100, 100, 255];
        let kernel = Kernel::from_3x3([[0.0, 0.0, 0.0], [-1.0, 0.0, 1.0], [0.0, 0.0, 0.0]]);
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        let raw = convolve_raw(&kernel, input.as_bytes(), 3, 1, false, &mut progress).unwrap();
        assert_eq!(raw[1][0], 100.0);
        assert_eq!(raw[2][0], 0.0);
        assert_eq!(raw[0][3], 255.0);

        let flipped = Kernel::from_3x3([[0.0, 0.0, 0.0], [1.0, 0.0, -1.0], [0.0, 0.0, 0.0]]);
        let raw = convolve_raw(&flipped, input.as_bytes(), 3, 1, false, &mut progress).unwrap();
        assert_eq!(raw[1][0], -100.0);
    }

    #[test]
    fn test_mismatched_buffers_rejected() {
        let kernel = Kernel::identity(3).unwrap();
        let input = [0u8; 16];
        let mut output = [0u8; 12];
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        let result = convolve(
            &kernel,
            &input,
            &mut output,
            2,
            2,
            ConvolveOptions::default(),
            &mut progress,
        );
        assert!(matches!(result, Err(EffectError::Buffer(_))));
    }
}
