//! Separable Gaussian blur.
//!
//! The 1D weights are a normalized row of Pascal's triangle, which
//! approximates a Gaussian:
//!
//! ```text
//! w[i] = C(n - 1, i) / 2^(n - 1),   n = kernel size, i in 0..n
//! ```
//!
//! A horizontal pass writes floating-point sums into a temporary buffer and a
//! vertical pass reads that buffer into the output. Both passes clamp sample
//! coordinates at the image border. All four channels are blurred.

use crate::buffer::{check_frame, check_len, to_channel};
use crate::error::EffectError;
use crate::progress::Progress;

/// Smallest supported kernel size.
pub const MIN_KERNEL_SIZE: usize = 3;

/// Largest supported kernel size.
pub const MAX_KERNEL_SIZE: usize = 13;

/// Normalized binomial weights for `kernel_size`, clamped to `[3, 13]`.
pub fn binomial_weights(kernel_size: usize) -> Vec<f32> {
    let n = kernel_size.clamp(MIN_KERNEL_SIZE, MAX_KERNEL_SIZE);
    let mut row = vec![1u64; 1];
    for _ in 1..n {
        let mut next = vec![1u64; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    let total: u64 = row.iter().sum();
    row.into_iter()
        .map(|c| (c as f64 / total as f64) as f32)
        .collect()
}

/// First tap offset relative to the center pixel.
///
/// Odd sizes are centered; even sizes lean one tap toward negative offsets.
fn first_offset(n: usize) -> isize {
    -((n / 2) as isize)
}

/// Blur `input` and return unrounded per-channel values.
///
/// Pass 1 reports within `[0, 0.5)` of `progress`, pass 2 within `[0.5, 1]`.
pub fn blur_raw(
    input: &[u8],
    width: u32,
    height: u32,
    kernel_size: usize,
    progress: &mut Progress<'_>,
) -> Result<Vec<[f32; 4]>, EffectError> {
    check_len(width, height, input.len())?;
    let weights = binomial_weights(kernel_size);
    let k1 = first_offset(weights.len());
    let (w, h) = (width as usize, height as usize);
    let total = w * h;
    let src: &[[u8; 4]] = bytemuck::cast_slice(input);

    let mut tmp = vec![[0.0f32; 4]; total];
    progress.scoped(0.0, 0.5, |p| -> Result<(), EffectError> {
        for y in 0..h {
            let line = &src[y * w..(y + 1) * w];
            for x in 0..w {
                let mut sum = [0.0f32; 4];
                for (i, weight) in weights.iter().enumerate() {
                    let sx = (x as isize + k1 + i as isize).clamp(0, w as isize - 1) as usize;
                    let px = line[sx];
                    for c in 0..4 {
                        sum[c] += px[c] as f32 * weight;
                    }
                }
                let idx = y * w + x;
                tmp[idx] = sum;
                p.step(idx, total)?;
            }
        }
        Ok(())
    })?;

    let mut out = vec![[0.0f32; 4]; total];
    progress.scoped(0.5, 1.0, |p| -> Result<(), EffectError> {
        for y in 0..h {
            for x in 0..w {
                let mut sum = [0.0f32; 4];
                for (i, weight) in weights.iter().enumerate() {
                    let sy = (y as isize + k1 + i as isize).clamp(0, h as isize - 1) as usize;
                    let px = tmp[sy * w + x];
                    for c in 0..4 {
                        sum[c] += px[c] * weight;
                    }
                }
                let idx = y * w + x;
                out[idx] = sum;
                p.step(idx + 1, total)?;
            }
        }
        Ok(())
    })?;

    Ok(out)
}

/// Gaussian-blur `input` into `output`, both `width × height` RGBA8.
pub fn gaussian_blur(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    kernel_size: usize,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let blurred = blur_raw(input, width, height, kernel_size, progress)?;
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    for (px, sum) in dst.iter_mut().zip(blurred) {
        *px = sum.map(to_channel);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;

    const EPSILON: f32 = 1e-6;

    fn blur(input: &PixelBuffer, kernel_size: usize) -> (PixelBuffer, Vec<f32>) {
        let mut output = input.blank_like();
        let mut seen = Vec::new();
        let mut sink = |p: f32| seen.push(p);
        let mut progress = Progress::new(&mut sink);
        gaussian_blur(
            input.as_bytes(),
            output.as_bytes_mut(),
            input.width(),
            input.height(),
            kernel_size,
            &mut progress,
        )
        .unwrap();
        (output, seen)
    }

    #[test]
    fn test_weights_follow_pascal_row() {
        let w = binomial_weights(5);
        let expected = [1.0, 4.0, 6.0, 4.0, 1.0].map(|v| v / 16.0);
        assert_eq!(w.len(), 5);
        for (a, b) in w.iter().zip(expected) {
            assert!((a - b).abs() < EPSILON, "{a} vs {b}");
        }
    }

    #[test]
    fn test_kernel_size_is_clamped() {
        assert_eq!(binomial_weights(1).len(), MIN_KERNEL_SIZE);
        assert_eq!(binomial_weights(40).len(), MAX_KERNEL_SIZE);
        let sum: f32 = binomial_weights(13).iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_even_kernel_offsets() {
        assert_eq!(first_offset(3), -1);
        assert_eq!(first_offset(4), -2);
        assert_eq!(first_offset(13), -6);
    }

    #[test]
    fn test_single_bright_pixel_spreads_symmetrically() {
        let mut input = PixelBuffer::filled(5, 5, [0, 0, 0, 255]);
        input.pixels_mut()[12] = [160, 160, 160, 255];
        let (output, _) = blur(&input, 3);
        // Center gets (2/4)^2, edge neighbors (1/4)(2/4), corners (1/4)^2.
        assert_eq!(output.pixel(2, 2).unwrap()[0], 40);
        assert_eq!(output.pixel(1, 2).unwrap()[0], 20);
        assert_eq!(output.pixel(3, 2).unwrap()[0], 20);
        assert_eq!(output.pixel(2, 1).unwrap()[0], 20);
        assert_eq!(output.pixel(1, 1).unwrap()[0], 10);
        assert_eq!(output.pixel(0, 0).unwrap()[0], 0);
    }

    #[test]
    fn test_progress_splits_passes() {
        let input = PixelBuffer::filled(10, 10, [1, 2, 3, 4]);
        let (_, seen) = blur(&input, 5);
        let first_half: Vec<_> = seen.iter().filter(|p| **p < 0.5).collect();
        assert!(!first_half.is_empty());
        assert!(first_half.iter().all(|p| **p <= 0.495 + EPSILON));
        assert!(seen.iter().any(|p| *p > 0.5 && *p < 1.0));
        assert_eq!(seen.last().copied(), Some(1.0));
        for pair in seen.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_one_pixel_image() {
        let input = PixelBuffer::filled(1, 1, [12, 34, 56, 78]);
        let (output, _) = blur(&input, 13);
        assert_eq!(output, input);
    }
}
