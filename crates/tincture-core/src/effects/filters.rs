//! Convolution-based filters: fixed kernels plus emboss, edge detection, and glow.

use crate::blur::blur_raw;
use crate::buffer::check_frame;
use crate::convolution::{Kernel, convolve_raw};
use crate::error::EffectError;
use crate::progress::Progress;

use super::store;

/// 3×3 high-pass filter.
///
/// ```text
/// a = −clamp(strength, 0, 1)
/// [ a   a     a ]
/// [ a  1−8a   a ]
/// [ a   a     a ]
/// ```
pub fn sharpen_3x3(strength: f32) -> Kernel {
    let a = -strength.clamp(0.0, 1.0);
    Kernel::from_3x3([[a, a, a], [a, 1.0 - 8.0 * a, a], [a, a, a]])
}

/// 5×5 high-pass filter, center `1 − 24a`.
pub fn sharpen_5x5(strength: f32) -> Kernel {
    let a = -strength.clamp(0.0, 1.0);
    let mut rows = [[a; 5]; 5];
    rows[2][2] = 1.0 - 24.0 * a;
    Kernel::from_5x5(rows)
}

/// 3×3 mean filter.
pub fn soften_3x3() -> Kernel {
    Kernel::from_3x3([[1.0 / 9.0; 3]; 3])
}

/// 5×5 mean filter.
pub fn soften_5x5() -> Kernel {
    Kernel::from_5x5([[1.0 / 25.0; 5]; 5])
}

/// Diagonal cross edge detector, meant to be applied inverted.
pub fn cross_edges(strength: f32) -> Kernel {
    let a = strength.clamp(0.0, 1.0) * 5.0;
    Kernel::from_3x3([[0.0, -a, 0.0], [-a, 0.0, a], [0.0, a, 0.0]])
}

pub fn edge_enhance_3x3() -> Kernel {
    let mut rows = [[-1.0 / 9.0; 3]; 3];
    rows[1][1] = 17.0 / 9.0;
    Kernel::from_3x3(rows)
}

pub fn edge_enhance_5x5() -> Kernel {
    let mut rows = [[-1.0 / 25.0; 5]; 5];
    rows[2][2] = 49.0 / 25.0;
    Kernel::from_5x5(rows)
}

/// Laplacian edge detector, meant to be applied inverted and monochrome.
pub fn laplace_3x3() -> Kernel {
    let mut rows = [[-1.0; 3]; 3];
    rows[1][1] = 8.0;
    Kernel::from_3x3(rows)
}

pub fn laplace_5x5() -> Kernel {
    let mut rows = [[-1.0; 5]; 5];
    rows[2][2] = 24.0;
    Kernel::from_5x5(rows)
}

/// Directional emboss kernel.
///
/// ```text
/// x = cos(−angle) · amount,  y = sin(−angle) · amount
/// [ −x−y   −y   x−y ]
/// [  −x     0    x  ]
/// [  y−x    y   x+y ]
/// ```
pub fn emboss_kernel(amount: f32, angle: f32) -> Kernel {
    let x = (-angle).cos() * amount;
    let y = (-angle).sin() * amount;
    Kernel::from_3x3([[-x - y, -y, x - y], [-x, 0.0, x], [y - x, y, y + x]])
}

/// Emboss: convolve with [`emboss_kernel`] and bias the response by 128.
///
/// Progress covers the convolution in `[0, 0.5]` and the bias in `[0.5, 1]`.
pub fn emboss(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    amount: f32,
    angle: f32,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let kernel = emboss_kernel(amount, angle);
    let response = progress.scoped(0.0, 0.5, |p| convolve_raw(&kernel, input, width, height, false, p))?;

    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = dst.len();
    progress.scoped(0.5, 1.0, |p| -> Result<(), EffectError> {
        for (i, (px, sum)) in dst.iter_mut().zip(&response).enumerate() {
            *px = store([128.0 + sum[0], 128.0 + sum[1], 128.0 + sum[2]], src[i][3]);
            p.step(i + 1, total)?;
        }
        Ok(())
    })
}

const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Sobel edge detection rendered dark-on-light.
///
/// ```text
/// out = 255 − 0.8 · (|gx| + |gy|)
/// ```
///
/// Progress: horizontal gradient `[0, 0.4]`, vertical `[0.4, 0.8]`,
/// combination `[0.8, 1]`.
pub fn find_edges(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let gx_kernel = Kernel::from_3x3(SOBEL_X);
    let gy_kernel = Kernel::from_3x3(SOBEL_Y);
    let gx = progress.scoped(0.0, 0.4, |p| convolve_raw(&gx_kernel, input, width, height, false, p))?;
    let gy = progress.scoped(0.4, 0.8, |p| convolve_raw(&gy_kernel, input, width, height, false, p))?;

    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = dst.len();
    progress.scoped(0.8, 1.0, |p| -> Result<(), EffectError> {
        for (i, px) in dst.iter_mut().enumerate() {
            let mut rgb = [0.0f32; 3];
            for c in 0..3 {
                rgb[c] = 255.0 - (gx[i][c].abs() + gy[i][c].abs()) * 0.8;
            }
            *px = store(rgb, src[i][3]);
            p.step(i + 1, total)?;
        }
        Ok(())
    })
}

/// Additive glow: blur the image and add `amount` of the blur back.
///
/// ```text
/// out = min(in + blur(in) · amount, 255)
/// ```
///
/// Progress: blur `[0, 0.8]`, composite `[0.8, 1]`.
pub fn glow(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    amount: f32,
    kernel_size: usize,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let blurred = progress.scoped(0.0, 0.8, |p| blur_raw(input, width, height, kernel_size, p))?;

    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = dst.len();
    progress.scoped(0.8, 1.0, |p| -> Result<(), EffectError> {
        for (i, px) in dst.iter_mut().enumerate() {
            let s = src[i];
            let mut rgb = [0.0f32; 3];
            for c in 0..3 {
                rgb[c] = (s[c] as f32 + blurred[i][c] * amount).min(255.0);
            }
            *px = store(rgb, s[3]);
            p.step(i + 1, total)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_fixed_kernels_are_normalized_where_expected() {
        for kernel in [
            sharpen_3x3(0.7),
            sharpen_5x5(0.2),
            soften_3x3(),
            soften_5x5(),
            edge_enhance_3x3(),
            edge_enhance_5x5(),
        ] {
            assert!((kernel.sum() - 1.0).abs() < EPSILON, "sum {}", kernel.sum());
        }
        for kernel in [laplace_3x3(), laplace_5x5(), cross_edges(0.5)] {
            assert!(kernel.sum().abs() < EPSILON);
        }
    }

    #[test]
    fn test_sharpen_center_weight() {
        assert!((sharpen_3x3(0.5).weight(1, 1) - 5.0).abs() < EPSILON);
        assert!((sharpen_5x5(1.0).weight(2, 2) - 25.0).abs() < EPSILON);
        assert!((sharpen_3x3(4.0).weight(0, 0) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_emboss_kernel_at_zero_angle() {
        let k = emboss_kernel(1.0, 0.0);
        assert!((k.weight(1, 0) + 1.0).abs() < EPSILON);
        assert!((k.weight(1, 2) - 1.0).abs() < EPSILON);
        assert!(k.weight(0, 1).abs() < EPSILON);
        assert!((k.weight(2, 2) - 1.0).abs() < EPSILON);
    }

    fn run(
        f: impl FnOnce(&[u8], &mut [u8], u32, u32, &mut Progress<'_>) -> Result<(), EffectError>,
        input: &PixelBuffer,
    ) -> (PixelBuffer, Vec<f32>) {
        let mut output = input.blank_like();
        let mut seen = Vec::new();
        let mut sink = |p: f32| seen.push(p);
        let mut progress = Progress::new(&mut sink);
        f(
            input.as_bytes(),
            output.as_bytes_mut(),
            input.width(),
            input.height(),
            &mut progress,
        )
        .unwrap();
        (output, seen)
    }

    #[test]
    fn test_flat_image_embosses_to_mid_gray() {
        let input = PixelBuffer::filled(4, 4, [30, 200, 90, 140]);
        let (output, seen) = run(|i, o, w, h, p| emboss(i, o, w, h, 1.0, 0.7, p), &input);
        assert!(output.pixels().iter().all(|px| *px == [128, 128, 128, 140]));
        assert_eq!(seen.last().copied(), Some(1.0));
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let input = PixelBuffer::filled(4, 4, [30, 200, 90, 255]);
        let (output, seen) = run(find_edges, &input);
        assert!(output.pixels().iter().all(|px| *px == [255, 255, 255, 255]));
        assert!(seen.iter().any(|p| (*p - 0.4).abs() < EPSILON));
        assert!(seen.iter().any(|p| (*p - 0.8).abs() < EPSILON));
    }

    #[test]
    fn test_vertical_edge_darkens() {
        let mut input = PixelBuffer::filled(4, 3, [0, 0, 0, 255]);
        for y in 0..3 {
            for x in 2..4 {
                input.pixels_mut()[y * 4 + x] = [100, 100, 100, 255];
            }
        }
        let (output, _) = run(find_edges, &input);
        // gx = 4 · 100 at the boundary columns, gy = 0: 255 − 320 clamps to 0.
        assert_eq!(output.pixel(1, 1).unwrap()[0], 0);
        assert_eq!(output.pixel(0, 1).unwrap()[0], 255);
    }

    #[test]
    fn test_glow_adds_blur_and_saturates() {
        let input = PixelBuffer::filled(3, 3, [100, 200, 0, 77]);
        let (output, seen) = run(|i, o, w, h, p| glow(i, o, w, h, 0.5, 5, p), &input);
        assert!(output.pixels().iter().all(|px| *px == [150, 255, 0, 77]));
        assert!(seen.iter().any(|p| (*p - 0.8).abs() < EPSILON));
        assert_eq!(seen.last().copied(), Some(1.0));
    }
}
