//! Random noise and despeckling.

use rand::Rng;

use super::map_pixels;
use crate::buffer::check_frame;
use crate::error::EffectError;
use crate::progress::Progress;

/// Parameters for [`add_noise`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    /// Probability that a pixel receives noise, `[0, 1]`.
    pub amount: f32,
    /// Scale of the noise relative to the full channel range, `[0, 1]`.
    pub strength: f32,
    /// Apply one signed delta to all three channels instead of three
    /// independent positive ones.
    pub mono: bool,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            amount: 0.5,
            strength: 0.5,
            mono: false,
        }
    }
}

/// Add random noise to a fraction of the pixels.
///
/// For every pixel a uniform draw `u` decides whether it is hit (`u < amount`).
///
/// ```text
/// mono:   delta = strength · (2·u/amount − 1) · 255      (same for R, G, B)
/// color:  delta_c = strength · u_c · 255                 (fresh u_c per channel)
/// ```
pub fn add_noise<R: Rng>(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    params: NoiseParams,
    rng: &mut R,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    let amount = params.amount.clamp(0.0, 1.0);
    let strength = params.strength.clamp(0.0, 1.0);

    map_pixels(input, output, width, height, progress, |rgb| {
        let u: f32 = rng.random();
        if u >= amount {
            return rgb;
        }
        if params.mono {
            let delta = strength * ((u / amount) * 2.0 - 1.0) * 255.0;
            rgb.map(|c| c + delta)
        } else {
            rgb.map(|c| c + strength * rng.random::<f32>() * 255.0)
        }
    })
}

/// Clamp each channel into the min/max range of its four direct neighbors.
///
/// Isolated specks brighter or darker than every N, S, E, W neighbor are
/// pulled back to the neighborhood's extreme. Border neighbors clamp to the
/// edge pixel. Alpha is copied.
pub fn remove_noise(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let (w, h) = (width as usize, height as usize);
    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = w * h;

    for y in 0..h {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(h - 1);
        for x in 0..w {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(w - 1);
            let neighbors = [
                src[y * w + left],
                src[y * w + right],
                src[up * w + x],
                src[down * w + x],
            ];

            let idx = y * w + x;
            let mut px = src[idx];
            for c in 0..3 {
                let lo = neighbors.iter().map(|n| n[c]).min().unwrap_or(px[c]);
                let hi = neighbors.iter().map(|n| n[c]).max().unwrap_or(px[c]);
                px[c] = px[c].clamp(lo, hi);
            }
            dst[idx] = px;
            progress.step(idx + 1, total)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noisy(input: &PixelBuffer, params: NoiseParams, seed: u64) -> PixelBuffer {
        let mut output = input.blank_like();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        add_noise(
            input.as_bytes(),
            output.as_bytes_mut(),
            input.width(),
            input.height(),
            params,
            &mut rng,
            &mut progress,
        )
        .unwrap();
        output
    }

    #[test]
    fn test_zero_amount_is_identity() {
        let input = PixelBuffer::filled(8, 8, [10, 100, 200, 50]);
        let params = NoiseParams {
            amount: 0.0,
            ..NoiseParams::default()
        };
        assert_eq!(noisy(&input, params, 7), input);
    }

    #[test]
    fn test_same_seed_same_output() {
        let input = PixelBuffer::filled(16, 16, [128, 128, 128, 255]);
        let params = NoiseParams::default();
        assert_eq!(noisy(&input, params, 42), noisy(&input, params, 42));
    }

    #[test]
    fn test_mono_noise_keeps_gray_gray() {
        let input = PixelBuffer::filled(16, 16, [128, 128, 128, 200]);
        let params = NoiseParams {
            amount: 1.0,
            strength: 0.3,
            mono: true,
        };
        let output = noisy(&input, params, 3);
        for px in output.pixels() {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 200);
        }
    }

    #[test]
    fn test_color_noise_only_brightens() {
        let input = PixelBuffer::filled(16, 16, [40, 40, 40, 255]);
        let params = NoiseParams {
            amount: 1.0,
            strength: 0.5,
            mono: false,
        };
        let output = noisy(&input, params, 9);
        assert!(output.pixels().iter().all(|px| px[..3].iter().all(|c| *c >= 40)));
        assert_ne!(output, input);
    }

    #[test]
    fn test_remove_noise_flattens_speck() {
        let mut input = PixelBuffer::filled(3, 3, [50, 60, 70, 255]);
        input.pixels_mut()[4] = [250, 0, 70, 9];
        let mut output = input.blank_like();
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        remove_noise(input.as_bytes(), output.as_bytes_mut(), 3, 3, &mut progress).unwrap();
        assert_eq!(output.pixel(1, 1), Some([50, 60, 70, 9]));
    }

    #[test]
    fn test_remove_noise_keeps_values_inside_range() {
        let mut input = PixelBuffer::new(3, 1);
        input.pixels_mut().copy_from_slice(&[[10, 200, 0, 255], [20, 100, 5, 255], [30, 50, 9, 255]]);
        let mut output = input.blank_like();
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        remove_noise(input.as_bytes(), output.as_bytes_mut(), 3, 1, &mut progress).unwrap();
        assert_eq!(output.pixel(1, 0), Some([20, 100, 5, 255]));
    }
}
