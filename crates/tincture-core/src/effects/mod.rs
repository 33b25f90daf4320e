//! Built-in transforms.
//!
//! [`color`] holds the per-pixel formulas, the other modules work on whole
//! buffers. Every buffer-level transform reads only its input slice, writes
//! only its output slice, and copies alpha unless documented otherwise.

pub mod color;
pub mod filters;
pub mod geometry;
pub mod noise;

use crate::buffer::{check_frame, to_channel};
use crate::error::EffectError;
use crate::progress::Progress;

/// Round and clamp float RGB for storage, keeping `alpha`.
#[inline]
pub(crate) fn store(rgb: [f32; 3], alpha: u8) -> [u8; 4] {
    [to_channel(rgb[0]), to_channel(rgb[1]), to_channel(rgb[2]), alpha]
}

/// Apply a per-pixel RGB formula across a buffer in raster order.
///
/// `f` receives channels as `[0, 255]` floats; its result is rounded and
/// clamped. Alpha is copied from the input.
pub fn map_pixels(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
    mut f: impl FnMut([f32; 3]) -> [f32; 3],
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = src.len();

    for (i, (s, d)) in src.iter().zip(dst.iter_mut()).enumerate() {
        let rgb = f([s[0] as f32, s[1] as f32, s[2] as f32]);
        *d = store(rgb, s[3]);
        progress.step(i + 1, total)?;
    }
    Ok(())
}
