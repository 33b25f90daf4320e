//! Mirror flips.
//!
//! Names follow the axis that moves: [`flip_horizontal`] swaps left and
//! right (column `x` goes to `width − 1 − x`), [`flip_vertical`] swaps top
//! and bottom (row `y` goes to `height − 1 − y`).

use crate::buffer::check_frame;
use crate::error::EffectError;
use crate::progress::Progress;

/// Mirror columns.
pub fn flip_horizontal(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    remap(input, output, width, height, progress, |x, y, w, _| (w - 1 - x, y))
}

/// Mirror rows.
pub fn flip_vertical(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    remap(input, output, width, height, progress, |x, y, _, h| (x, h - 1 - y))
}

/// Copy each input pixel `(x, y)` to `dest(x, y, w, h)` in the output.
fn remap(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
    dest: impl Fn(usize, usize, usize, usize) -> (usize, usize),
) -> Result<(), EffectError> {
    check_frame(input, output, width, height)?;
    let (w, h) = (width as usize, height as usize);
    let src: &[[u8; 4]] = bytemuck::cast_slice(input);
    let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(output);
    let total = w * h;

    for y in 0..h {
        for x in 0..w {
            let (dx, dy) = dest(x, y, w, h);
            let idx = y * w + x;
            dst[dy * w + dx] = src[idx];
            progress.step(idx + 1, total)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelBuffer;

    type Flip = fn(&[u8], &mut [u8], u32, u32, &mut Progress<'_>) -> Result<(), EffectError>;

    fn run(flip: Flip, input: &PixelBuffer) -> PixelBuffer {
        let mut output = input.blank_like();
        let mut sink = |_: f32| {};
        let mut progress = Progress::new(&mut sink);
        flip(
            input.as_bytes(),
            output.as_bytes_mut(),
            input.width(),
            input.height(),
            &mut progress,
        )
        .unwrap();
        output
    }

    fn numbered(width: u32, height: u32) -> PixelBuffer {
        let data = (0..width * height).flat_map(|i| [i as u8, 0, 0, 255]).collect();
        PixelBuffer::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_horizontal_moves_columns() {
        let output = run(flip_horizontal, &numbered(3, 2));
        assert_eq!(output.pixel(0, 0).unwrap()[0], 2);
        assert_eq!(output.pixel(2, 0).unwrap()[0], 0);
        assert_eq!(output.pixel(0, 1).unwrap()[0], 5);
    }

    #[test]
    fn test_vertical_moves_rows() {
        let output = run(flip_vertical, &numbered(3, 2));
        assert_eq!(output.pixel(0, 0).unwrap()[0], 3);
        assert_eq!(output.pixel(2, 1).unwrap()[0], 2);
    }

    #[test]
    fn test_flips_are_involutions() {
        let input = numbered(5, 3);
        for flip in [flip_horizontal as Flip, flip_vertical as Flip] {
            assert_eq!(run(flip, &run(flip, &input)), input);
        }
    }
}
