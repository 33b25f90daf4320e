//! Brightness histogram.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;

/// Pixel counts per average-brightness level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin `i` counts pixels whose rounded `(R + G + B) / 3` equals `i`.
    /// Always 256 entries.
    pub values: Vec<u32>,
    /// Largest bin count (for normalization).
    pub max_value: u32,
}

/// Compute the brightness histogram of `buffer`. Alpha is ignored.
pub fn compute(buffer: &PixelBuffer) -> Histogram {
    let mut values = vec![0u32; 256];
    for px in buffer.pixels() {
        let sum = px[0] as usize + px[1] as usize + px[2] as usize;
        // A third never lands on .5, so this is round-to-nearest.
        values[(sum + 1) / 3] += 1;
    }
    let max_value = values.iter().copied().max().unwrap_or(0);
    Histogram { values, max_value }
}
