//! Per-pixel color formulas.
//!
//! Every function here maps one RGB triple in `[0, 255]` to a new triple.
//! Results may leave that range; storage clamps them. Alpha never passes
//! through these functions and is always copied from the input pixel.

/// Luminance weights used by desaturate and the luminosity color filter.
pub const LUMA: [f32; 3] = [0.3, 0.59, 0.11];

/// Sepia mixing matrix, one row per output channel.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

#[inline]
fn luma(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2]
}

/// `255 − channel`.
pub fn invert(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| 255.0 - c)
}

/// Fixed linear sepia mix.
pub fn sepia(rgb: [f32; 3]) -> [f32; 3] {
    SEPIA.map(|row| row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2])
}

/// Channels above 127 are inverted, the rest pass through.
pub fn solarize(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|c| if c > 127.0 { 255.0 - c } else { c })
}

/// Replace each channel with `0.3 R + 0.59 G + 0.11 B`.
pub fn desaturate(rgb: [f32; 3]) -> [f32; 3] {
    [luma(rgb); 3]
}

/// Multiply by `1 + amount`, with `amount` clamped to `[0, 1]`.
pub fn lighten(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let mul = 1.0 + amount.clamp(0.0, 1.0);
    rgb.map(|c| c * mul)
}

/// Add a per-channel offset. Offsets are clamped to `[-1, 1]` and scaled to
/// `[-255, 255]`.
pub fn color_adjust(rgb: [f32; 3], offsets: [f32; 3]) -> [f32; 3] {
    let mut out = rgb;
    for c in 0..3 {
        out[c] += offsets[c].clamp(-1.0, 1.0) * 255.0;
    }
    out
}

/// Brightness and contrast around the midpoint.
///
/// ```text
/// b        = 1 + clamp(brightness, -1, 1)
/// k        = 0.5 · tan((clamp(contrast, -1, 1) / 2 + 1) · π/4)
/// out      = (in + in·b + b) · k − (k − 0.5) · 255
/// ```
///
/// With both parameters at 0 this yields `in + 0.5`, which rounds back to
/// within one unit of the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessContrast {
    bright_mul: f32,
    bright_add: f32,
    contrast: f32,
    contrast_add: f32,
}

impl BrightnessContrast {
    pub fn new(brightness: f32, contrast: f32) -> Self {
        let b = 1.0 + brightness.clamp(-1.0, 1.0);
        let half = contrast.clamp(-1.0, 1.0) / 2.0;
        let k = 0.5 * ((half + 1.0) * std::f32::consts::FRAC_PI_4).tan();
        Self {
            bright_mul: b,
            bright_add: b,
            contrast: k,
            contrast_add: -(k - 0.5) * 255.0,
        }
    }

    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        rgb.map(|c| (c + c * self.bright_mul + self.bright_add) * self.contrast + self.contrast_add)
    }
}

/// Multiplicative per-channel filter with optional luminosity preservation.
///
/// Each channel becomes `(c + c · amount) / 2`. With `luminosity` set, the
/// filtered hue and chroma are recombined around the original pixel's
/// luminance using sextant-based hue reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFilter {
    amounts: [f32; 3],
    luminosity: bool,
}

impl ColorFilter {
    pub fn new(amounts: [f32; 3], luminosity: bool) -> Self {
        Self {
            amounts: amounts.map(|a| a.clamp(0.0, 1.0)),
            luminosity,
        }
    }

    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let unit = rgb.map(|c| c / 255.0);
        let l = luma(unit);
        let mut out = [0.0f32; 3];
        for c in 0..3 {
            out[c] = (unit[c] + unit[c] * self.amounts[c]) / 2.0;
        }

        if self.luminosity {
            out = recombine_luminosity(out, l);
        }
        out.map(|c| c * 255.0)
    }
}

/// Rebuild `rgb` (in `[0, 1]`) from its hue and chroma so that its
/// luminance offset matches `target_luma`.
fn recombine_luminosity(rgb: [f32; 3], target_luma: f32) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    // Gray has no hue; take sextant 0 instead of dividing by zero.
    let h = if chroma == 0.0 {
        0.0
    } else if r == max {
        ((g - b) / chroma) % 6.0
    } else if g == max {
        (b - r) / chroma + 2.0
    } else {
        (r - g) / chroma + 4.0
    };

    let sextant = h.trunc();
    let tmp = chroma * (h - sextant);
    let base = target_luma - luma(rgb);
    let mut out = [base; 3];

    match sextant as i32 {
        0 => {
            out[0] += chroma;
            out[1] += tmp;
        }
        1 => {
            out[0] += chroma - tmp;
            out[1] += chroma;
        }
        2 => {
            out[1] += chroma;
            out[2] += tmp;
        }
        3 => {
            out[1] += chroma - tmp;
            out[2] += chroma;
        }
        4 => {
            out[0] += tmp;
            out[2] += chroma;
        }
        5 => {
            out[0] += chroma;
            out[2] += chroma - tmp;
        }
        // Negative hue (green below blue on the red sextant) adds no chroma.
        _ => {}
    }
    out
}

/// Hue rotation, saturation, and lightness.
///
/// ```text
/// hue        = (clamp(hue, -1, 1) · 6) mod 6
/// sat_mul    = 1 + s · (s < 0 ? 1 : 2)
/// light_mul  = l < 0 ? 1 + l : 1 − l
/// light_add  = l < 0 ? 0 : l · 255
/// out        = hsl_adjust(in) · light_mul + light_add
/// ```
///
/// The HSL round trip only runs when hue or saturation is non-zero, and
/// only for pixels with non-zero lightness and chroma. Otherwise only the
/// lightness terms apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    hue: f32,
    saturation: f32,
    sat_mul: f32,
    light_mul: f32,
    light_add: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hue = hue.clamp(-1.0, 1.0);
        let saturation = saturation.clamp(-1.0, 1.0);
        let lightness = lightness.clamp(-1.0, 1.0);
        Self {
            hue: (hue * 6.0) % 6.0,
            saturation,
            sat_mul: 1.0 + saturation * if saturation < 0.0 { 1.0 } else { 2.0 },
            light_mul: if lightness < 0.0 { 1.0 + lightness } else { 1.0 - lightness },
            light_add: if lightness < 0.0 { 0.0 } else { lightness * 255.0 },
        }
    }

    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let out = if self.hue != 0.0 || self.saturation != 0.0 {
            self.adjust(rgb).unwrap_or(rgb)
        } else {
            rgb
        };
        out.map(|c| c * self.light_mul + self.light_add)
    }

    /// RGB → HSL, shift hue and scale saturation, HSL → RGB.
    ///
    /// Returns `None` for black and for gray pixels, which pass through.
    fn adjust(&self, rgb: [f32; 3]) -> Option<[f32; 3]> {
        let [r, g, b] = rgb;
        let vs = r.max(g).max(b);
        let ms = r.min(g).min(b);
        let vm = vs - ms;
        let l = (ms + vs) / 510.0;
        if l <= 0.0 || vm <= 0.0 {
            return None;
        }

        let v = if l <= 0.5 {
            let s = (vm / (vs + ms) * self.sat_mul).min(1.0);
            l * (1.0 + s)
        } else {
            let s = (vm / (510.0 - vs - ms) * self.sat_mul).min(1.0);
            l + s - l * s
        };

        let hue_of_input = if r == vs {
            if g == ms {
                5.0 + (vs - b) / vm
            } else {
                1.0 - (vs - g) / vm
            }
        } else if g == vs {
            if b == ms {
                1.0 + (vs - r) / vm
            } else {
                3.0 - (vs - b) / vm
            }
        } else if r == ms {
            3.0 + (vs - g) / vm
        } else {
            5.0 - (vs - r) / vm
        };

        let mut h = hue_of_input + self.hue;

        if h < 0.0 {
            h += 6.0;
        }
        if h >= 6.0 {
            h -= 6.0;
        }

        let m = l + l - v;
        let sextant = h.trunc();
        let vmh = (v - m) * (h - sextant);
        let out = match sextant as i32 {
            0 => [v, m + vmh, m],
            1 => [v - vmh, v, m],
            2 => [m, v, m + vmh],
            3 => [m, v - vmh, v],
            4 => [m + vmh, m, v],
            _ => [v, m, v - vmh],
        };
        Some(out.map(|c| c * 255.0))
    }
}

/// Quantize each channel into `levels` buckets spread over `[0, 255]`.
///
/// ```text
/// levels = trunc(clamp(levels, 2, 256))
/// out    = (256 / (levels − 1)) · floor(in / (256 / levels))
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posterize {
    area: f32,
    step: f32,
}

impl Posterize {
    pub fn new(levels: f32) -> Self {
        let levels = levels.clamp(2.0, 256.0).trunc();
        Self {
            area: 256.0 / levels,
            step: 256.0 / (levels - 1.0),
        }
    }

    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        rgb.map(|c| self.step * (c / self.area).floor())
    }
}
