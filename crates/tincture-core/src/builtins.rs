//! Static table of built-in effects.
//!
//! Each entry pairs a stable name with its option definitions and an adapter
//! that turns resolved options into a call to the typed transform.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blur::gaussian_blur;
use crate::convolution::{ConvolveOptions, Kernel, convolve};
use crate::effects::color::{self, BrightnessContrast, ColorFilter, Hsl, Posterize};
use crate::effects::filters;
use crate::effects::geometry::{flip_horizontal, flip_vertical};
use crate::effects::map_pixels;
use crate::effects::noise::{NoiseParams, add_noise, remove_noise};
use crate::error::EffectError;
use crate::options::{EffectOptions, ParamDef, ResolvedOptions, resolve};
use crate::progress::Progress;
use crate::registry::Effect;

type Run = fn(&[u8], &mut [u8], u32, u32, &ResolvedOptions, &mut Progress<'_>) -> Result<(), EffectError>;

/// One built-in entry.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    params: &'static [ParamDef],
    run: Run,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl Effect for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn params(&self) -> &[ParamDef] {
        self.params
    }

    fn apply(
        &self,
        input: &[u8],
        output: &mut [u8],
        width: u32,
        height: u32,
        options: &EffectOptions,
        progress: &mut Progress<'_>,
    ) -> Result<(), EffectError> {
        let resolved = resolve(self.name, self.params, options)?;
        (self.run)(input, output, width, height, &resolved, progress)
    }
}

const fn entry(name: &'static str, params: &'static [ParamDef], run: Run) -> Builtin {
    Builtin { name, params, run }
}

const NONE: &[ParamDef] = &[];
const STRENGTH: &[ParamDef] = &[ParamDef::clamped("strength", 0.5, 0.0, 1.0)];
const BRIGHTNESS: &[ParamDef] = &[
    ParamDef::clamped("brightness", 0.0, -1.0, 1.0),
    ParamDef::clamped("contrast", 0.0, -1.0, 1.0),
];
const LIGHTEN: &[ParamDef] = &[ParamDef::clamped("amount", 0.1, 0.0, 1.0)];
const COLOR_ADJUST: &[ParamDef] = &[
    ParamDef::clamped("r", 0.0, -1.0, 1.0),
    ParamDef::clamped("g", 0.0, -1.0, 1.0),
    ParamDef::clamped("b", 0.0, -1.0, 1.0),
];
const COLOR_FILTER: &[ParamDef] = &[
    ParamDef::clamped("r", 1.0, 0.0, 1.0),
    ParamDef::clamped("g", 1.0, 0.0, 1.0),
    ParamDef::clamped("b", 1.0, 0.0, 1.0),
    ParamDef::flag("luminosity", false),
];
const HSL: &[ParamDef] = &[
    ParamDef::clamped("hue", 0.0, -1.0, 1.0),
    ParamDef::clamped("saturation", 0.0, -1.0, 1.0),
    ParamDef::clamped("lightness", 0.0, -1.0, 1.0),
];
const POSTERIZE: &[ParamDef] = &[ParamDef::clamped("levels", 16.0, 2.0, 256.0)];
/// Largest whole number an `f64` option holds exactly.
const MAX_SEED: f64 = 9_007_199_254_740_991.0;

const NOISE: &[ParamDef] = &[
    ParamDef::clamped("amount", 0.5, 0.0, 1.0),
    ParamDef::clamped("strength", 0.5, 0.0, 1.0),
    ParamDef::flag("mono", false),
    ParamDef::integer("seed", 0.0, 0.0, MAX_SEED),
];
const BLUR: &[ParamDef] = &[ParamDef::clamped("kernelSize", 5.0, 3.0, 13.0)];
const GLOW: &[ParamDef] = &[
    ParamDef::strict("amount", 0.5, 0.0, 1.0),
    ParamDef::clamped("kernelSize", 5.0, 3.0, 13.0),
];
const EMBOSS: &[ParamDef] = &[
    ParamDef::strict("amount", 1.0, 0.0, 10.0),
    ParamDef::finite("angle", 0.0),
];

/// Every built-in effect, in no particular order.
pub static BUILTINS: &[Builtin] = &[
    entry("invert", NONE, |i, o, w, h, _, p| map_pixels(i, o, w, h, p, color::invert)),
    entry("sepia", NONE, |i, o, w, h, _, p| map_pixels(i, o, w, h, p, color::sepia)),
    entry("solarize", NONE, |i, o, w, h, _, p| map_pixels(i, o, w, h, p, color::solarize)),
    entry("desaturate", NONE, |i, o, w, h, _, p| map_pixels(i, o, w, h, p, color::desaturate)),
    entry(
        "brightness",
        BRIGHTNESS,
        |i, o, w, h, opts, p| {
            let bc = BrightnessContrast::new(
                opts.number("brightness") as f32,
                opts.number("contrast") as f32,
            );
            map_pixels(i, o, w, h, p, |rgb| bc.apply(rgb))
        },
    ),
    entry(
        "lighten",
        LIGHTEN,
        |i, o, w, h, opts, p| {
            let amount = opts.number("amount") as f32;
            map_pixels(i, o, w, h, p, |rgb| color::lighten(rgb, amount))
        },
    ),
    entry(
        "colorAdjust",
        COLOR_ADJUST,
        |i, o, w, h, opts, p| {
            let offsets = ["r", "g", "b"].map(|c| opts.number(c) as f32);
            map_pixels(i, o, w, h, p, |rgb| color::color_adjust(rgb, offsets))
        },
    ),
    entry(
        "colorFilter",
        COLOR_FILTER,
        |i, o, w, h, opts, p| {
            let amounts = ["r", "g", "b"].map(|c| opts.number(c) as f32);
            let filter = ColorFilter::new(amounts, opts.flag("luminosity"));
            map_pixels(i, o, w, h, p, |rgb| filter.apply(rgb))
        },
    ),
    entry(
        "hsl",
        HSL,
        |i, o, w, h, opts, p| {
            let hsl = Hsl::new(
                opts.number("hue") as f32,
                opts.number("saturation") as f32,
                opts.number("lightness") as f32,
            );
            map_pixels(i, o, w, h, p, |rgb| hsl.apply(rgb))
        },
    ),
    entry(
        "posterize",
        POSTERIZE,
        |i, o, w, h, opts, p| {
            let posterize = Posterize::new(opts.number("levels") as f32);
            map_pixels(i, o, w, h, p, |rgb| posterize.apply(rgb))
        },
    ),
    entry(
        "noise",
        NOISE,
        |i, o, w, h, opts, p| {
            let params = NoiseParams {
                amount: opts.number("amount") as f32,
                strength: opts.number("strength") as f32,
                mono: opts.flag("mono"),
            };
            let mut rng = if opts.is_explicit("seed") {
                StdRng::seed_from_u64(opts.number("seed") as u64)
            } else {
                StdRng::from_os_rng()
            };
            add_noise(i, o, w, h, params, &mut rng, p)
        },
    ),
    entry("removeNoise", NONE, |i, o, w, h, _, p| remove_noise(i, o, w, h, p)),
    entry("flipHorizontal", NONE, |i, o, w, h, _, p| flip_horizontal(i, o, w, h, p)),
    entry("flipVertical", NONE, |i, o, w, h, _, p| flip_vertical(i, o, w, h, p)),
    entry(
        "blur",
        BLUR,
        |i, o, w, h, opts, p| gaussian_blur(i, o, w, h, opts.number("kernelSize") as usize, p),
    ),
    entry(
        "glow",
        GLOW,
        |i, o, w, h, opts, p| {
            filters::glow(
                i,
                o,
                w,
                h,
                opts.number("amount") as f32,
                opts.number("kernelSize") as usize,
                p,
            )
        },
    ),
    entry("sharpen3x3", STRENGTH, |i, o, w, h, opts, p| {
        plain(&filters::sharpen_3x3(opts.number("strength") as f32), i, o, w, h, p)
    }),
    entry("sharpen5x5", STRENGTH, |i, o, w, h, opts, p| {
        plain(&filters::sharpen_5x5(opts.number("strength") as f32), i, o, w, h, p)
    }),
    entry("soften3x3", NONE, |i, o, w, h, _, p| plain(&filters::soften_3x3(), i, o, w, h, p)),
    entry("soften5x5", NONE, |i, o, w, h, _, p| plain(&filters::soften_5x5(), i, o, w, h, p)),
    entry("edgeEnhance3x3", NONE, |i, o, w, h, _, p| {
        plain(&filters::edge_enhance_3x3(), i, o, w, h, p)
    }),
    entry("edgeEnhance5x5", NONE, |i, o, w, h, _, p| {
        plain(&filters::edge_enhance_5x5(), i, o, w, h, p)
    }),
    entry("crossEdges", STRENGTH, |i, o, w, h, opts, p| {
        let kernel = filters::cross_edges(opts.number("strength") as f32);
        convolve(&kernel, i, o, w, h, ConvolveOptions::inverted(), p)
    }),
    entry("laplace3x3", NONE, |i, o, w, h, _, p| {
        convolve(&filters::laplace_3x3(), i, o, w, h, ConvolveOptions::inverted_monochrome(), p)
    }),
    entry("laplace5x5", NONE, |i, o, w, h, _, p| {
        convolve(&filters::laplace_5x5(), i, o, w, h, ConvolveOptions::inverted_monochrome(), p)
    }),
    entry(
        "emboss",
        EMBOSS,
        |i, o, w, h, opts, p| {
            filters::emboss(
                i,
                o,
                w,
                h,
                opts.number("amount") as f32,
                opts.number("angle") as f32,
                p,
            )
        },
    ),
    entry("findEdges", NONE, |i, o, w, h, _, p| filters::find_edges(i, o, w, h, p)),
];

/// Convolve with default options: alpha copied, no inversion.
fn plain(
    kernel: &Kernel,
    input: &[u8],
    output: &mut [u8],
    width: u32,
    height: u32,
    progress: &mut Progress<'_>,
) -> Result<(), EffectError> {
    convolve(kernel, input, output, width, height, ConvolveOptions::default(), progress)
}
