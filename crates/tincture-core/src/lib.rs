//! Tincture Core: CPU image effects.
//!
//! Pixel transforms over row-major RGBA8 buffers: a generic convolution
//! engine, a separable Gaussian blur, per-pixel color formulas, and the
//! registry that exposes all of them under stable names. No threads; the
//! dispatcher crate runs pipelines in the background.

pub mod blur;
pub mod buffer;
pub mod builtins;
pub mod convolution;
pub mod effects;
pub mod error;
pub mod histogram;
pub mod options;
pub mod progress;
pub mod registry;
pub mod surface;

// Re-exports for convenience.
pub use buffer::PixelBuffer;
pub use convolution::{ConvolveOptions, Kernel, convolve};
pub use error::{BufferError, EffectError, SurfaceError};
pub use options::{EffectOptions, OptionValue, ParamDef};
pub use progress::{CancelToken, Progress};
pub use registry::{Effect, EffectRegistry, FnEffect};
pub use surface::{ImageSurface, Surface};
