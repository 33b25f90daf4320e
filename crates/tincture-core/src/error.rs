//! Error types for the effects engine.

use thiserror::Error;

/// A pixel buffer does not match its declared RGBA8 layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Byte length disagrees with `width * height * 4`.
    #[error("buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA8 image")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Input and output buffers of one transform differ in size.
    #[error("input buffer is {input} bytes but output buffer is {output} bytes")]
    DimensionMismatch { input: usize, output: usize },
}

/// Errors raised by the drawing surface the engine reads from and paints to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// Requested region does not fit inside the surface.
    #[error(
        "region {width}x{height} at ({x}, {y}) exceeds the {surface_width}x{surface_height} surface"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        surface_width: u32,
        surface_height: u32,
    },

    /// The surface refused to hand out its pixels.
    #[error("surface pixels are not readable: {0}")]
    Unreadable(String),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Errors from running a single effect.
#[derive(Debug, Error)]
pub enum EffectError {
    /// No effect is registered under this name.
    #[error("unknown effect: {name}")]
    UnknownEffect { name: String },

    /// An option is unrecognized, has the wrong type, or lies outside a strict domain.
    #[error("effect '{effect}': invalid option '{option}': {reason}")]
    InvalidOption {
        effect: String,
        option: String,
        reason: String,
    },

    /// A convolution kernel is not an odd square matrix.
    #[error("kernel must be an odd square matrix, got {len} weights for size {size}")]
    InvalidKernel { size: usize, len: usize },

    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// An effect with this name is already registered.
    #[error("effect already registered: {name}")]
    AlreadyRegistered { name: String },

    /// The owning job was cancelled while the effect was running.
    #[error("effect cancelled")]
    Cancelled,

    /// A custom effect reported its own failure.
    #[error("effect '{effect}' failed: {message}")]
    Failed { effect: String, message: String },
}

impl EffectError {
    pub(crate) fn invalid_option(effect: &str, option: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            effect: effect.to_string(),
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = EffectError::UnknownEffect {
            name: "sparkle".to_string(),
        };
        assert_eq!(err.to_string(), "unknown effect: sparkle");

        let err = EffectError::invalid_option("glow", "amount", "2 is outside [0, 1]");
        assert!(err.to_string().contains("glow"));
        assert!(err.to_string().contains("amount"));

        let err = EffectError::InvalidKernel { size: 3, len: 8 };
        assert_eq!(
            err.to_string(),
            "kernel must be an odd square matrix, got 8 weights for size 3"
        );
    }

    #[test]
    fn test_buffer_error_converts_into_effect_error() {
        let err: EffectError = BufferError::DimensionMismatch {
            input: 16,
            output: 12,
        }
        .into();
        assert!(matches!(err, EffectError::Buffer(_)));
    }
}
