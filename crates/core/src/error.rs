//! Error types for the multi-pass blur.

use thiserror::Error;

/// Errors produced while configuring or running the blur chain.
#[derive(Debug, Error)]
pub enum BlurError {
    /// Width or height was zero.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// The tap radius was zero.
    #[error("invalid radius: must be at least 1")]
    InvalidRadius,

    /// The Gaussian variance was not a positive finite number.
    #[error("invalid shape {0}: variance must be positive and finite")]
    InvalidShape(f32),

    /// The pass count was zero.
    #[error("invalid pass count: must be at least 1")]
    InvalidPasses,

    /// The downsample ratio was outside `(0, 1]`.
    #[error("invalid downsample {0}: ratio must be in (0, 1]")]
    InvalidDownsample(f32),

    /// A pass level truncated to a zero-sized target.
    #[error("pass {pass} collapses to {width}x{height}; use fewer passes or a larger downsample")]
    DegenerateLevel {
        pass: usize,
        width: u32,
        height: u32,
    },

    /// An input image did not match the configured dimensions.
    #[error("dimension mismatch: expected ({expected_w}, {expected_h}), got ({got_w}, {got_h})")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    /// A pixel buffer had the wrong length for its dimensions.
    #[error("pixel buffer holds {got} values, expected {expected}")]
    BufferSize { expected: usize, got: usize },

    /// The GPU context lacks float color buffers but a float target was requested.
    #[error("float render targets requested but EXT_color_buffer_float is not supported")]
    FloatTargetUnsupported,

    /// A GL object could not be created or a framebuffer was incomplete.
    #[error("gpu error: {0}")]
    Gpu(String),

    /// A generated shader failed to compile or link.
    #[cfg(feature = "render")]
    #[error(transparent)]
    Shader(#[from] crate::render::ShaderError),

    /// Reading or writing an image file failed.
    #[error("io error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let msg = BlurError::InvalidDimensions.to_string();
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn invalid_shape_includes_value() {
        let msg = BlurError::InvalidShape(-0.5).to_string();
        assert!(msg.contains("-0.5"), "missing value in: {msg}");
    }

    #[test]
    fn invalid_downsample_includes_value() {
        let msg = BlurError::InvalidDownsample(1.5).to_string();
        assert!(msg.contains("1.5"), "missing value in: {msg}");
    }

    #[test]
    fn degenerate_level_includes_pass_and_size() {
        let err = BlurError::DegenerateLevel {
            pass: 7,
            width: 0,
            height: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("pass 7"), "missing pass in: {msg}");
        assert!(msg.contains("0x3"), "missing size in: {msg}");
    }

    #[test]
    fn dimension_mismatch_includes_all_dimensions() {
        let err = BlurError::DimensionMismatch {
            expected_w: 64,
            expected_h: 48,
            got_w: 32,
            got_h: 24,
        };
        let msg = err.to_string();
        for n in ["64", "48", "32", "24"] {
            assert!(msg.contains(n), "missing {n} in: {msg}");
        }
    }

    #[test]
    fn blur_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BlurError>();
    }

    #[test]
    fn blur_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<BlurError>();
    }
}
