//! Setup-time and per-frame blur parameters.
//!
//! [`BlurConfig`] is fixed once the chain is built. [`FrameParams`] can
//! change between captures and is read by the next run of the chain.
//! Both build from a JSON object, where missing or mistyped keys fall back
//! to the defaults.

use crate::error::BlurError;
use crate::plan::Axis;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default tap radius in texels.
pub const DEFAULT_RADIUS: usize = 32;
/// Default Gaussian variance over the `[-1, 1]` row domain.
pub const DEFAULT_SHAPE: f32 = 0.2;
/// Default number of blur passes.
pub const DEFAULT_PASSES: usize = 1;
/// Default per-level resolution ratio.
pub const DEFAULT_DOWNSAMPLE: f32 = 0.5;

/// Immutable configuration of a blur chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurConfig {
    /// Base target width in pixels.
    pub width: u32,
    /// Base target height in pixels.
    pub height: u32,
    /// Half-width of the Gaussian row in texels.
    pub radius: usize,
    /// Gaussian variance; smaller values give a tighter falloff.
    pub shape: f32,
    /// Number of blur levels, each at `downsample` times the previous size.
    pub passes: usize,
    /// Resolution ratio between consecutive levels, in `(0, 1]`.
    pub downsample: f32,
    /// Store the base target as RGBA32F instead of RGBA8.
    pub use_float_texture: bool,
}

impl BlurConfig {
    /// A config of the given size with every other field at its default.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            radius: DEFAULT_RADIUS,
            shape: DEFAULT_SHAPE,
            passes: DEFAULT_PASSES,
            downsample: DEFAULT_DOWNSAMPLE,
            use_float_texture: false,
        }
    }

    /// Builds a config from `params`, keeping `width` and `height` fixed.
    pub fn from_json(width: u32, height: u32, params: &Value) -> Self {
        Self {
            width,
            height,
            radius: json_usize(params, "radius", DEFAULT_RADIUS),
            shape: json_f32(params, "shape", DEFAULT_SHAPE),
            passes: json_usize(params, "passes", DEFAULT_PASSES),
            downsample: json_f32(params, "downsample", DEFAULT_DOWNSAMPLE),
            use_float_texture: params
                .get("use_float_texture")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Checks every field against the range the chain can be built for.
    ///
    /// Level sizes are checked separately by [`crate::ChainLayout::new`].
    pub fn validate(&self) -> Result<(), BlurError> {
        if self.width == 0 || self.height == 0 {
            return Err(BlurError::InvalidDimensions);
        }
        if self.radius == 0 {
            return Err(BlurError::InvalidRadius);
        }
        if !(self.shape.is_finite() && self.shape > 0.0) {
            return Err(BlurError::InvalidShape(self.shape));
        }
        if self.passes == 0 {
            return Err(BlurError::InvalidPasses);
        }
        if !(self.downsample > 0.0 && self.downsample <= 1.0) {
            return Err(BlurError::InvalidDownsample(self.downsample));
        }
        Ok(())
    }
}

/// Per-frame blur parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameParams {
    /// Length of the sampling direction vectors, in texels.
    pub scale: f32,
    /// Rotation of the sampling axes in radians.
    pub rotation: f32,
    /// Multiplier applied by the combine step; ignored with a single pass.
    pub brightness: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0.0,
            brightness: 1.0,
        }
    }
}

impl FrameParams {
    /// Builds frame params from `params`, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            scale: json_f32(params, "scale", d.scale),
            rotation: json_f32(params, "rotation", d.rotation),
            brightness: json_f32(params, "brightness", d.brightness),
        }
    }

    /// Sampling step for `axis`: the unit axis scaled by `scale` and rotated
    /// by `rotation`.
    ///
    /// With a non-zero rotation the two passes streak along tilted axes
    /// instead of the image rows and columns.
    pub fn direction(&self, axis: Axis) -> Vec2 {
        let unit = match axis {
            Axis::Horizontal => Vec2::new(self.scale, 0.0),
            Axis::Vertical => Vec2::new(0.0, self.scale),
        };
        Vec2::from_angle(self.rotation).rotate(unit)
    }
}

fn json_f32(params: &Value, name: &str, default: f32) -> f32 {
    params
        .get(name)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

fn json_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn new_uses_documented_defaults() {
        let config = BlurConfig::new(640, 480);
        assert_eq!(config.radius, 32);
        assert!((config.shape - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.passes, 1);
        assert!((config.downsample - 0.5).abs() < f32::EPSILON);
        assert!(!config.use_float_texture);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_json_reads_present_keys() {
        let params = json!({"radius": 8, "shape": 0.4, "passes": 3, "downsample": 0.25, "use_float_texture": true});
        let config = BlurConfig::from_json(100, 50, &params);
        assert_eq!(config.width, 100);
        assert_eq!(config.height, 50);
        assert_eq!(config.radius, 8);
        assert!((config.shape - 0.4).abs() < 1e-6);
        assert_eq!(config.passes, 3);
        assert!((config.downsample - 0.25).abs() < 1e-6);
        assert!(config.use_float_texture);
    }

    #[test]
    fn from_json_falls_back_on_missing_or_mistyped_keys() {
        let params = json!({"radius": -4, "passes": "many", "shape": null});
        let config = BlurConfig::from_json(10, 10, &params);
        assert_eq!(config, BlurConfig::new(10, 10));
    }

    #[test]
    fn validate_rejects_zero_dimensions() {
        let err = BlurConfig::new(0, 10).validate().unwrap_err();
        assert!(matches!(err, BlurError::InvalidDimensions));
    }

    #[test]
    fn validate_rejects_zero_radius_and_passes() {
        let mut config = BlurConfig::new(10, 10);
        config.radius = 0;
        assert!(matches!(config.validate(), Err(BlurError::InvalidRadius)));
        config.radius = 4;
        config.passes = 0;
        assert!(matches!(config.validate(), Err(BlurError::InvalidPasses)));
    }

    #[test]
    fn validate_rejects_bad_shape() {
        let mut config = BlurConfig::new(10, 10);
        for shape in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            config.shape = shape;
            assert!(
                matches!(config.validate(), Err(BlurError::InvalidShape(_))),
                "shape {shape} accepted"
            );
        }
    }

    #[test]
    fn validate_accepts_downsample_of_one_only_up_to_one() {
        let mut config = BlurConfig::new(10, 10);
        config.downsample = 1.0;
        assert!(config.validate().is_ok());
        for d in [0.0, -0.5, 1.01, f32::NAN] {
            config.downsample = d;
            assert!(
                matches!(config.validate(), Err(BlurError::InvalidDownsample(_))),
                "downsample {d} accepted"
            );
        }
    }

    #[test]
    fn default_frame_params_are_identity() {
        let p = FrameParams::default();
        assert_eq!(p.direction(Axis::Horizontal), Vec2::new(1.0, 0.0));
        assert_eq!(p.direction(Axis::Vertical), Vec2::new(0.0, 1.0));
        assert!((p.brightness - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn direction_scales_and_rotates() {
        let p = FrameParams {
            scale: 2.0,
            rotation: FRAC_PI_2,
            brightness: 1.0,
        };
        let x = p.direction(Axis::Horizontal);
        let y = p.direction(Axis::Vertical);
        assert!((x - Vec2::new(0.0, 2.0)).length() < 1e-5, "x = {x}");
        assert!((y - Vec2::new(-2.0, 0.0)).length() < 1e-5, "y = {y}");
    }

    #[test]
    fn directions_stay_perpendicular_under_rotation() {
        let p = FrameParams {
            scale: 1.5,
            rotation: 0.7,
            brightness: 1.0,
        };
        let dot = p.direction(Axis::Horizontal).dot(p.direction(Axis::Vertical));
        assert!(dot.abs() < 1e-5, "dot = {dot}");
    }

    #[test]
    fn frame_params_from_json() {
        let p = FrameParams::from_json(&json!({"scale": 3, "brightness": 0.5}));
        assert!((p.scale - 3.0).abs() < f32::EPSILON);
        assert!(p.rotation.abs() < f32::EPSILON);
        assert!((p.brightness - 0.5).abs() < f32::EPSILON);
    }
}
