//! Pass planning: target sizes and the per-frame step sequence.
//!
//! The chain is described once as data so the GPU executor and the CPU
//! reference executor run exactly the same sequence. For each level `i`:
//!
//! 1. resample the previous result (base for `i == 0`) into `Ping(i)`
//! 2. blur `Ping(i)` horizontally into `Pong(i)`
//! 3. blur `Pong(i)` vertically back into `Ping(i)`
//!
//! then either combine every ping level into base, or with a single level
//! resample `Ping(0)` straight back into base.
//!
//! [`execute_steps`] walks a sequence against a [`StepExecutor`], resolving
//! blur directions and brightness from the frame parameters on the way.

use crate::config::{BlurConfig, FrameParams};
use crate::error::BlurError;
use glam::Vec2;
use serde::Serialize;
use std::fmt;

/// Width and height of a render target in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A render target owned by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    Base,
    Ping(usize),
    Pong(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Base => write!(f, "base"),
            Target::Ping(i) => write!(f, "ping[{i}]"),
            Target::Pong(i) => write!(f, "pong[{i}]"),
        }
    }
}

/// Sampling axis of a 1D blur step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One operation of the per-frame chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    /// Bilinear copy of `src` stretched over the whole of `dst`.
    Resample { src: Target, dst: Target },
    /// 1D blur of `src` into `dst` along `axis`.
    Blur { src: Target, dst: Target, axis: Axis },
    /// Weighted sum of `Ping(0..passes)` written into base.
    Combine { passes: usize },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Resample { src, dst } => write!(f, "resample {src} -> {dst}"),
            Step::Blur { src, dst, axis } => write!(f, "blur {axis:?} {src} -> {dst}"),
            Step::Combine { passes } => write!(f, "combine ping[0..{passes}] -> base"),
        }
    }
}

/// Builds the step sequence for a chain with `passes` levels.
pub fn build_steps(passes: usize) -> Vec<Step> {
    let mut steps = Vec::with_capacity(passes * 3 + 1);
    for i in 0..passes {
        let src = if i == 0 { Target::Base } else { Target::Ping(i - 1) };
        steps.push(Step::Resample {
            src,
            dst: Target::Ping(i),
        });
        steps.push(Step::Blur {
            src: Target::Ping(i),
            dst: Target::Pong(i),
            axis: Axis::Horizontal,
        });
        steps.push(Step::Blur {
            src: Target::Pong(i),
            dst: Target::Ping(i),
            axis: Axis::Vertical,
        });
    }
    if passes > 1 {
        steps.push(Step::Combine { passes });
    } else if passes == 1 {
        steps.push(Step::Resample {
            src: Target::Ping(0),
            dst: Target::Base,
        });
    }
    steps
}

/// Backend that carries out the steps of a plan.
pub trait StepExecutor {
    /// Stretches `src` over the whole of `dst` with bilinear filtering.
    fn resample(&mut self, src: Target, dst: Target);
    /// One 1D blur of `src` into `dst`, stepping by `direction` texels per tap offset.
    fn blur(&mut self, src: Target, dst: Target, direction: Vec2);
    /// Sums `Ping(0..passes)` into base, scaled by `brightness / passes`.
    fn combine(&mut self, passes: usize, brightness: f32);
}

/// Runs `steps` in order on `executor`.
pub fn execute_steps<E: StepExecutor + ?Sized>(
    steps: &[Step],
    params: &FrameParams,
    executor: &mut E,
) {
    for step in steps {
        match *step {
            Step::Resample { src, dst } => executor.resample(src, dst),
            Step::Blur { src, dst, axis } => executor.blur(src, dst, params.direction(axis)),
            Step::Combine { passes } => executor.combine(passes, params.brightness),
        }
    }
}

/// Resolved sizes of the base target and every ping/pong level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLayout {
    base: Extent,
    levels: Vec<Extent>,
}

impl ChainLayout {
    /// Computes level sizes for a validated config.
    ///
    /// Level 0 matches the base. Each further level truncates the previous
    /// size times `downsample`, so a 0.5 ratio gives `floor(w / 2^i)`.
    ///
    /// # Errors
    ///
    /// Returns the config's validation error, or `BlurError::DegenerateLevel`
    /// if any level truncates to zero width or height.
    pub fn new(config: &BlurConfig) -> Result<Self, BlurError> {
        config.validate()?;

        let base = Extent {
            width: config.width,
            height: config.height,
        };
        let mut levels = Vec::with_capacity(config.passes);
        let (mut w, mut h) = (config.width, config.height);
        for pass in 0..config.passes {
            if w == 0 || h == 0 {
                return Err(BlurError::DegenerateLevel {
                    pass,
                    width: w,
                    height: h,
                });
            }
            levels.push(Extent {
                width: w,
                height: h,
            });
            w = (w as f32 * config.downsample) as u32;
            h = (h as f32 * config.downsample) as u32;
        }

        Ok(Self { base, levels })
    }

    /// Size of the base target.
    pub fn base(&self) -> Extent {
        self.base
    }

    /// Sizes of levels `0..passes`; ping and pong share a size per level.
    pub fn levels(&self) -> &[Extent] {
        &self.levels
    }

    /// Number of levels.
    pub fn passes(&self) -> usize {
        self.levels.len()
    }

    /// Size of `target`.
    ///
    /// # Panics
    ///
    /// Panics if a ping or pong index is not below [`Self::passes`].
    pub fn extent(&self, target: Target) -> Extent {
        match target {
            Target::Base => self.base,
            Target::Ping(i) | Target::Pong(i) => self.levels[i],
        }
    }
}
