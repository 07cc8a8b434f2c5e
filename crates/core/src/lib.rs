#![deny(unsafe_code)]
//! Multi-pass Gaussian blur.
//!
//! Derives a bilinear-reduced Gaussian kernel ([`BlurKernel`]), generates
//! GLSL for the separable blur and the multi-level combine ([`source`]),
//! and plans the per-frame ping/pong chain ([`plan`]). The chain runs on
//! the GPU through `glow` (feature `render`) or on the CPU reference
//! executor in [`cpu`].

pub mod config;
pub mod cpu;
pub mod error;
pub mod kernel;
pub mod plan;
pub mod source;

#[cfg(feature = "png")]
pub mod snapshot;

#[cfg(feature = "render")]
pub mod render;

pub use config::{BlurConfig, FrameParams};
pub use cpu::{blur_image, CpuBlur, Image};
pub use error::BlurError;
pub use kernel::{BlurKernel, Tap};
pub use plan::{build_steps, execute_steps, Axis, ChainLayout, Extent, Step, StepExecutor, Target};
pub use source::{generate_blur_source, generate_combine_source};
