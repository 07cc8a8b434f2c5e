//! OpenGL / WebGL2 executor for the blur chain.
//!
//! This module is only available when the `render` feature is enabled.
//!
//! # Module overview
//!
//! - [`effect`] -- [`MultiPassBlur`] and its [`Capture`] guard.
//! - [`shader`] -- Shader compilation, linking, and error formatting.
//! - [`fullscreen`] -- Attribute-less fullscreen triangle.
//! - [`texture`] -- Texture formats for base and ping/pong levels.
//! - [`target`] -- FBO + texture render targets and blits.
//! - [`state`] -- GL state save/restore around the chain.
//! - [`context`] -- GPU context wrapper with capability detection.

pub mod context;
pub mod effect;
pub mod fullscreen;
pub mod shader;
pub mod state;
pub mod target;
pub mod texture;

pub use context::GpuContext;
pub use effect::{Capture, MultiPassBlur};
pub use fullscreen::{FullscreenTriangle, FULLSCREEN_VERTEX_SHADER};
pub use shader::{compile_program, compile_shader, format_shader_error, ShaderError};
pub use target::{Rect, RenderTarget};
pub use texture::{create_texture, TextureConfig};
