//! Render target (FBO + texture) for the blur chain.
//!
//! Every target in the chain is a framebuffer with a single color
//! attachment: the base capture target and each ping/pong level.

use super::texture::{create_texture, TextureConfig};
use crate::plan::Extent;

/// Destination rectangle on the default framebuffer, in pixels with the
/// GL origin at the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// An off-screen render target: a framebuffer object and its color texture.
pub struct RenderTarget {
    fbo: glow::Framebuffer,
    texture: glow::Texture,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Creates a framebuffer with a fresh texture as `COLOR_ATTACHMENT0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the framebuffer or texture cannot be created,
    /// or if the framebuffer is not complete.
    #[allow(unsafe_code)]
    pub fn new(gl: &glow::Context, config: &TextureConfig) -> Result<Self, String> {
        use glow::HasContext;

        let texture = create_texture(gl, config)?;

        // SAFETY: glow wraps raw GL calls as unsafe. The framebuffer is
        // created, given a valid texture attachment and checked. Both
        // objects are deleted if it is incomplete.
        unsafe {
            let fbo = match gl.create_framebuffer() {
                Ok(fbo) => fbo,
                Err(e) => {
                    gl.delete_texture(texture);
                    return Err(e);
                }
            };
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(fbo);
                gl.delete_texture(texture);
                return Err(format!(
                    "framebuffer {}x{} incomplete: status 0x{status:04X}",
                    config.width, config.height
                ));
            }

            Ok(Self {
                fbo,
                texture,
                width: config.width,
                height: config.height,
            })
        }
    }

    /// Binds this target for drawing and sets the viewport to its size.
    #[allow(unsafe_code)]
    pub fn bind(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.fbo is a valid framebuffer handle created in new().
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.fbo));
            gl.viewport(0, 0, self.width as i32, self.height as i32);
        }
    }

    /// Binds this target and clears it to transparent black.
    #[allow(unsafe_code)]
    pub fn clear(&self, gl: &glow::Context) {
        use glow::HasContext;

        self.bind(gl);
        // SAFETY: plain state calls on the currently bound framebuffer.
        unsafe {
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Copies this target stretched over the whole of `dst`.
    ///
    /// Filters linearly when the sizes differ.
    pub fn blit_to(&self, gl: &glow::Context, dst: &RenderTarget) {
        let filter = if (self.width, self.height) == (dst.width, dst.height) {
            glow::NEAREST
        } else {
            glow::LINEAR
        };
        let rect = Rect {
            x: 0,
            y: 0,
            width: dst.width as i32,
            height: dst.height as i32,
        };
        self.blit(gl, Some(dst.fbo), rect, filter);
    }

    /// Copies this target into `rect` of the default framebuffer.
    pub fn blit_to_default(&self, gl: &glow::Context, rect: Rect) {
        self.blit(gl, None, rect, glow::LINEAR);
    }

    #[allow(unsafe_code)]
    fn blit(&self, gl: &glow::Context, dst: Option<glow::Framebuffer>, rect: Rect, filter: u32) {
        use glow::HasContext;

        // SAFETY: self.fbo and dst are valid framebuffers (or the default
        // framebuffer). Read/draw bindings are reset to the combined
        // binding of dst afterwards.
        unsafe {
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(self.fbo));
            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, dst);
            gl.blit_framebuffer(
                0,
                0,
                self.width as i32,
                self.height as i32,
                rect.x,
                rect.y,
                rect.x + rect.width,
                rect.y + rect.height,
                glow::COLOR_BUFFER_BIT,
                filter,
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, dst);
        }
    }

    /// Returns the texture handle for sampling this render target.
    pub fn texture(&self) -> glow::Texture {
        self.texture
    }

    pub fn extent(&self) -> Extent {
        Extent {
            width: self.width,
            height: self.height,
        }
    }

    /// Deletes the framebuffer and texture.
    ///
    /// GL objects are not released on drop; call this while the context
    /// is still current.
    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.fbo and self.texture are valid handles from new().
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_texture(self.texture);
        }
    }
}
