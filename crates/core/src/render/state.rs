//! Saving and restoring the GL state the blur chain touches.

/// Framebuffer bindings, viewport and blend enable captured before the
/// chain rebinds them.
#[derive(Debug, Clone, Copy)]
pub struct SavedState {
    draw_framebuffer: Option<glow::Framebuffer>,
    read_framebuffer: Option<glow::Framebuffer>,
    viewport: [i32; 4],
    blend: bool,
}

impl SavedState {
    #[allow(unsafe_code)]
    pub fn capture(gl: &glow::Context) -> Self {
        use glow::HasContext;

        let mut viewport = [0; 4];
        // SAFETY: read-only state queries.
        unsafe {
            gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);
            Self {
                draw_framebuffer: gl.get_parameter_framebuffer(glow::DRAW_FRAMEBUFFER_BINDING),
                read_framebuffer: gl.get_parameter_framebuffer(glow::READ_FRAMEBUFFER_BINDING),
                viewport,
                blend: gl.is_enabled(glow::BLEND),
            }
        }
    }

    #[allow(unsafe_code)]
    pub fn restore(&self, gl: &glow::Context) {
        use glow::HasContext;

        let [x, y, w, h] = self.viewport;
        // SAFETY: handles were valid bindings when captured and the chain
        // does not delete foreign framebuffers.
        unsafe {
            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.draw_framebuffer);
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, self.read_framebuffer);
            gl.viewport(x, y, w, h);
            if self.blend {
                gl.enable(glow::BLEND);
            } else {
                gl.disable(glow::BLEND);
            }
        }
    }
}
