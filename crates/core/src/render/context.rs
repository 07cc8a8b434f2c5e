//! GPU context wrapper with capability detection.
//!
//! `GpuContext` wraps a `glow::Context` and records whether float color
//! attachments can be rendered to. The blur chain only needs them when
//! `use_float_texture` is set.

/// Wraps a `glow::Context` with detected GPU capabilities.
pub struct GpuContext {
    gl: glow::Context,
    supports_color_buffer_float: bool,
}

impl GpuContext {
    /// Wraps `gl` and queries its float render target support.
    ///
    /// Desktop GL 3.0+ renders to float attachments natively. GLES and
    /// WebGL2 need `EXT_color_buffer_float`.
    pub fn new(gl: glow::Context) -> Self {
        use glow::HasContext;

        let supports_color_buffer_float = !gl.version().is_embedded
            || gl.supported_extensions().contains("EXT_color_buffer_float")
            || gl.supported_extensions().contains("GL_EXT_color_buffer_float");

        log::debug!(
            "gpu context: {:?}, float color buffers: {supports_color_buffer_float}",
            gl.version()
        );

        Self {
            gl,
            supports_color_buffer_float,
        }
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Consumes this wrapper and returns the underlying `glow::Context`.
    pub fn into_gl(self) -> glow::Context {
        self.gl
    }

    /// Whether RGBA32F textures can be used as color attachments.
    pub fn supports_color_buffer_float(&self) -> bool {
        self.supports_color_buffer_float
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_context_struct_compiles_with_expected_api() {
        fn _assert_api(ctx: &GpuContext) {
            let _gl: &glow::Context = ctx.gl();
            let _flag: bool = ctx.supports_color_buffer_float();
        }
    }

    #[test]
    #[ignore = "requires GL context"]
    fn desktop_context_reports_float_support() {
        // Would test: a desktop GL 3.3 context reports float color buffers.
    }
}
