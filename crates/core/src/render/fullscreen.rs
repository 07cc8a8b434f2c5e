//! Fullscreen triangle used by the blur and combine draws.
//!
//! Both fragment shaders address texels through `gl_FragCoord`, so the
//! vertex stage only has to cover the viewport. Positions come from
//! `gl_VertexID`; no vertex buffer is bound.

/// GLSL ES 3.00 vertex shader covering the viewport with one triangle.
///
/// Draw with `draw_arrays(TRIANGLES, 0, 3)` and an empty VAO bound.
pub const FULLSCREEN_VERTEX_SHADER: &str = r#"#version 300 es
void main() {
    vec2 corner = vec2((gl_VertexID << 1) & 2, gl_VertexID & 2);
    gl_Position = vec4(corner * 2.0 - 1.0, 0.0, 1.0);
}
"#;

/// The empty vertex array the fullscreen triangle is drawn with.
///
/// Core profiles reject draws without a bound VAO, even attribute-less ones.
pub struct FullscreenTriangle {
    vao: glow::VertexArray,
}

impl FullscreenTriangle {
    /// # Errors
    ///
    /// Returns the driver message if the vertex array cannot be created.
    #[allow(unsafe_code)]
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        use glow::HasContext;

        // SAFETY: creating a VAO has no preconditions beyond a current context.
        let vao = unsafe { gl.create_vertex_array()? };
        Ok(Self { vao })
    }

    /// Draws the triangle with whatever program and target are bound.
    #[allow(unsafe_code)]
    pub fn draw(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.vao is a valid vertex array from new().
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
            gl.bind_vertex_array(None);
        }
    }

    #[allow(unsafe_code)]
    pub fn destroy(self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: self.vao is a valid vertex array from new().
        unsafe { gl.delete_vertex_array(self.vao) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_shader_matches_fragment_dialect() {
        assert!(
            FULLSCREEN_VERTEX_SHADER.starts_with("#version 300 es"),
            "expected GLSL ES 3.0 directive in:\n{FULLSCREEN_VERTEX_SHADER}"
        );
        let fragment = crate::source::generate_blur_source(2, 0.2);
        assert!(fragment.starts_with("#version 300 es"));
    }

    #[test]
    fn vertex_shader_needs_no_attributes() {
        assert!(FULLSCREEN_VERTEX_SHADER.contains("gl_VertexID"));
        assert!(!FULLSCREEN_VERTEX_SHADER.contains(" in "));
        assert!(FULLSCREEN_VERTEX_SHADER.contains("gl_Position"));
    }
}
