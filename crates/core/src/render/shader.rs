//! Compiling and linking the generated blur shaders.
//!
//! Generated sources are long and machine-written, so compile failures
//! carry the numbered source alongside the driver log. The program label
//! ("blur", "combine") identifies which generator produced the failing text.

use thiserror::Error;

/// Errors that can occur during shader compilation or program linking.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A shader stage failed to compile.
    #[error("{program} shader compile error ({stage}):\n{log}")]
    CompileError {
        /// Program label, e.g. "blur".
        program: String,
        /// The shader stage that failed ("vertex" or "fragment").
        stage: String,
        /// Numbered source followed by the driver's info log.
        log: String,
    },
    /// A program failed to link.
    #[error("{program} shader link error:\n{log}")]
    LinkError {
        /// Program label, e.g. "combine".
        program: String,
        /// The driver's info log.
        log: String,
    },
}

/// Prefixes each line of `source` with its right-aligned line number and
/// appends the driver `log` after a blank line.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let width = source.lines().count().max(1).to_string().len();
    let mut out = source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    if !log.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(log);
    }
    out
}

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

/// Compiles a single shader stage of the program labelled `program`.
///
/// # Errors
///
/// Returns `ShaderError::CompileError` if the GLSL source fails to compile.
#[allow(unsafe_code)]
pub fn compile_shader(
    gl: &glow::Context,
    program: &str,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    use glow::HasContext;

    let compile_error = |log: String| ShaderError::CompileError {
        program: program.to_string(),
        stage: stage_name(shader_type).to_string(),
        log,
    };

    // SAFETY: glow wraps raw GL calls as unsafe. shader_type is one of the
    // GL stage constants and the shader is deleted on the failure path.
    unsafe {
        let shader = gl.create_shader(shader_type).map_err(compile_error)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if gl.get_shader_compile_status(shader) {
            Ok(shader)
        } else {
            let info_log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            Err(compile_error(format_shader_error(source, &info_log)))
        }
    }
}

/// Compiles both stages and links them into the program labelled `program`.
///
/// Shader objects are released once linking finishes, whatever the outcome.
///
/// # Errors
///
/// Returns `ShaderError::CompileError` if either stage fails to compile,
/// or `ShaderError::LinkError` if linking fails.
#[allow(unsafe_code)]
pub fn compile_program(
    gl: &glow::Context,
    program: &str,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<glow::Program, ShaderError> {
    use glow::HasContext;

    let link_error = |log: String| ShaderError::LinkError {
        program: program.to_string(),
        log,
    };

    let vert = compile_shader(gl, program, glow::VERTEX_SHADER, vertex_src)?;
    let frag = match compile_shader(gl, program, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(f) => f,
        Err(e) => {
            // SAFETY: vert is a valid shader handle from compile_shader.
            unsafe { gl.delete_shader(vert) };
            return Err(e);
        }
    };

    // SAFETY: vert and frag are valid compiled shaders. The program keeps
    // its own copy after linking, so they are detached and deleted here.
    unsafe {
        let result = match gl.create_program() {
            Ok(handle) => {
                gl.attach_shader(handle, vert);
                gl.attach_shader(handle, frag);
                gl.link_program(handle);
                gl.detach_shader(handle, vert);
                gl.detach_shader(handle, frag);

                if gl.get_program_link_status(handle) {
                    Ok(handle)
                } else {
                    let info_log = gl.get_program_info_log(handle);
                    gl.delete_program(handle);
                    Err(link_error(info_log))
                }
            }
            Err(e) => Err(link_error(e)),
        };

        gl.delete_shader(vert);
        gl.delete_shader(frag);
        result
    }
}

/// Looks up a uniform, warning when the driver optimized it away.
#[allow(unsafe_code)]
pub fn uniform_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
) -> Option<glow::UniformLocation> {
    use glow::HasContext;

    // SAFETY: program is a valid linked program handle.
    let location = unsafe { gl.get_uniform_location(program, name) };
    if location.is_none() {
        log::warn!("uniform '{name}' is not active in the linked program");
    }
    location
}
