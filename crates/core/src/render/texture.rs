//! Texture allocation for the blur chain's color attachments.
//!
//! Ping/pong levels are RGBA8 and filtered linearly, since the blur taps
//! rely on bilinear filtering. The optional float base target is RGBA32F
//! with nearest filtering: it is only ever blitted, and linear filtering of
//! 32-bit float textures is an extension on GLES.

/// Configuration for creating a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// GL internal format (e.g. `glow::RGBA8`).
    pub internal_format: u32,
    /// GL texture filter mode (e.g. `glow::LINEAR`).
    pub filter: u32,
}

impl TextureConfig {
    /// An 8-bit RGBA texture with LINEAR filtering.
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            internal_format: glow::RGBA8,
            filter: glow::LINEAR,
        }
    }

    /// A 32-bit float RGBA texture with NEAREST filtering.
    pub fn rgba32f(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            internal_format: glow::RGBA32F,
            filter: glow::NEAREST,
        }
    }

    /// The base target's format for the `use_float_texture` flag.
    pub fn base(width: u32, height: u32, use_float_texture: bool) -> Self {
        if use_float_texture {
            Self::rgba32f(width, height)
        } else {
            Self::rgba8(width, height)
        }
    }
}

/// Upload pixel type for the chain's two formats.
fn pixel_type_for_format(internal_format: u32) -> u32 {
    if internal_format == glow::RGBA32F {
        glow::FLOAT
    } else {
        glow::UNSIGNED_BYTE
    }
}

/// Creates a GPU texture from the given configuration.
///
/// Wraps with `CLAMP_TO_EDGE` on both axes, so blur taps past the border
/// repeat the edge texel.
///
/// # Errors
///
/// Returns an error string if the GL context fails to create the texture.
#[allow(unsafe_code)]
pub fn create_texture(gl: &glow::Context, config: &TextureConfig) -> Result<glow::Texture, String> {
    use glow::HasContext;

    // SAFETY: glow wraps raw GL calls as unsafe. The texture is created,
    // configured and allocated with values taken from TextureConfig.
    unsafe {
        let texture = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));

        let clamp = glow::CLAMP_TO_EDGE as i32;
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, clamp);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, clamp);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, config.filter as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, config.filter as i32);

        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            config.internal_format as i32,
            config.width as i32,
            config.height as i32,
            0,
            glow::RGBA,
            pixel_type_for_format(config.internal_format),
            glow::PixelUnpackData::Slice(None),
        );

        gl.bind_texture(glow::TEXTURE_2D, None);
        Ok(texture)
    }
}
