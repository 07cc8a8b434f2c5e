//! The GPU blur effect: owns the target chain and both programs, and runs
//! the pass plan when a capture ends.
//!
//! ```text
//! let mut blur = MultiPassBlur::setup(&ctx, BlurConfig::new(1280, 720))?;
//! {
//!     let capture = blur.begin(&ctx);
//!     draw_scene(capture.gl());
//! } // dropping (or calling `end()` on) the capture runs the chain
//! blur.draw(&ctx);
//! ```

use super::context::GpuContext;
use super::fullscreen::{FullscreenTriangle, FULLSCREEN_VERTEX_SHADER};
use super::shader::{compile_program, uniform_location};
use super::state::SavedState;
use super::target::{Rect, RenderTarget};
use super::texture::TextureConfig;
use crate::config::{BlurConfig, FrameParams};
use crate::error::BlurError;
use crate::kernel::BlurKernel;
use crate::plan::{build_steps, execute_steps, ChainLayout, Extent, Step, StepExecutor, Target};
use crate::source::{
    blur_source_for_kernel, generate_combine_source, pass_sampler_name, BRIGHTNESS_UNIFORM,
    DIRECTION_UNIFORM, SOURCE_UNIFORM,
};
use glam::Vec2;

struct BlurProgram {
    program: glow::Program,
    source: Option<glow::UniformLocation>,
    direction: Option<glow::UniformLocation>,
}

impl BlurProgram {
    fn new(gl: &glow::Context, kernel: &BlurKernel) -> Result<Self, BlurError> {
        let src = blur_source_for_kernel(kernel);
        log::debug!("loading blur shader:\n{src}");
        let program = compile_program(gl, "blur", FULLSCREEN_VERTEX_SHADER, &src)?;
        Ok(Self {
            program,
            source: uniform_location(gl, program, SOURCE_UNIFORM),
            direction: uniform_location(gl, program, DIRECTION_UNIFORM),
        })
    }

    #[allow(unsafe_code)]
    fn bind(&self, gl: &glow::Context, texture: glow::Texture, direction: Vec2) {
        use glow::HasContext;

        // SAFETY: program and texture are live handles owned by the effect.
        unsafe {
            gl.use_program(Some(self.program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.uniform_1_i32(self.source.as_ref(), 0);
            gl.uniform_2_f32(self.direction.as_ref(), direction.x, direction.y);
        }
    }
}

struct CombineProgram {
    program: glow::Program,
    samplers: Vec<Option<glow::UniformLocation>>,
    brightness: Option<glow::UniformLocation>,
}

impl CombineProgram {
    fn new(gl: &glow::Context, passes: usize, downsample: f32) -> Result<Self, BlurError> {
        let src = generate_combine_source(passes, downsample);
        log::debug!("loading combine shader:\n{src}");
        let program = compile_program(gl, "combine", FULLSCREEN_VERTEX_SHADER, &src)?;
        let samplers = (0..passes)
            .map(|i| uniform_location(gl, program, &pass_sampler_name(i)))
            .collect();
        Ok(Self {
            program,
            samplers,
            brightness: uniform_location(gl, program, BRIGHTNESS_UNIFORM),
        })
    }

    #[allow(unsafe_code)]
    fn bind(&self, gl: &glow::Context, levels: &[RenderTarget], brightness: f32) {
        use glow::HasContext;

        // SAFETY: program and level textures are live handles owned by the
        // effect; setup checked the pass count against the texture units.
        unsafe {
            gl.use_program(Some(self.program));
            for (unit, (level, location)) in levels.iter().zip(&self.samplers).enumerate() {
                gl.active_texture(glow::TEXTURE0 + unit as u32);
                gl.bind_texture(glow::TEXTURE_2D, Some(level.texture()));
                gl.uniform_1_i32(location.as_ref(), unit as i32);
            }
            gl.uniform_1_f32(self.brightness.as_ref(), brightness);
        }
    }
}

#[allow(unsafe_code)]
fn delete_program(gl: &glow::Context, program: glow::Program) {
    use glow::HasContext;

    // SAFETY: program is a valid handle that nothing else references.
    unsafe { gl.delete_program(program) };
}

/// Creates base plus one ping and one pong per level, cleared to zero.
///
/// On failure every target created so far is destroyed.
fn create_targets(
    gl: &glow::Context,
    layout: &ChainLayout,
    use_float_texture: bool,
) -> Result<(RenderTarget, Vec<RenderTarget>, Vec<RenderTarget>), BlurError> {
    let base_extent = layout.base();
    let mut configs = vec![TextureConfig::base(
        base_extent.width,
        base_extent.height,
        use_float_texture,
    )];
    for level in layout.levels() {
        log::debug!("building ping/pong {level}");
        configs.push(TextureConfig::rgba8(level.width, level.height));
        configs.push(TextureConfig::rgba8(level.width, level.height));
    }

    let mut created = Vec::with_capacity(configs.len());
    for config in &configs {
        match RenderTarget::new(gl, config) {
            Ok(target) => {
                target.clear(gl);
                created.push(target);
            }
            Err(e) => {
                created.into_iter().for_each(|t| t.destroy(gl));
                return Err(BlurError::Gpu(e));
            }
        }
    }

    let mut targets = created.into_iter();
    let base = targets
        .next()
        .ok_or_else(|| BlurError::Gpu("base target missing".to_string()))?;
    let (mut ping, mut pong) = (Vec::new(), Vec::new());
    while let (Some(p), Some(q)) = (targets.next(), targets.next()) {
        ping.push(p);
        pong.push(q);
    }
    Ok((base, ping, pong))
}

/// Multi-pass Gaussian blur over a chain of GPU render targets.
pub struct MultiPassBlur {
    config: BlurConfig,
    layout: ChainLayout,
    kernel: BlurKernel,
    steps: Vec<Step>,
    params: FrameParams,
    base: RenderTarget,
    ping: Vec<RenderTarget>,
    pong: Vec<RenderTarget>,
    blur: BlurProgram,
    combine: Option<CombineProgram>,
    triangle: FullscreenTriangle,
}

impl MultiPassBlur {
    /// Compiles the shaders and allocates the target chain for `config`.
    ///
    /// The combine program is only built when `config.passes > 1`. All
    /// targets start cleared to transparent black. GL state touched while
    /// clearing is restored before returning.
    ///
    /// # Errors
    ///
    /// Returns config and layout errors, `BlurError::FloatTargetUnsupported`,
    /// a `BlurError::Shader` with the numbered source if a generated shader
    /// fails, or `BlurError::Gpu` if an object cannot be allocated.
    #[allow(unsafe_code)]
    pub fn setup(ctx: &GpuContext, config: BlurConfig) -> Result<Self, BlurError> {
        use glow::HasContext;

        let gl = ctx.gl();
        let layout = ChainLayout::new(&config)?;
        if config.use_float_texture && !ctx.supports_color_buffer_float() {
            return Err(BlurError::FloatTargetUnsupported);
        }
        // SAFETY: read-only limit query.
        let units = unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS) };
        if config.passes > units.max(1) as usize {
            return Err(BlurError::Gpu(format!(
                "{} passes need more than the {units} available texture units",
                config.passes
            )));
        }

        let kernel = BlurKernel::new(config.radius, config.shape);
        let blur = BlurProgram::new(gl, &kernel)?;
        let combine = if config.passes > 1 {
            match CombineProgram::new(gl, config.passes, config.downsample) {
                Ok(c) => Some(c),
                Err(e) => {
                    delete_program(gl, blur.program);
                    return Err(e);
                }
            }
        } else {
            None
        };
        let release_programs = |gl: &glow::Context| {
            delete_program(gl, blur.program);
            if let Some(c) = &combine {
                delete_program(gl, c.program);
            }
        };

        let triangle = match FullscreenTriangle::new(gl) {
            Ok(t) => t,
            Err(e) => {
                release_programs(gl);
                return Err(BlurError::Gpu(e));
            }
        };

        let saved = SavedState::capture(gl);
        let targets = create_targets(gl, &layout, config.use_float_texture);
        saved.restore(gl);
        let (base, ping, pong) = match targets {
            Ok(t) => t,
            Err(e) => {
                release_programs(gl);
                triangle.destroy(gl);
                return Err(e);
            }
        };

        log::debug!(
            "blur chain ready: {} passes, {} taps, levels {:?}",
            config.passes,
            kernel.taps().len(),
            layout.levels()
        );

        Ok(Self {
            config,
            layout,
            kernel,
            steps: build_steps(config.passes),
            params: FrameParams::default(),
            base,
            ping,
            pong,
            blur,
            combine,
            triangle,
        })
    }

    /// Starts capturing: binds base as the draw target until the returned
    /// guard ends.
    pub fn begin<'a>(&'a mut self, ctx: &'a GpuContext) -> Capture<'a> {
        let saved = SavedState::capture(ctx.gl());
        self.base.bind(ctx.gl());
        Capture {
            blur: self,
            ctx,
            saved,
            finished: false,
        }
    }

    /// Blits the result to the default framebuffer at the origin, native size.
    pub fn draw(&self, ctx: &GpuContext) {
        self.draw_at(ctx, 0, 0);
    }

    /// Blits the result to the default framebuffer at `(x, y)`, native size.
    pub fn draw_at(&self, ctx: &GpuContext, x: i32, y: i32) {
        let Extent { width, height } = self.base.extent();
        self.draw_rect(
            ctx,
            Rect {
                x,
                y,
                width: width as i32,
                height: height as i32,
            },
        );
    }

    /// Blits the result stretched over `rect` of the default framebuffer.
    pub fn draw_rect(&self, ctx: &GpuContext, rect: Rect) {
        let gl = ctx.gl();
        let saved = SavedState::capture(gl);
        self.base.blit_to_default(gl, rect);
        saved.restore(gl);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.params.scale = scale;
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.params.rotation = rotation;
    }

    /// Only affects chains with more than one pass.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.params.brightness = brightness;
    }

    pub fn set_params(&mut self, params: FrameParams) {
        self.params = params;
    }

    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    pub fn config(&self) -> &BlurConfig {
        &self.config
    }

    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    pub fn kernel(&self) -> &BlurKernel {
        &self.kernel
    }

    /// The blurred result, valid once a capture has ended.
    pub fn texture(&self) -> glow::Texture {
        self.base.texture()
    }

    /// Releases every GL object owned by the effect.
    pub fn destroy(self, ctx: &GpuContext) {
        let gl = ctx.gl();
        delete_program(gl, self.blur.program);
        if let Some(c) = self.combine {
            delete_program(gl, c.program);
        }
        self.triangle.destroy(gl);
        self.base.destroy(gl);
        self.ping
            .into_iter()
            .chain(self.pong)
            .for_each(|t| t.destroy(gl));
    }

    fn target(&self, target: Target) -> &RenderTarget {
        match target {
            Target::Base => &self.base,
            Target::Ping(i) => &self.ping[i],
            Target::Pong(i) => &self.pong[i],
        }
    }

    #[allow(unsafe_code)]
    fn run_chain(&self, gl: &glow::Context) {
        use glow::HasContext;

        // SAFETY: plain state call; the caller restores blending.
        unsafe { gl.disable(glow::BLEND) };

        execute_steps(&self.steps, &self.params, &mut GlSteps { effect: self, gl });

        // SAFETY: unbinding leaves no dangling references to chain objects.
        unsafe {
            for unit in 0..self.ping.len().max(1) {
                gl.active_texture(glow::TEXTURE0 + unit as u32);
                gl.bind_texture(glow::TEXTURE_2D, None);
            }
            gl.active_texture(glow::TEXTURE0);
            gl.use_program(None);
        }
    }
}

/// Draws the plan's steps with the effect's targets and programs.
struct GlSteps<'a> {
    effect: &'a MultiPassBlur,
    gl: &'a glow::Context,
}

impl StepExecutor for GlSteps<'_> {
    fn resample(&mut self, src: Target, dst: Target) {
        self.effect
            .target(src)
            .blit_to(self.gl, self.effect.target(dst));
    }

    fn blur(&mut self, src: Target, dst: Target, direction: Vec2) {
        self.effect.target(dst).bind(self.gl);
        self.effect
            .blur
            .bind(self.gl, self.effect.target(src).texture(), direction);
        self.effect.triangle.draw(self.gl);
    }

    fn combine(&mut self, passes: usize, brightness: f32) {
        if let Some(combine) = &self.effect.combine {
            self.effect.base.bind(self.gl);
            combine.bind(self.gl, &self.effect.ping[..passes], brightness);
            self.effect.triangle.draw(self.gl);
        }
    }
}

/// An open capture into the effect's base target.
///
/// Ending the capture, explicitly or by drop, runs the blur chain exactly
/// once and restores the framebuffer, viewport and blend state that were
/// current at [`MultiPassBlur::begin`].
pub struct Capture<'a> {
    blur: &'a mut MultiPassBlur,
    ctx: &'a GpuContext,
    saved: SavedState,
    finished: bool,
}

impl Capture<'_> {
    /// The GL context to draw the scene with.
    pub fn gl(&self) -> &glow::Context {
        self.ctx.gl()
    }

    /// Size of the capture target.
    pub fn extent(&self) -> Extent {
        self.blur.base.extent()
    }

    /// Ends the capture and runs the chain.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let gl = self.ctx.gl();
        self.blur.run_chain(gl);
        self.saved.restore(gl);
    }
}

impl Drop for Capture<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
