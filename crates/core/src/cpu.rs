//! CPU reference executor for the blur chain.
//!
//! Runs the same [`Step`] sequence as the GPU path on [`Image`]s. Sampling
//! is bilinear with clamp-to-edge in pixel coordinates (texel centers at
//! `i + 0.5`), which is what a `LINEAR` / `CLAMP_TO_EDGE` texture returns
//! for `texture(s, p / size)`.

use crate::config::{BlurConfig, FrameParams};
use crate::error::BlurError;
use crate::kernel::BlurKernel;
use crate::plan::{build_steps, execute_steps, ChainLayout, Extent, Step, StepExecutor, Target};
use glam::{Vec2, Vec4};

/// An RGBA image with linear `f32` channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl Image {
    /// A transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    /// An image with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Vec4) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wraps row-major pixels.
    ///
    /// # Errors
    ///
    /// Returns `BlurError::BufferSize` if `pixels.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec4>) -> Result<Self, BlurError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(BlurError::BufferSize {
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Converts 8-bit RGBA bytes to `[0, 1]` floats.
    ///
    /// # Errors
    ///
    /// Returns `BlurError::BufferSize` if `bytes.len() != width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, BlurError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(BlurError::BufferSize {
                expected,
                got: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| Vec4::new(c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32) / 255.0)
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Quantizes to 8-bit RGBA, clamping each channel to `[0, 1]`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| {
                let q = (p.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
                [q.x as u8, q.y as u8, q.z as u8, q.w as u8]
            })
            .collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn extent(&self) -> Extent {
        Extent {
            width: self.width,
            height: self.height,
        }
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Pixel at integer coordinates.
    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Vec4) {
        let i = self.index(x, y);
        self.pixels[i] = value;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Bilinear sample at pixel coordinate `p`, clamped to the edge texels.
    ///
    /// Coordinates far outside the image, and NaN, land on an edge texel.
    pub fn sample_rect(&self, p: Vec2) -> Vec4 {
        let max_x = self.width.saturating_sub(1);
        let max_y = self.height.saturating_sub(1);
        // One texel of margin past each edge keeps the lerp weight at 0 or 1
        // there. `f32::max` maps NaN to the lower bound.
        let u = (p - Vec2::splat(0.5)).clamp(
            Vec2::splat(-1.0),
            Vec2::new(max_x as f32 + 1.0, max_y as f32 + 1.0),
        );
        let base = u.floor();
        let f = u - base;
        let x0 = (base.x as i64).clamp(0, i64::from(max_x)) as u32;
        let x1 = (base.x as i64 + 1).clamp(0, i64::from(max_x)) as u32;
        let y0 = (base.y as i64).clamp(0, i64::from(max_y)) as u32;
        let y1 = (base.y as i64 + 1).clamp(0, i64::from(max_y)) as u32;

        let top = self.get(x0, y0).lerp(self.get(x1, y0), f.x);
        let bottom = self.get(x0, y1).lerp(self.get(x1, y1), f.x);
        top.lerp(bottom, f.y)
    }

    fn map_pixels(&mut self, mut f: impl FnMut(Vec2) -> Vec4) {
        let width = self.width as usize;
        for (i, px) in self.pixels.iter_mut().enumerate() {
            let center = Vec2::new((i % width) as f32 + 0.5, (i / width) as f32 + 0.5);
            *px = f(center);
        }
    }
}

/// Stretches `src` over the whole of `dst` with bilinear filtering.
pub(crate) fn resample(src: &Image, dst: &mut Image) {
    let ratio = Vec2::new(
        src.width as f32 / dst.width as f32,
        src.height as f32 / dst.height as f32,
    );
    dst.map_pixels(|p| src.sample_rect(p * ratio));
}

/// One 1D blur of `src` into `dst` along `direction`.
pub(crate) fn blur_1d(src: &Image, dst: &mut Image, kernel: &BlurKernel, direction: Vec2) {
    dst.map_pixels(|tc| {
        kernel.taps().iter().fold(
            kernel.center() * src.sample_rect(tc),
            |acc, tap| {
                let step = direction * tap.offset;
                acc + tap.weight * (src.sample_rect(tc - step) + src.sample_rect(tc + step))
            },
        )
    });
}

/// Sums every level into `dst`, scaling `tc` by `downsample` between levels.
pub(crate) fn combine(levels: &[Image], dst: &mut Image, downsample: f32, brightness: f32) {
    let scale = brightness / levels.len() as f32;
    dst.map_pixels(|p| {
        let mut tc = p;
        let mut acc = Vec4::ZERO;
        for (i, level) in levels.iter().enumerate() {
            acc += level.sample_rect(tc);
            if i + 1 != levels.len() {
                tc *= downsample;
            }
        }
        acc * scale
    });
}

/// Images of every target plus what the blur and combine steps read.
struct Targets {
    kernel: BlurKernel,
    downsample: f32,
    base: Image,
    ping: Vec<Image>,
    pong: Vec<Image>,
}

impl Targets {
    fn get(&self, target: Target) -> &Image {
        match target {
            Target::Base => &self.base,
            Target::Ping(i) => &self.ping[i],
            Target::Pong(i) => &self.pong[i],
        }
    }

    fn get_mut(&mut self, target: Target) -> &mut Image {
        match target {
            Target::Base => &mut self.base,
            Target::Ping(i) => &mut self.ping[i],
            Target::Pong(i) => &mut self.pong[i],
        }
    }

    /// Renders into `dst` from the other targets, which stay readable.
    fn render_into(&mut self, dst: Target, f: impl FnOnce(&Self, &mut Image)) {
        let mut out = std::mem::take(self.get_mut(dst));
        f(self, &mut out);
        *self.get_mut(dst) = out;
    }
}

impl StepExecutor for Targets {
    fn resample(&mut self, src: Target, dst: Target) {
        self.render_into(dst, |t, out| resample(t.get(src), out));
    }

    fn blur(&mut self, src: Target, dst: Target, direction: Vec2) {
        self.render_into(dst, |t, out| blur_1d(t.get(src), out, &t.kernel, direction));
    }

    fn combine(&mut self, passes: usize, brightness: f32) {
        combine(&self.ping[..passes], &mut self.base, self.downsample, brightness);
    }
}

/// The blur chain running on the CPU.
///
/// Holds one image per target, allocated once and reused across runs.
pub struct CpuBlur {
    config: BlurConfig,
    layout: ChainLayout,
    steps: Vec<Step>,
    targets: Targets,
}

impl CpuBlur {
    /// Validates `config` and allocates the chain.
    ///
    /// # Errors
    ///
    /// Returns any error from [`ChainLayout::new`].
    pub fn new(config: BlurConfig) -> Result<Self, BlurError> {
        let layout = ChainLayout::new(&config)?;
        let kernel = BlurKernel::new(config.radius, config.shape);
        let level_images = || -> Vec<Image> {
            layout
                .levels()
                .iter()
                .map(|e| Image::new(e.width, e.height))
                .collect()
        };
        let targets = Targets {
            downsample: config.downsample,
            base: Image::new(config.width, config.height),
            ping: level_images(),
            pong: level_images(),
            kernel,
        };
        log::debug!(
            "cpu blur chain: {} taps, levels {:?}",
            targets.kernel.taps().len(),
            layout.levels()
        );

        Ok(Self {
            config,
            steps: build_steps(config.passes),
            layout,
            targets,
        })
    }

    pub fn config(&self) -> &BlurConfig {
        &self.config
    }

    pub fn layout(&self) -> &ChainLayout {
        &self.layout
    }

    pub fn kernel(&self) -> &BlurKernel {
        &self.targets.kernel
    }

    /// The blurred result of the last [`Self::run`].
    pub fn output(&self) -> &Image {
        &self.targets.base
    }

    /// Level `i` as left by the last run: blurred, at its reduced size.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not below the pass count.
    pub fn level(&self, i: usize) -> &Image {
        &self.targets.ping[i]
    }

    /// Copies `input` into base and runs the full chain over it.
    ///
    /// # Errors
    ///
    /// Returns `BlurError::DimensionMismatch` if `input` is not the configured size.
    pub fn run(&mut self, input: &Image, params: &FrameParams) -> Result<&Image, BlurError> {
        if input.extent() != self.layout.base() {
            return Err(BlurError::DimensionMismatch {
                expected_w: self.config.width,
                expected_h: self.config.height,
                got_w: input.width,
                got_h: input.height,
            });
        }
        self.targets.base.pixels.copy_from_slice(&input.pixels);
        execute_steps(&self.steps, params, &mut self.targets);
        Ok(&self.targets.base)
    }
}

/// Convenience: blur `input` once with a freshly built chain.
///
/// # Errors
///
/// Returns configuration and dimension errors from [`CpuBlur`].
pub fn blur_image(
    input: &Image,
    config: BlurConfig,
    params: &FrameParams,
) -> Result<Image, BlurError> {
    let mut chain = CpuBlur::new(config)?;
    chain.run(input, params)?;
    Ok(chain.targets.base)
}
