//! GLSL ES 3.00 fragment shader generation for the blur and combine steps.
//!
//! Both shaders address textures in pixel coordinates, the way rectangle
//! textures do: `tc` starts at `gl_FragCoord.xy` and the `sample_rect`
//! helper divides by the texture size before sampling. Pair them with
//! `render::FULLSCREEN_VERTEX_SHADER` or any vertex stage that
//! covers the target.

use crate::kernel::BlurKernel;
use std::fmt::Write;

/// Sampler uniform read by the blur shader.
pub const SOURCE_UNIFORM: &str = "u_source";
/// Per-invocation sampling step uniform of the blur shader.
pub const DIRECTION_UNIFORM: &str = "u_direction";
/// Brightness uniform of the combine shader.
pub const BRIGHTNESS_UNIFORM: &str = "u_brightness";

const HEADER: &str = "#version 300 es
precision highp float;
";

const SAMPLE_RECT: &str = "vec4 sample_rect(sampler2D s, vec2 p) {
    return texture(s, p / vec2(textureSize(s, 0)));
}
";

/// Name of the combine shader's sampler for pass `index`.
pub fn pass_sampler_name(index: usize) -> String {
    format!("u_pass{index}")
}

/// Formats `v` as a GLSL float literal.
///
/// GLSL ES has no implicit int-to-float conversion, so integral values
/// must keep their decimal point (`1.0`, never `1`).
pub fn glsl_float(v: f32) -> String {
    format!("{v:?}")
}

/// Generates the separable blur shader for `radius` and `shape`.
///
/// `radius >= 1` and `shape > 0` are preconditions; see [`BlurKernel::new`].
pub fn generate_blur_source(radius: usize, shape: f32) -> String {
    blur_source_for_kernel(&BlurKernel::new(radius, shape))
}

/// Generates the blur shader for an already derived kernel.
pub fn blur_source_for_kernel(kernel: &BlurKernel) -> String {
    let mut src = String::new();
    src.push_str(HEADER);
    let _ = writeln!(src, "uniform sampler2D {SOURCE_UNIFORM};");
    let _ = writeln!(src, "uniform vec2 {DIRECTION_UNIFORM};");
    src.push_str("out vec4 frag_color;\n");
    src.push_str(SAMPLE_RECT);
    src.push_str("void main() {\n");
    src.push_str("    vec2 tc = gl_FragCoord.xy;\n");
    let _ = writeln!(
        src,
        "    frag_color = {} * sample_rect({SOURCE_UNIFORM}, tc);",
        glsl_float(kernel.center())
    );
    for tap in kernel.taps() {
        let offset = glsl_float(tap.offset);
        let _ = writeln!(src, "    frag_color += {} *", glsl_float(tap.weight));
        let _ = writeln!(
            src,
            "        (sample_rect({SOURCE_UNIFORM}, tc - ({DIRECTION_UNIFORM} * {offset})) +"
        );
        let _ = writeln!(
            src,
            "         sample_rect({SOURCE_UNIFORM}, tc + ({DIRECTION_UNIFORM} * {offset})));"
        );
    }
    src.push_str("}\n");
    src
}

/// Generates the shader that sums `passes` blur levels into the base target.
///
/// Level `i` is sampled at `tc * downsample^i`, which lands on the same
/// relative position in a target `downsample^i` times the base size. The
/// sum is scaled by `brightness / passes`.
pub fn generate_combine_source(passes: usize, downsample: f32) -> String {
    let names: Vec<String> = (0..passes).map(pass_sampler_name).collect();

    let mut src = String::new();
    src.push_str(HEADER);
    let _ = writeln!(src, "uniform sampler2D {};", names.join(", "));
    let _ = writeln!(src, "uniform float {BRIGHTNESS_UNIFORM};");
    let _ = writeln!(src, "const float scale_factor = {};", glsl_float(downsample));
    src.push_str("out vec4 frag_color;\n");
    src.push_str(SAMPLE_RECT);
    src.push_str("void main() {\n");
    src.push_str("    vec2 tc = gl_FragCoord.xy;\n");
    for (i, name) in names.iter().enumerate() {
        let op = if i == 0 { " =" } else { "+=" };
        let _ = writeln!(src, "    frag_color {op} sample_rect({name}, tc);");
        if i + 1 != passes {
            src.push_str("    tc *= scale_factor;\n");
        }
    }
    let _ = writeln!(src, "    frag_color *= {BRIGHTNESS_UNIFORM} / {passes}.0;");
    src.push_str("}\n");
    src
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn glsl_float_keeps_decimal_point() {
        assert_eq!(glsl_float(1.0), "1.0");
        assert_eq!(glsl_float(0.5), "0.5");
        assert!(glsl_float(0.0625).contains('.'));
    }

    #[test]
    fn blur_source_declares_expected_interface() {
        let src = generate_blur_source(8, 0.2);
        assert!(src.starts_with("#version 300 es"), "got:\n{src}");
        assert!(src.contains("uniform sampler2D u_source;"));
        assert!(src.contains("uniform vec2 u_direction;"));
        assert!(src.contains("out vec4 frag_color;"));
        assert!(src.contains("void main()"));
    }

    #[test]
    fn blur_source_emits_center_plus_two_fetches_per_tap() {
        let kernel = BlurKernel::new(8, 0.2);
        let src = blur_source_for_kernel(&kernel);
        assert_eq!(count(&src, "sample_rect(u_source"), kernel.fetch_count());
        assert_eq!(count(&src, "frag_color +="), kernel.taps().len());
        assert_eq!(count(&src, "frag_color = "), 1);
    }

    #[test]
    fn blur_source_embeds_tap_offsets_and_weights() {
        let kernel = BlurKernel::new(4, 0.3);
        let src = blur_source_for_kernel(&kernel);
        assert!(src.contains(&glsl_float(kernel.center())));
        for tap in kernel.taps() {
            assert!(src.contains(&format!("u_direction * {}", glsl_float(tap.offset))));
            assert!(src.contains(&format!("frag_color += {} *", glsl_float(tap.weight))));
        }
    }

    #[test]
    fn blur_source_is_deterministic() {
        assert_eq!(generate_blur_source(32, 0.2), generate_blur_source(32, 0.2));
    }

    #[test]
    fn blur_source_stays_numeric_for_extreme_shapes() {
        for shape in [1e-30, 1e38, f32::MAX] {
            let src = generate_blur_source(5, shape);
            assert!(!src.contains("NaN") && !src.contains("inf"), "shape {shape}:\n{src}");
        }
    }

    #[test]
    fn combine_source_declares_one_sampler_per_pass() {
        let src = generate_combine_source(3, 0.5);
        assert!(
            src.contains("uniform sampler2D u_pass0, u_pass1, u_pass2;"),
            "got:\n{src}"
        );
        assert!(!src.contains("u_pass3"));
        assert!(src.contains("uniform float u_brightness;"));
    }

    #[test]
    fn combine_source_accumulates_once_per_pass() {
        for passes in 1..=6 {
            let src = generate_combine_source(passes, 0.5);
            let samples = src.lines().filter(|l| l.contains("sample_rect(u_pass")).count();
            assert_eq!(samples, passes, "passes = {passes}");
            assert_eq!(count(&src, "frag_color  ="), 1);
            assert_eq!(count(&src, "frag_color +="), passes - 1);
            assert_eq!(count(&src, "tc *= scale_factor;"), passes - 1);
        }
    }

    #[test]
    fn combine_source_divides_by_pass_count() {
        let src = generate_combine_source(4, 0.5);
        assert!(src.contains("frag_color *= u_brightness / 4.0;"), "got:\n{src}");
        assert!(src.contains("const float scale_factor = 0.5;"));
    }

    #[test]
    fn combine_source_keeps_unit_downsample() {
        let src = generate_combine_source(2, 1.0);
        assert!(src.contains("const float scale_factor = 1.0;"), "got:\n{src}");
    }
}
