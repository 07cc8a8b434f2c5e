#![deny(unsafe_code)]
//! CLI binary for the multi-pass blur.
//!
//! Subcommands:
//! - `kernel` : print the reduced Gaussian taps for a radius and shape
//! - `shaders` : print the generated blur and combine GLSL
//! - `plan` : print level sizes and the per-frame step sequence
//! - `render <input>` : blur a PNG with the CPU executor

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use multiblur_core::source::blur_source_for_kernel;
use multiblur_core::{
    build_steps, generate_combine_source, BlurConfig, BlurKernel, ChainLayout, CpuBlur,
    FrameParams,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "multiblur", about = "Multi-pass Gaussian blur tools")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the reduced Gaussian taps.
    Kernel {
        /// Half-width of the Gaussian row in texels.
        #[arg(short, long, default_value_t = 32)]
        radius: usize,

        /// Gaussian variance over the [-1, 1] row.
        #[arg(short, long, default_value_t = 0.2)]
        shape: f32,
    },
    /// Print the generated GLSL for a chain configuration.
    Shaders {
        /// Chain parameters as JSON (radius, shape, passes, downsample).
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Print target sizes and the step sequence of a chain.
    Plan {
        /// Base width in pixels.
        #[arg(short = 'W', long, default_value_t = 1024)]
        width: u32,

        /// Base height in pixels.
        #[arg(short = 'H', long, default_value_t = 768)]
        height: u32,

        /// Chain parameters as JSON (radius, shape, passes, downsample).
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Blur a PNG on the CPU and write the result.
    Render {
        /// Input PNG.
        input: PathBuf,

        /// Output PNG.
        #[arg(short, long, default_value = "blurred.png")]
        output: PathBuf,

        /// Chain and frame parameters as JSON (radius, shape, passes,
        /// downsample, scale, rotation, brightness).
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

fn parse_params(params: &str) -> Result<Value, CliError> {
    serde_json::from_str(params).map_err(CliError::Params)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Kernel { radius, shape } => {
            let config = BlurConfig {
                radius,
                shape,
                ..BlurConfig::new(1, 1)
            };
            config.validate()?;
            let kernel = BlurKernel::new(radius, shape);
            if cli.json {
                let info = json!({
                    "radius": radius,
                    "shape": shape,
                    "fetches": kernel.fetch_count(),
                    "kernel": kernel,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("center  {:.6}", kernel.center());
                for tap in kernel.taps() {
                    println!("+-{:<8.4} {:.6}", tap.offset, tap.weight);
                }
                println!(
                    "{} fetches instead of {}, total weight {:.6}",
                    kernel.fetch_count(),
                    2 * radius + 1,
                    kernel.total_weight()
                );
            }
        }
        Command::Shaders { params } => {
            let params = parse_params(&params)?;
            let config = BlurConfig::from_json(1, 1, &params);
            config.validate()?;
            let blur = blur_source_for_kernel(&BlurKernel::new(config.radius, config.shape));
            let combine =
                (config.passes > 1).then(|| generate_combine_source(config.passes, config.downsample));
            if cli.json {
                let info = json!({"blur": blur, "combine": combine});
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("// blur\n{blur}");
                if let Some(combine) = combine {
                    println!("// combine\n{combine}");
                }
            }
        }
        Command::Plan {
            width,
            height,
            params,
        } => {
            let params = parse_params(&params)?;
            let config = BlurConfig::from_json(width, height, &params);
            let layout = ChainLayout::new(&config)?;
            let steps = build_steps(config.passes);
            if cli.json {
                let info = json!({
                    "config": config,
                    "layout": layout,
                    "steps": steps,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("base {}", layout.base());
                for (i, level) in layout.levels().iter().enumerate() {
                    println!("level {i}: {level}");
                }
                for step in &steps {
                    println!("  {step}");
                }
            }
        }
        Command::Render {
            input,
            output,
            params,
        } => {
            let params = parse_params(&params)?;
            let image = multiblur_core::snapshot::load_png(&input)
                .map_err(|e| CliError::load(&input, e))?;
            let config = BlurConfig::from_json(image.width(), image.height(), &params);
            let frame = FrameParams::from_json(&params);

            let mut chain = CpuBlur::new(config)?;
            let result = chain.run(&image, &frame)?;
            multiblur_core::snapshot::write_png(result, &output)
                .map_err(|e| CliError::write(&output, e))?;

            if cli.json {
                let info = json!({
                    "input": input.display().to_string(),
                    "output": output.display().to_string(),
                    "config": config,
                    "frame": frame,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "blurred {} ({}x{}, {} passes, radius {}) -> {}",
                    input.display(),
                    config.width,
                    config.height,
                    config.passes,
                    config.radius,
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let mut j = json!({"error": e.to_string(), "exit_code": e.exit_code()});
            if let Some(path) = e.path() {
                j["path"] = json!(path.display().to_string());
            }
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
