//! Failures of the `multiblur` binary and the exit code each one maps to.
//!
//! | code | cause |
//! |------|-------|
//! | 2    | argument parsing (clap, before `run`) |
//! | 10   | a configuration value out of range |
//! | 11   | chain cannot be laid out: a level collapses to zero pixels |
//! | 12   | `--params` is not valid JSON |
//! | 13   | input PNG cannot be opened or decoded |
//! | 14   | output PNG cannot be encoded or written |
//! | 15   | the JSON report cannot be serialized |

use multiblur_core::BlurError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(BlurError),

    #[error("{0}")]
    Layout(BlurError),

    #[error("invalid --params JSON: {0}")]
    Params(serde_json::Error),

    #[error("{source}")]
    Load { path: PathBuf, source: BlurError },

    #[error("{source}")]
    Write { path: PathBuf, source: BlurError },

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

impl CliError {
    pub fn load(path: &Path, source: BlurError) -> Self {
        CliError::Load {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: BlurError) -> Self {
        CliError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 10,
            CliError::Layout(_) => 11,
            CliError::Params(_) => 12,
            CliError::Load { .. } => 13,
            CliError::Write { .. } => 14,
            CliError::Report(_) => 15,
        }
    }

    /// The image file involved, for load and write failures.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CliError::Load { path, .. } | CliError::Write { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Chain errors: collapsed levels and size mismatches are layout failures,
/// everything else is a bad configuration value.
impl From<BlurError> for CliError {
    fn from(e: BlurError) -> Self {
        match e {
            BlurError::DegenerateLevel { .. }
            | BlurError::DimensionMismatch { .. }
            | BlurError::BufferSize { .. } => CliError::Layout(e),
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bad_json() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{radius").unwrap_err()
    }

    #[test]
    fn every_failure_class_has_its_own_code() {
        let errors = [
            CliError::Config(BlurError::InvalidRadius),
            CliError::Layout(BlurError::DegenerateLevel {
                pass: 3,
                width: 0,
                height: 0,
            }),
            CliError::Params(bad_json()),
            CliError::load(Path::new("in.png"), BlurError::Io("missing".into())),
            CliError::write(Path::new("out.png"), BlurError::Io("read-only".into())),
            CliError::Report(bad_json()),
        ];
        let codes: Vec<i32> = errors.iter().map(CliError::exit_code).collect();
        assert_eq!(codes, [10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn collapsed_level_is_a_layout_failure() {
        let err = CliError::from(BlurError::DegenerateLevel {
            pass: 2,
            width: 0,
            height: 1,
        });
        assert!(matches!(err, CliError::Layout(_)));
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn out_of_range_value_is_a_config_failure() {
        let err = CliError::from(BlurError::InvalidDownsample(2.0));
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("downsample"));
    }

    #[test]
    fn load_and_write_keep_the_image_path() {
        let load = CliError::load(Path::new("frames/in.png"), BlurError::Io("decode".into()));
        let write = CliError::write(Path::new("out.png"), BlurError::Io("denied".into()));
        assert_eq!(load.path(), Some(Path::new("frames/in.png")));
        assert_eq!(write.path(), Some(Path::new("out.png")));
        assert!(write.to_string().contains("denied"));
        assert_eq!(CliError::Params(bad_json()).path(), None);
    }

    #[test]
    fn params_error_names_the_flag() {
        let err = CliError::Params(bad_json());
        assert!(err.to_string().starts_with("invalid --params JSON"));
    }

    #[test]
    fn question_mark_on_serde_error_is_a_report_failure() {
        let err: CliError = bad_json().into();
        assert_eq!(err.exit_code(), 15);
    }
}
