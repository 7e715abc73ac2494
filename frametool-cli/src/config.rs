//! Command-line options, the optional TOML config file, and their merge

use clap::{ArgAction, Args};
use frametool_io::{
    pipeline::{DEFAULT_CHUNK_PREFIX, DEFAULT_MAX_CHUNK_SIZE},
    GenOptions, OutputFormat, OutputSink, Packing, RunConfig, SplitOptions, WriteFailurePolicy,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options shared by every command
#[derive(Args, Debug, Default, Clone)]
pub struct RunOptions {
    /// Output format (raw, json)
    #[arg(long = "output-fmt", value_name = "NAME")]
    pub output_fmt: Option<String>,
    /// Pack all frames into a single burst before writing
    #[arg(long = "output-burst")]
    pub output_burst: bool,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Maximum encoded size of a split chunk, in bytes [default: 1024]
    #[arg(long, value_name = "BYTES")]
    pub max_chunk_size: Option<u64>,
    /// File name prefix for split chunks [default: databurst]
    #[arg(long, value_name = "PREFIX")]
    pub chunk_prefix: Option<String>,
    /// Number of frames to generate [default: 10]
    #[arg(long)]
    pub count: Option<u64>,
    /// Seed for generated frame content [default: 1]
    #[arg(long)]
    pub seed: Option<u64>,
    /// Keep reading after an output write fails (the run still exits non-zero)
    #[arg(long)]
    pub keep_going: bool,
    /// Show a progress spinner on stderr
    #[arg(long)]
    pub progress: bool,
    /// Read defaults from a TOML file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Defaults read from a config file
///
/// Every key is optional. Unknown keys are rejected so typos surface early.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub output_fmt: Option<String>,
    pub output_burst: Option<bool>,
    pub output: Option<PathBuf>,
    pub max_chunk_size: Option<u64>,
    pub chunk_prefix: Option<String>,
    pub count: Option<u64>,
    pub seed: Option<u64>,
    pub keep_going: Option<bool>,
    pub progress: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything a run needs once flags and config file are merged
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub run: RunConfig,
    pub output: OutputSink,
    pub progress: bool,
}

impl Settings {
    /// Merge flags over the config file over built-in defaults
    pub fn resolve(opts: &RunOptions, file: FileConfig) -> Self {
        let format = opts
            .output_fmt
            .clone()
            .or(file.output_fmt)
            .unwrap_or_else(|| OutputFormat::Raw.to_string());
        let packing = if opts.output_burst || file.output_burst.unwrap_or(false) {
            Packing::Burst
        } else {
            Packing::Frame
        };
        let on_write_failure = if opts.keep_going || file.keep_going.unwrap_or(false) {
            WriteFailurePolicy::Continue
        } else {
            WriteFailurePolicy::Abort
        };

        let gen_defaults = GenOptions::default();
        let run = RunConfig {
            format,
            packing,
            on_write_failure,
            split: SplitOptions {
                max_chunk_size: opts
                    .max_chunk_size
                    .or(file.max_chunk_size)
                    .unwrap_or(DEFAULT_MAX_CHUNK_SIZE),
                first_ordinal: 0,
            },
            chunk_prefix: opts
                .chunk_prefix
                .clone()
                .or(file.chunk_prefix)
                .unwrap_or_else(|| DEFAULT_CHUNK_PREFIX.to_string()),
            gen: GenOptions {
                count: opts.count.or(file.count).unwrap_or(gen_defaults.count),
                seed: opts.seed.or(file.seed).unwrap_or(gen_defaults.seed),
                ..gen_defaults
            },
        };

        let output = match opts.output.clone().or(file.output) {
            Some(path) => OutputSink::Path(path),
            None => OutputSink::Stdout,
        };

        Self {
            run,
            output,
            progress: opts.progress || file.progress.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_flags_or_file() {
        let settings = Settings::resolve(&RunOptions::default(), FileConfig::default());
        assert_eq!(settings.run, RunConfig::default());
        assert_eq!(settings.output, OutputSink::Stdout);
        assert!(!settings.progress);
    }

    #[test]
    fn file_values_apply_when_flags_absent() {
        let file: FileConfig = toml::from_str(
            r#"
            output_fmt = "json"
            max_chunk_size = 4096
            chunk_prefix = "part"
            count = 3
            seed = 42
            keep_going = true
            output = "out.bin"
            "#,
        )
        .unwrap();

        let settings = Settings::resolve(&RunOptions::default(), file);
        assert_eq!(settings.run.format, "json");
        assert_eq!(settings.run.split.max_chunk_size, 4096);
        assert_eq!(settings.run.chunk_prefix, "part");
        assert_eq!(settings.run.gen.count, 3);
        assert_eq!(settings.run.gen.seed, 42);
        assert_eq!(settings.run.on_write_failure, WriteFailurePolicy::Continue);
        assert_eq!(settings.output, OutputSink::Path(PathBuf::from("out.bin")));
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig {
            output_fmt: Some("json".into()),
            count: Some(3),
            chunk_prefix: Some("part".into()),
            ..FileConfig::default()
        };
        let opts = RunOptions {
            output_fmt: Some("raw".into()),
            count: Some(7),
            output_burst: true,
            ..RunOptions::default()
        };

        let settings = Settings::resolve(&opts, file);
        assert_eq!(settings.run.format, "raw");
        assert_eq!(settings.run.gen.count, 7);
        assert_eq!(settings.run.chunk_prefix, "part");
        assert_eq!(settings.run.packing, Packing::Burst);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = toml::from_str::<FileConfig>("max_chunk = 10").unwrap_err();
        assert!(err.to_string().contains("max_chunk"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
