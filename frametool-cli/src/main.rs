//! frametool CLI - Command-line tool for frame streams
//!
//! This binary provides:
//! - cat: re-encode frames from stdin or files to the output
//! - gen: emit deterministic synthetic frames
//! - split: repack frames into size-bounded numbered burst files

mod config;
mod logging;

use clap::{CommandFactory, FromArgMatches, Parser};
use config::{ConfigError, FileConfig, RunOptions, Settings};
use frametool_io::{
    CommandRegistry, CommandSummary, EncoderRegistry, Frame, FrameError, FrameSink, FrameSource,
    InputSource, Limits, Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "frametool")]
#[command(about = "Read, re-encode and split frame streams")]
#[command(version)]
struct Cli {
    /// Command to run
    #[arg(value_name = "COMMAND")]
    command: String,
    /// Input files, read in order as one stream (defaults to stdin)
    #[arg(value_name = "INPUTS")]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    options: RunOptions,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{operation}: {source}")]
    Command {
        operation: String,
        #[source]
        source: FrameError,
    },
    #[error("{operation}: {count} output write(s) failed")]
    WriteFailures { operation: String, count: u64 },
}

fn main() -> ExitCode {
    let commands = CommandRegistry::builtin();
    let matches = Cli::command()
        .after_help(commands_help(&commands))
        .get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    logging::init(cli.options.verbose, cli.options.quiet);

    match run(cli, &commands) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("frametool: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, commands: &CommandRegistry) -> std::result::Result<(), CliError> {
    let file = match &cli.options.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&cli.options, file);
    let encoders = EncoderRegistry::builtin();

    let command = commands
        .validate(&cli.command, &settings.run, &encoders)
        .map_err(|source| CliError::Command {
            operation: "configure".to_string(),
            source,
        })?;
    if !command.reads_input && !cli.inputs.is_empty() {
        warn!(inputs = cli.inputs.len(), "{} ignores input files", command.name);
    }

    let start = Instant::now();
    let mut source = InputSource::from_paths(cli.inputs).open(Limits::default());
    let mut sink = settings.output.clone().lazy(settings.run.on_write_failure);
    let progress_bar = settings.progress.then(|| {
        let counted = if command.reads_input { "frames read" } else { "writes" };
        create_spinner(&format!("{}: {}", command.name, counted))
    });

    let result = match &progress_bar {
        Some(bar) if command.reads_input => {
            let mut counted = ProgressSource {
                inner: source.as_mut(),
                bar,
            };
            (command.run)(&settings.run, &encoders, &mut counted, &mut sink)
        }
        Some(bar) => {
            let mut counted = ProgressSink {
                inner: &mut sink,
                bar,
            };
            (command.run)(&settings.run, &encoders, source.as_mut(), &mut counted)
        }
        None => (command.run)(&settings.run, &encoders, source.as_mut(), &mut sink),
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(source) => {
            if let Some(bar) = progress_bar {
                bar.abandon_with_message(format!("{} failed", command.name));
            }
            return Err(CliError::Command {
                operation: command.name.to_string(),
                source,
            });
        }
    };

    let elapsed = start.elapsed();
    let message = describe_summary(&summary, elapsed);
    match progress_bar {
        Some(bar) => bar.finish_with_message(message),
        None => info!("{}", message),
    }

    match summary.write_failures() {
        0 => Ok(()),
        count => Err(CliError::WriteFailures {
            operation: command.name.to_string(),
            count,
        }),
    }
}

fn commands_help(commands: &CommandRegistry) -> String {
    let mut help = String::from("Commands:\n");
    for command in commands.iter() {
        help.push_str(&format!("  {:<8}{}\n", command.name, command.help));
    }
    help
}

fn describe_summary(summary: &CommandSummary, elapsed: Duration) -> String {
    match summary {
        CommandSummary::Cat(cat) => format!(
            "Wrote {} frames in {} writes ({} bytes, elapsed: {:.2?})",
            cat.frames_read, cat.writes, cat.bytes_written, elapsed
        ),
        CommandSummary::Split(split) => format!(
            "Split {} frames into {} chunks ({} bytes, {} oversized, elapsed: {:.2?})",
            split.frames_read,
            split.chunks_written,
            split.bytes_written,
            split.oversized_chunks,
            elapsed
        ),
    }
}

/// Counts frames on the spinner as they are pulled
struct ProgressSource<'a, S: ?Sized> {
    inner: &'a mut S,
    bar: &'a ProgressBar,
}

impl<S: FrameSource + ?Sized> FrameSource for ProgressSource<'_, S> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.inner.next_frame()?;
        if frame.is_some() {
            self.bar.inc(1);
        }
        Ok(frame)
    }
}

/// Counts successful writes on the spinner, for commands without input
struct ProgressSink<'a, K: ?Sized> {
    inner: &'a mut K,
    bar: &'a ProgressBar,
}

impl<K: FrameSink + ?Sized> FrameSink for ProgressSink<'_, K> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write(bytes)?;
        self.bar.inc(1);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
