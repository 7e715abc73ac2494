//! Command registry: name → pipeline

use crate::generate::GenOptions;
use crate::pipeline::{
    cat, generate, split_frames, CatSummary, SplitOptions, SplitSummary, WriteFailurePolicy,
    DEFAULT_CHUNK_PREFIX,
};
use crate::sink::{ChunkFiles, FrameSink};
use crate::source::FrameSource;
use frametool_codec::{EncoderRegistry, FrameError, OutputFormat, Packing, Result};
use std::collections::BTreeMap;

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Output format name
    pub format: String,
    /// Frame-by-frame or whole-stream burst output
    pub packing: Packing,
    /// Behaviour on sink write failure in frame mode
    pub on_write_failure: WriteFailurePolicy,
    /// Split bound and first ordinal
    pub split: SplitOptions,
    /// File name prefix for split chunks
    pub chunk_prefix: String,
    /// Generator settings
    pub gen: GenOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Raw.to_string(),
            packing: Packing::Frame,
            on_write_failure: WriteFailurePolicy::Abort,
            split: SplitOptions::default(),
            chunk_prefix: DEFAULT_CHUNK_PREFIX.to_string(),
            gen: GenOptions::default(),
        }
    }
}

/// Result of a command run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSummary {
    /// `cat` or `gen`
    Cat(CatSummary),
    /// `split`
    Split(SplitSummary),
}

impl CommandSummary {
    /// Sink writes that failed without aborting the run
    pub fn write_failures(&self) -> u64 {
        match self {
            CommandSummary::Cat(summary) => summary.write_failures,
            CommandSummary::Split(_) => 0,
        }
    }
}

/// Signature shared by every command
pub type CommandFn = fn(
    &RunConfig,
    &EncoderRegistry,
    &mut dyn FrameSource,
    &mut dyn FrameSink,
) -> Result<CommandSummary>;

/// Signature of the up-front configuration check for a command
pub type ValidateFn = fn(&RunConfig, &EncoderRegistry) -> Result<()>;

/// One registered command
#[derive(Clone, Copy)]
pub struct Command {
    /// Name used on the command line
    pub name: &'static str,
    /// One-line description
    pub help: &'static str,
    /// False when the command ignores its frame source
    pub reads_input: bool,
    /// Checks run before any I/O
    pub validate: ValidateFn,
    /// Pipeline entry point
    pub run: CommandFn,
}

/// Mapping from command name to pipeline
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Command>,
}

impl CommandRegistry {
    /// Registry with no commands
    pub fn empty() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Registry holding `cat`, `gen` and `split`
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Command {
            name: "cat",
            reads_input: true,
            help: "Write frames to the output.",
            validate: validate_output,
            run: run_cat,
        });
        registry.register(Command {
            name: "gen",
            reads_input: false,
            help: "Generate random frames for testing.",
            validate: validate_output,
            run: run_gen,
        });
        registry.register(Command {
            name: "split",
            reads_input: true,
            help: "Split a burst into multiple smaller bursts.",
            validate: validate_split,
            run: run_split,
        });
        registry
    }

    /// Add or replace a command
    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name, command);
    }

    /// Look up a command by name
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Registered commands in name order
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Validate the configuration for `name` without running anything
    pub fn validate(
        &self,
        name: &str,
        config: &RunConfig,
        encoders: &EncoderRegistry,
    ) -> Result<&Command> {
        let command = self.get(name).ok_or_else(|| {
            FrameError::InvalidConfig(format!(
                "unknown command '{}' (expected one of: {})",
                name,
                self.commands.keys().copied().collect::<Vec<_>>().join(", ")
            ))
        })?;
        (command.validate)(config, encoders)?;
        Ok(command)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_output(config: &RunConfig, encoders: &EncoderRegistry) -> Result<()> {
    encoders.resolve(&config.format, config.packing).map(|_| ())
}

fn validate_split(config: &RunConfig, encoders: &EncoderRegistry) -> Result<()> {
    encoders.burst_encoder(&config.format)?;
    if config.split.max_chunk_size == 0 {
        return Err(FrameError::InvalidConfig(
            "max chunk size must be greater than zero".to_string(),
        ));
    }
    if config.chunk_prefix.is_empty() {
        return Err(FrameError::InvalidConfig(
            "chunk prefix must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn run_cat(
    config: &RunConfig,
    encoders: &EncoderRegistry,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
) -> Result<CommandSummary> {
    let encoder = encoders.resolve(&config.format, config.packing)?;
    cat(source, encoder, sink, config.on_write_failure).map(CommandSummary::Cat)
}

fn run_gen(
    config: &RunConfig,
    encoders: &EncoderRegistry,
    _source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
) -> Result<CommandSummary> {
    let encoder = encoders.resolve(&config.format, config.packing)?;
    generate(&config.gen, encoder, sink, config.on_write_failure).map(CommandSummary::Cat)
}

fn run_split(
    config: &RunConfig,
    encoders: &EncoderRegistry,
    source: &mut dyn FrameSource,
    _sink: &mut dyn FrameSink,
) -> Result<CommandSummary> {
    let encoder = encoders.burst_encoder(&config.format)?;
    let mut chunks = ChunkFiles::new(config.chunk_prefix.clone());
    split_frames(source, encoder, &mut chunks, &config.split).map(CommandSummary::Split)
}
