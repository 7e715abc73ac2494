//! frametool I/O - Sources, sinks and command pipelines
//!
//! This crate provides the orchestration layer for frame streams:
//!
//! - Frame sources over stdin, file lists and the synthetic generator
//! - Output sinks and split chunk files
//! - The `cat`, `split` and `gen` pipelines
//! - The command registry used by the CLI

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod generate;
pub mod pipeline;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use commands::{Command, CommandRegistry, CommandSummary, RunConfig};
pub use frametool_codec::{
    build_burst, Burst, EncoderRegistry, Frame, FrameError, Limits, OutputFormat, Packing,
    Payload, Result,
};
pub use generate::{GenOptions, GeneratedSource};
pub use pipeline::{
    cat, cat_burst, cat_frames, generate, split_frames, CatSummary, SplitOptions, SplitSummary,
    WriteFailurePolicy,
};
pub use sink::{ChunkFiles, ChunkSink, FrameSink, MemoryChunks, MemorySink, StreamSink};
pub use source::{FileSource, FrameSource, StreamSource, VecSource};

use std::path::PathBuf;

/// Where input frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input
    Stdin,
    /// Files read in order as one stream
    Files(Vec<PathBuf>),
}

impl InputSource {
    /// Standard input when `paths` is empty, otherwise the listed files
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        if paths.is_empty() {
            InputSource::Stdin
        } else {
            InputSource::Files(paths)
        }
    }

    /// Build the frame source; files are not opened until the first read
    pub fn open(self, limits: Limits) -> Box<dyn FrameSource> {
        match self {
            InputSource::Stdin => Box::new(StreamSource::with_limits(
                std::io::stdin().lock(),
                limits,
            )),
            InputSource::Files(paths) => Box::new(FileSource::with_limits(paths, limits)),
        }
    }
}

/// Where primary output goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSink {
    /// Standard output
    #[default]
    Stdout,
    /// A file, created or truncated
    Path(PathBuf),
}

impl OutputSink {
    /// Open the destination now
    ///
    /// Files are buffered under [`WriteFailurePolicy::Abort`]. Under
    /// [`WriteFailurePolicy::Continue`] every write is delivered on its own so
    /// one failure never takes earlier buffers with it.
    pub fn open(&self, policy: WriteFailurePolicy) -> Result<Box<dyn FrameSink>> {
        match (self, policy) {
            (OutputSink::Stdout, _) => Ok(Box::new(StreamSink::stdout()?)),
            (OutputSink::Path(path), WriteFailurePolicy::Abort) => {
                Ok(Box::new(StreamSink::create(path)?))
            }
            (OutputSink::Path(path), WriteFailurePolicy::Continue) => {
                Ok(Box::new(StreamSink::create_unbuffered(path)?))
            }
        }
    }

    /// Defer opening until the first write or flush
    pub fn lazy(self, policy: WriteFailurePolicy) -> LazySink {
        LazySink {
            target: self,
            policy,
            inner: None,
        }
    }
}

/// Sink that opens its destination on first use
///
/// Commands that never touch the primary output (such as `split`) leave no
/// empty output file behind.
pub struct LazySink {
    target: OutputSink,
    policy: WriteFailurePolicy,
    inner: Option<Box<dyn FrameSink>>,
}

impl LazySink {
    /// True once the destination has been opened
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn sink(&mut self) -> Result<&mut Box<dyn FrameSink>> {
        let sink = match self.inner.take() {
            Some(sink) => sink,
            None => self.target.open(self.policy)?,
        };
        Ok(self.inner.insert(sink))
    }
}

impl FrameSink for LazySink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink()?.write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.sink()?.flush()
    }
}
