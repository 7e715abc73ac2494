//! The cat, split and gen pipelines

use crate::generate::{GenOptions, GeneratedSource};
use crate::sink::{ChunkSink, FrameSink};
use crate::source::FrameSource;
use frametool_codec::{
    build_burst, BurstEncoder, Frame, FrameEncoder, FrameError, ResolvedEncoder, Result,
};
use frametool_format::burst_encoded_len;
use tracing::{info, warn};

/// Default upper bound on an encoded split chunk, in bytes
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 1024;
/// Default file name prefix for split chunks
pub const DEFAULT_CHUNK_PREFIX: &str = "databurst";

/// What frame-by-frame output does when a sink write fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Stop at the first failed write and return its error
    #[default]
    Abort,
    /// Log the failure, count it, and keep reading
    Continue,
}

/// Counters reported by `cat` and `gen`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatSummary {
    /// Frames pulled from the source
    pub frames_read: u64,
    /// Successful sink writes
    pub writes: u64,
    /// Bytes handed to the sink successfully
    pub bytes_written: u64,
    /// Failed sink writes (only non-zero under `WriteFailurePolicy::Continue`)
    pub write_failures: u64,
}

/// Split settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Upper bound on an encoded chunk unless a single frame alone exceeds it
    pub max_chunk_size: u64,
    /// Ordinal of the first chunk
    pub first_ordinal: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            first_ordinal: 0,
        }
    }
}

/// Counters reported by `split`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    /// Frames pulled from the source
    pub frames_read: u64,
    /// Chunks written
    pub chunks_written: u64,
    /// Total encoded bytes across all chunks
    pub bytes_written: u64,
    /// Chunks holding a single frame larger than the bound
    pub oversized_chunks: u64,
}

/// Stream frames through with the resolved encoder
pub fn cat<S, K>(
    source: &mut S,
    encoder: ResolvedEncoder<'_>,
    sink: &mut K,
    policy: WriteFailurePolicy,
) -> Result<CatSummary>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    match encoder {
        ResolvedEncoder::Frame(encoder) => cat_frames(source, encoder, sink, policy),
        ResolvedEncoder::Burst(encoder) => cat_burst(source, encoder, sink),
    }
}

/// Encode and write each frame as soon as it is read
pub fn cat_frames<S, K>(
    source: &mut S,
    encoder: &dyn FrameEncoder,
    sink: &mut K,
    policy: WriteFailurePolicy,
) -> Result<CatSummary>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut summary = CatSummary::default();

    while let Some(frame) = source.next_frame()? {
        summary.frames_read += 1;
        let bytes = encoder.encode_frame(&frame)?;
        match sink.write(&bytes) {
            Ok(()) => {
                summary.writes += 1;
                summary.bytes_written += bytes.len() as u64;
            }
            Err(err) => record_write_failure(&mut summary, err, policy)?,
        }
    }

    // A failed final flush is not a frame write; it ends the run under either policy.
    sink.flush()?;

    info!(
        format = encoder.name(),
        frames = summary.frames_read,
        bytes = summary.bytes_written,
        write_failures = summary.write_failures,
        "cat finished"
    );
    Ok(summary)
}

fn record_write_failure(
    summary: &mut CatSummary,
    err: FrameError,
    policy: WriteFailurePolicy,
) -> Result<()> {
    match policy {
        WriteFailurePolicy::Abort => Err(err),
        WriteFailurePolicy::Continue => {
            summary.write_failures += 1;
            warn!(frame = summary.frames_read, "{err}; continuing");
            Ok(())
        }
    }
}

/// Read the whole source, pack it into one burst and write it once
///
/// Never returns for an unbounded source.
pub fn cat_burst<S, K>(
    source: &mut S,
    encoder: &dyn BurstEncoder,
    sink: &mut K,
) -> Result<CatSummary>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let mut frames = Vec::new();
    while let Some(frame) = source.next_frame()? {
        frames.push(frame);
    }

    let frames_read = frames.len() as u64;
    let bytes = encoder.encode_burst(&build_burst(frames))?;
    sink.write(&bytes)?;
    sink.flush()?;

    info!(
        format = encoder.name(),
        frames = frames_read,
        bytes = bytes.len(),
        "burst written"
    );
    Ok(CatSummary {
        frames_read,
        writes: 1,
        bytes_written: bytes.len() as u64,
        write_failures: 0,
    })
}

/// Re-partition the source into size-bounded bursts, first-fit in arrival order
///
/// A chunk is closed when adding the next frame would push its encoded size
/// over `max_chunk_size`. A frame that is larger than the bound on its own
/// is written alone. Empty input writes nothing.
pub fn split_frames<S, C>(
    source: &mut S,
    encoder: &dyn BurstEncoder,
    chunks: &mut C,
    opts: &SplitOptions,
) -> Result<SplitSummary>
where
    S: FrameSource + ?Sized,
    C: ChunkSink + ?Sized,
{
    if opts.max_chunk_size == 0 {
        return Err(FrameError::InvalidConfig(
            "max chunk size must be greater than zero".to_string(),
        ));
    }

    let mut summary = SplitSummary::default();
    let mut chunk = PendingChunk::default();
    let mut ordinal = opts.first_ordinal;

    while let Some(frame) = source.next_frame()? {
        summary.frames_read += 1;
        let frame_len = frame.encoded_len();
        if !chunk.is_empty() && chunk.size_with(frame_len) > opts.max_chunk_size {
            write_chunk(&mut chunk, encoder, chunks, ordinal, opts, &mut summary)?;
            ordinal += 1;
        }
        chunk.push(frame, frame_len);
    }

    if !chunk.is_empty() {
        write_chunk(&mut chunk, encoder, chunks, ordinal, opts, &mut summary)?;
    }

    info!(
        frames = summary.frames_read,
        chunks = summary.chunks_written,
        bytes = summary.bytes_written,
        "split finished"
    );
    Ok(summary)
}

#[derive(Default)]
struct PendingChunk {
    frames: Vec<Frame>,
    frames_len: usize,
}

impl PendingChunk {
    fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn size_with(&self, frame_len: usize) -> u64 {
        burst_encoded_len(self.frames.len() + 1, self.frames_len + frame_len) as u64
    }

    fn push(&mut self, frame: Frame, frame_len: usize) {
        self.frames.push(frame);
        self.frames_len += frame_len;
    }

    fn take(&mut self) -> Vec<Frame> {
        self.frames_len = 0;
        std::mem::take(&mut self.frames)
    }
}

fn write_chunk<C: ChunkSink + ?Sized>(
    chunk: &mut PendingChunk,
    encoder: &dyn BurstEncoder,
    chunks: &mut C,
    ordinal: u64,
    opts: &SplitOptions,
    summary: &mut SplitSummary,
) -> Result<()> {
    let frames = chunk.take();
    let frame_count = frames.len();
    let bytes = encoder.encode_burst(&build_burst(frames))?;

    if bytes.len() as u64 > opts.max_chunk_size {
        summary.oversized_chunks += 1;
        warn!(
            ordinal,
            size = bytes.len(),
            max = opts.max_chunk_size,
            "frame exceeds max chunk size; written alone"
        );
    }

    chunks.write_chunk(ordinal, &bytes)?;
    summary.chunks_written += 1;
    summary.bytes_written += bytes.len() as u64;
    tracing::debug!(ordinal, frames = frame_count, size = bytes.len(), "chunk closed");
    Ok(())
}

/// Generate synthetic frames and route them through the cat machinery
pub fn generate<K>(
    opts: &GenOptions,
    encoder: ResolvedEncoder<'_>,
    sink: &mut K,
    policy: WriteFailurePolicy,
) -> Result<CatSummary>
where
    K: FrameSink + ?Sized,
{
    let mut source = GeneratedSource::new(opts.clone());
    cat(&mut source, encoder, sink, policy)
}
