//! Output sinks for encoded frames, bursts and split chunks

use frametool_codec::{FrameError, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for encoded buffers, written in call order
pub trait FrameSink {
    /// Write one encoded buffer
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Push buffered output to the destination
    fn flush(&mut self) -> Result<()>;
}

impl<K: FrameSink + ?Sized> FrameSink for &mut K {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Staging capacity of a buffered [`StreamSink`]
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Sink over any `Write`
///
/// Buffers are staged in the sink and handed to the writer on delivery. A
/// failed delivery drops whatever was staged, so bytes reported as failed
/// never reach the destination on a later write or flush.
pub struct StreamSink<W: Write> {
    writer: W,
    pending: Vec<u8>,
    capacity: usize,
    writes: u64,
    bytes_written: u64,
}

impl<W: Write> StreamSink<W> {
    /// Sink that delivers every write before returning
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, 0)
    }

    /// Sink that stages writes up to [`DEFAULT_BUFFER_CAPACITY`]
    ///
    /// A failed delivery drops every buffer staged since the last one.
    pub fn buffered(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_BUFFER_CAPACITY)
    }

    /// Sink that delivers once `capacity` bytes are staged
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        Self {
            writer,
            pending: Vec::with_capacity(capacity),
            capacity,
            writes: 0,
            bytes_written: 0,
        }
    }

    /// Accepted writes so far
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Bytes accepted so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// The underlying writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    fn deliver(&mut self) -> Result<()> {
        let result = self
            .writer
            .write_all(&self.pending)
            .and_then(|()| self.writer.flush());
        self.pending.clear();
        result.map_err(FrameError::SinkWrite)
    }
}

impl StreamSink<File> {
    /// Sink writing straight to the standard output descriptor
    ///
    /// The process-wide stdout buffer is bypassed so a failed write cannot
    /// be replayed by it later.
    pub fn stdout() -> Result<Self> {
        let file = stdout_file().map_err(|source| FrameError::SinkOpen {
            path: PathBuf::from("<stdout>"),
            source,
        })?;
        Ok(Self::new(file))
    }

    /// Buffered sink writing to a newly created (or truncated) file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::buffered(create_file(path.as_ref())?))
    }

    /// Like [`StreamSink::create`], delivering every write before returning
    pub fn create_unbuffered(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(create_file(path.as_ref())?))
    }
}

fn create_file(path: &Path) -> Result<File> {
    let file = File::create(path).map_err(|source| FrameError::SinkOpen {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "opened output file");
    Ok(file)
}

#[cfg(unix)]
fn stdout_file() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdout().as_fd().try_clone_to_owned()?))
}

#[cfg(windows)]
fn stdout_file() -> io::Result<File> {
    use std::os::windows::io::AsHandle;
    Ok(File::from(io::stdout().as_handle().try_clone_to_owned()?))
}

impl<W: Write> FrameSink for StreamSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        if self.pending.len() >= self.capacity {
            self.deliver()?;
        }
        self.writes += 1;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.deliver()
    }
}

impl<W: Write> Drop for StreamSink<W> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let _ = self.deliver();
        }
    }
}

/// Sink that keeps every buffer in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    buffers: Vec<Vec<u8>>,
    flushes: usize,
}

impl MemorySink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers in write order
    pub fn buffers(&self) -> &[Vec<u8>] {
        &self.buffers
    }

    /// All buffers joined together
    pub fn concat(&self) -> Vec<u8> {
        self.buffers.concat()
    }

    /// Number of flush calls seen
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl FrameSink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffers.push(bytes.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Destination for split chunks, one buffer per ordinal
pub trait ChunkSink {
    /// Persist the encoded chunk with the given ordinal
    fn write_chunk(&mut self, ordinal: u64, bytes: &[u8]) -> Result<()>;
}

impl<C: ChunkSink + ?Sized> ChunkSink for &mut C {
    fn write_chunk(&mut self, ordinal: u64, bytes: &[u8]) -> Result<()> {
        (**self).write_chunk(ordinal, bytes)
    }
}

/// Writes each chunk to `<prefix>-<ordinal>`
#[derive(Debug, Clone)]
pub struct ChunkFiles {
    prefix: String,
    written: Vec<PathBuf>,
}

impl ChunkFiles {
    /// Chunk files named from `prefix`; the prefix may include a directory
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    /// File name for a given ordinal
    pub fn chunk_path(&self, ordinal: u64) -> PathBuf {
        PathBuf::from(format!("{}-{}", self.prefix, ordinal))
    }

    /// Files written so far, in ordinal order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ChunkSink for ChunkFiles {
    fn write_chunk(&mut self, ordinal: u64, bytes: &[u8]) -> Result<()> {
        let path = self.chunk_path(ordinal);
        {
            let mut file = File::create(&path).map_err(|source| FrameError::SinkOpen {
                path: path.clone(),
                source,
            })?;
            file.write_all(bytes).map_err(FrameError::SinkWrite)?;
            file.flush().map_err(FrameError::SinkWrite)?;
        }
        debug!(ordinal, path = %path.display(), bytes = bytes.len(), "wrote chunk");
        self.written.push(path);
        Ok(())
    }
}

/// Chunks kept in memory as `(ordinal, bytes)` pairs
#[derive(Debug, Default, Clone)]
pub struct MemoryChunks {
    chunks: Vec<(u64, Vec<u8>)>,
}

impl MemoryChunks {
    /// Empty chunk store
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks in write order
    pub fn chunks(&self) -> &[(u64, Vec<u8>)] {
        &self.chunks
    }
}

impl ChunkSink for MemoryChunks {
    fn write_chunk(&mut self, ordinal: u64, bytes: &[u8]) -> Result<()> {
        self.chunks.push((ordinal, bytes.to_vec()));
        Ok(())
    }
}
