//! Frame sources: one logical, ordered frame sequence over one or more streams

use frametool_codec::{Frame, FrameError, Limits, RecordReader, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pull-based sequence of frames
///
/// `Ok(None)` is end-of-stream. An `Err` ends the sequence; sources return
/// `Ok(None)` on every call after reporting an error.
pub trait FrameSource {
    /// Next frame in order, or `None` once exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Iterate over the remaining frames
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames { source: self }
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// Iterator adapter returned by [`FrameSource::frames`]
pub struct Frames<'a, S: ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FrameSource + ?Sized> Iterator for Frames<'a, S> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_frame().transpose()
    }
}

/// Frames decoded from a single byte stream
///
/// Bursts in the stream are flattened into their frames.
pub struct StreamSource<R: Read> {
    reader: RecordReader<R>,
    pending: std::vec::IntoIter<Frame>,
    frames_read: u64,
    finished: bool,
}

impl<R: Read> StreamSource<R> {
    /// Read frames from `reader` with default limits
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    /// Read frames from `reader` with explicit limits
    pub fn with_limits(reader: R, limits: Limits) -> Self {
        Self {
            reader: RecordReader::with_limits(reader, limits),
            pending: Vec::new().into_iter(),
            frames_read: 0,
            finished: false,
        }
    }

    /// Frames returned so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Bytes consumed from the underlying stream so far
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }
}

impl StreamSource<io::StdinLock<'static>> {
    /// Read frames from standard input
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: Read> FrameSource for StreamSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.pending.next() {
                self.frames_read += 1;
                return Ok(Some(frame));
            }
            if self.finished {
                return Ok(None);
            }

            match self.reader.next_record() {
                // Empty bursts contribute nothing; keep reading.
                Ok(Some(record)) => self.pending = record.into_frames().into_iter(),
                Ok(None) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(err) => {
                    self.finished = true;
                    return Err(err);
                }
            }
        }
    }
}

/// Frames from an ordered list of files, read as if concatenated
///
/// Files are opened lazily, one at a time, and closed as soon as they are
/// exhausted. A file that cannot be opened ends the whole source with
/// [`FrameError::SourceOpen`].
pub struct FileSource {
    paths: Vec<PathBuf>,
    limits: Limits,
    next_index: usize,
    current: Option<OpenFile>,
    frames_read: u64,
    finished: bool,
}

struct OpenFile {
    index: usize,
    stream: StreamSource<BufReader<File>>,
}

impl FileSource {
    /// Read the given files in order with default limits
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::with_limits(paths, Limits::default())
    }

    /// Read the given files in order with explicit limits
    pub fn with_limits<I, P>(paths: I, limits: Limits) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            limits,
            next_index: 0,
            current: None,
            frames_read: 0,
            finished: false,
        }
    }

    /// Input files in read order
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Path of the file currently being read, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current
            .as_ref()
            .map(|open| self.paths[open.index].as_path())
    }

    /// Frames returned so far across all files
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn open_next(&mut self) -> Result<bool> {
        let index = self.next_index;
        let Some(path) = self.paths.get(index) else {
            return Ok(false);
        };
        self.next_index += 1;

        let file = File::open(path).map_err(|source| FrameError::SourceOpen {
            index,
            path: path.clone(),
            source,
        })?;
        debug!(index, path = %path.display(), "opened input file");

        self.current = Some(OpenFile {
            index,
            stream: StreamSource::with_limits(BufReader::new(file), self.limits.clone()),
        });
        Ok(true)
    }
}

impl FrameSource for FileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            let Some(open) = self.current.as_mut() else {
                match self.open_next() {
                    Ok(true) => continue,
                    Ok(false) => {
                        self.finished = true;
                        return Ok(None);
                    }
                    Err(err) => {
                        self.finished = true;
                        return Err(err);
                    }
                }
            };

            match open.stream.next_frame() {
                Ok(Some(frame)) => {
                    self.frames_read += 1;
                    return Ok(Some(frame));
                }
                Ok(None) => {
                    debug!(
                        index = open.index,
                        frames = open.stream.frames_read(),
                        "input file exhausted"
                    );
                    // Dropping the stream closes the file before the next one opens.
                    self.current = None;
                }
                Err(err) => {
                    debug!(index = open.index, error = %err, "input file failed");
                    self.current = None;
                    self.finished = true;
                    return Err(err);
                }
            }
        }
    }
}

/// Frames held in memory
#[derive(Debug, Default, Clone)]
pub struct VecSource {
    frames: VecDeque<Frame>,
}

impl VecSource {
    /// Serve `frames` in order
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl From<Vec<Frame>> for VecSource {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl FrameSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}
