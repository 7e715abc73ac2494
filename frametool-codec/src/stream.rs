//! Incremental decoding of frame and burst records from a byte stream

use frametool_format::burst::check_frame_count;
use frametool_format::checksum::{append_crc32c, check_crc32c, compute_crc32c};
use frametool_format::constants::{BURST_MAGIC, CRC_LEN, FRAME_MAGIC, MAGIC_LEN};
use frametool_format::frame::check_body_len;
use frametool_format::varint::{decode_uleb128, MAX_ULEB128_LEN};
use frametool_format::{build_burst, Burst, Frame, FrameError, Limits, Result};
use std::io::{ErrorKind, Read};

/// One top-level record read from a stream
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A standalone frame
    Frame(Frame),
    /// A burst of frames
    Burst(Burst),
}

impl Record {
    /// Frames carried by this record, in order
    pub fn into_frames(self) -> Vec<Frame> {
        match self {
            Record::Frame(frame) => vec![frame],
            Record::Burst(burst) => burst.into_frames(),
        }
    }
}

/// Reads records one at a time from any `Read`
///
/// A clean end of input at a record boundary yields `Ok(None)`. Input that
/// stops partway through a record yields `FrameError::UnexpectedEof`.
pub struct RecordReader<R: Read> {
    reader: R,
    limits: Limits,
    records_read: u64,
    bytes_read: u64,
}

impl<R: Read> RecordReader<R> {
    /// Create a reader with default limits
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, Limits::default())
    }

    /// Create a reader with explicit limits
    pub fn with_limits(reader: R, limits: Limits) -> Self {
        Self {
            reader,
            limits,
            records_read: 0,
            bytes_read: 0,
        }
    }

    /// Records decoded so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consume the reader and return the underlying stream
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the next record, or `None` at end of stream
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let magic = match self.read_magic()? {
            Some(magic) => magic,
            None => return Ok(None),
        };

        let record = match magic {
            FRAME_MAGIC => {
                let (frame, _) = self.read_frame_after_magic()?;
                Record::Frame(frame)
            }
            BURST_MAGIC => Record::Burst(self.read_burst_after_magic()?),
            other => return Err(FrameError::InvalidMagic(other)),
        };

        self.records_read += 1;
        Ok(Some(record))
    }

    fn read_burst_after_magic(&mut self) -> Result<Burst> {
        let mut header = BURST_MAGIC.to_vec();
        let count = self.read_varint_into(&mut header)?;
        let count = check_frame_count(count, &self.limits)?;
        let mut crc = compute_crc32c(&header);

        let mut frames = Vec::with_capacity(count.min(4_096));
        for _ in 0..count {
            let magic = self.read_magic()?.ok_or(FrameError::UnexpectedEof)?;
            if magic != FRAME_MAGIC {
                return Err(FrameError::InvalidMagic(magic));
            }
            let (frame, raw) = self.read_frame_after_magic()?;
            crc = append_crc32c(crc, &raw);
            frames.push(frame);
        }

        let stored = self.read_crc()?;
        check_crc32c(crc, stored)?;
        Ok(build_burst(frames))
    }

    /// Returns the frame and its full raw encoding (magic through CRC)
    fn read_frame_after_magic(&mut self) -> Result<(Frame, Vec<u8>)> {
        let mut raw = FRAME_MAGIC.to_vec();
        let body_len = self.read_varint_into(&mut raw)?;
        let body_len = check_body_len(body_len, &self.limits)?;

        let body_start = raw.len();
        raw.resize(body_start + body_len, 0);
        self.read_exact(&mut raw[body_start..])?;

        let stored = self.read_crc()?;
        check_crc32c(compute_crc32c(&raw), stored)?;

        let frame = Frame::decode_body(&raw[body_start..], &self.limits)?;
        raw.extend_from_slice(&stored.to_le_bytes());
        Ok((frame, raw))
    }

    fn read_crc(&mut self) -> Result<u32> {
        let mut crc = [0u8; CRC_LEN];
        self.read_exact(&mut crc)?;
        Ok(u32::from_le_bytes(crc))
    }

    fn read_magic(&mut self) -> Result<Option<[u8; 4]>> {
        let mut magic = [0u8; MAGIC_LEN];
        let mut filled = 0;
        while filled < MAGIC_LEN {
            match self.reader.read(&mut magic[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(FrameError::UnexpectedEof),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        self.bytes_read += MAGIC_LEN as u64;
        Ok(Some(magic))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                FrameError::UnexpectedEof
            } else {
                FrameError::Io(err)
            }
        })?;
        self.bytes_read += buf.len() as u64;
        Ok(())
    }

    fn read_varint_into(&mut self, dest: &mut Vec<u8>) -> Result<u64> {
        let start = dest.len();
        loop {
            if dest.len() - start >= MAX_ULEB128_LEN {
                return Err(FrameError::LimitExceeded("ULEB128 too long".to_string()));
            }
            let mut buf = [0u8; 1];
            self.read_exact(&mut buf)?;
            dest.push(buf[0]);
            if buf[0] & 0x80 == 0 {
                break;
            }
        }
        let (value, _) = decode_uleb128(&dest[start..])?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frametool_format::Payload;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn frame(seq: u64) -> Frame {
        let mut source = BTreeMap::new();
        source.insert("seq".to_string(), seq.to_string());
        Frame::new(source, seq as i64, Payload::Number(seq))
    }

    #[test]
    fn empty_stream_is_end_of_stream() {
        let mut reader = RecordReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 0);
    }

    #[test]
    fn reads_mixed_frames_and_bursts_in_order() {
        let mut bytes = frame(0).encode().unwrap();
        bytes.extend(build_burst(vec![frame(1), frame(2)]).encode().unwrap());
        bytes.extend(frame(3).encode().unwrap());
        let total = bytes.len() as u64;

        let mut reader = RecordReader::new(Cursor::new(bytes));
        let mut frames = Vec::new();
        while let Some(record) = reader.next_record().unwrap() {
            frames.extend(record.into_frames());
        }
        assert_eq!(frames, vec![frame(0), frame(1), frame(2), frame(3)]);
        assert_eq!(reader.records_read(), 3);
        assert_eq!(reader.bytes_read(), total);
    }

    #[test]
    fn partial_record_is_a_decode_error() {
        let bytes = frame(9).encode().unwrap();
        for cut in [2, 5, bytes.len() - 1] {
            let mut reader = RecordReader::new(Cursor::new(bytes[..cut].to_vec()));
            let err = reader.next_record().unwrap_err();
            assert!(matches!(err, FrameError::UnexpectedEof), "cut {cut}: {err:?}");
            assert!(err.is_decode_error());
        }
    }

    #[test]
    fn garbage_magic_is_rejected() {
        let mut reader = RecordReader::new(Cursor::new(b"nope-not-a-frame".to_vec()));
        assert!(matches!(
            reader.next_record(),
            Err(FrameError::InvalidMagic(magic)) if &magic == b"nope"
        ));
    }

    #[test]
    fn corrupted_burst_fails_checksum() {
        let mut bytes = build_burst(vec![frame(1), frame(2)]).encode().unwrap();
        let len = bytes.len();
        bytes[len - 2] ^= 0x10;
        let mut reader = RecordReader::new(Cursor::new(bytes));
        assert!(matches!(
            reader.next_record(),
            Err(FrameError::ChecksumMismatch)
        ));
    }

    #[test]
    fn oversized_length_prefix_hits_limit() {
        let mut bytes = FRAME_MAGIC.to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F]);
        let limits = Limits {
            max_frame_bytes: 1024,
            ..Limits::default()
        };
        let mut reader = RecordReader::with_limits(Cursor::new(bytes), limits);
        assert!(matches!(
            reader.next_record(),
            Err(FrameError::LimitExceeded(_))
        ));
    }
}
