//! Burst aggregate and its canonical binary encoding

use crate::checksum::{compute_crc32c, verify_crc32c};
use crate::constants::{BURST_MAGIC, CRC_LEN, MAGIC_LEN};
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::limits::Limits;
use crate::varint::{decode_uleb128, encode_uleb128, uleb128_len};
use serde::Serialize;
use std::convert::TryFrom;

/// Ordered aggregate of frames
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Burst {
    frames: Vec<Frame>,
}

/// Build a burst from frames in the order given
pub fn build_burst(frames: Vec<Frame>) -> Burst {
    Burst { frames }
}

/// Exact encoded size of a burst holding `frame_count` frames whose raw
/// encodings total `frames_len` bytes
pub fn burst_encoded_len(frame_count: usize, frames_len: usize) -> usize {
    MAGIC_LEN + uleb128_len(frame_count as u64) + frames_len + CRC_LEN
}

/// Validate a decoded frame count against the configured limit
pub fn check_frame_count(count: u64, limits: &Limits) -> Result<usize> {
    let count = usize::try_from(count)
        .map_err(|_| FrameError::LimitExceeded("frame count exceeds platform limits".into()))?;
    if count > limits.max_burst_frames {
        return Err(FrameError::LimitExceeded(format!(
            "burst holds {} frames (max {})",
            count, limits.max_burst_frames
        )));
    }
    Ok(count)
}

impl Burst {
    /// Frames in burst order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Take ownership of the frames
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when the burst holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Exact length of `encode()` output
    pub fn encoded_len(&self) -> usize {
        let frames_len = self.frames.iter().map(Frame::encoded_len).sum();
        burst_encoded_len(self.frames.len(), frames_len)
    }

    /// Encode burst to its canonical binary form
    pub fn encode(&self) -> Result<Vec<u8>> {
        let max_frames = Limits::default().max_burst_frames;
        if self.frames.len() > max_frames {
            return Err(FrameError::Encode(format!(
                "burst holds {} frames (max {})",
                self.frames.len(),
                max_frames
            )));
        }
        for frame in &self.frames {
            frame.check_encodable()?;
        }

        let mut result = Vec::with_capacity(self.encoded_len());
        result.extend_from_slice(&BURST_MAGIC);
        result.extend_from_slice(&encode_uleb128(self.frames.len() as u64));
        for frame in &self.frames {
            frame.encode_into(&mut result);
        }
        let crc = compute_crc32c(&result);
        result.extend_from_slice(&crc.to_le_bytes());
        Ok(result)
    }

    /// Decode a burst from the start of `bytes`, returning it and the bytes consumed
    pub fn decode(bytes: &[u8], limits: &Limits) -> Result<(Self, usize)> {
        if bytes.len() < MAGIC_LEN {
            return Err(FrameError::UnexpectedEof);
        }
        let magic: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != BURST_MAGIC {
            return Err(FrameError::InvalidMagic(magic));
        }
        let mut pos = MAGIC_LEN;

        let (count, count_bytes) = decode_uleb128(&bytes[pos..])?;
        let count = check_frame_count(count, limits)?;
        pos += count_bytes;

        let mut frames = Vec::with_capacity(count.min(4_096));
        for _ in 0..count {
            let (frame, consumed) = Frame::decode(&bytes[pos..], limits)?;
            frames.push(frame);
            pos += consumed;
        }

        if pos + CRC_LEN > bytes.len() {
            return Err(FrameError::UnexpectedEof);
        }
        let stored_crc = u32::from_le_bytes([
            bytes[pos],
            bytes[pos + 1],
            bytes[pos + 2],
            bytes[pos + 3],
        ]);
        verify_crc32c(&bytes[..pos], stored_crc)?;

        Ok((Self { frames }, pos + CRC_LEN))
    }
}

impl From<Vec<Frame>> for Burst {
    fn from(frames: Vec<Frame>) -> Self {
        build_burst(frames)
    }
}
