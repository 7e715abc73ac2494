//! Frame structure and canonical binary encoding

use crate::checksum::{compute_crc32c, verify_crc32c};
use crate::constants::{
    CRC_LEN, FRAME_MAGIC, MAGIC_LEN, PAYLOAD_BINARY, PAYLOAD_EMPTY, PAYLOAD_NUMBER, PAYLOAD_REAL,
    PAYLOAD_TEXT,
};
use crate::error::{FrameError, Result};
use crate::limits::Limits;
use crate::varint::{decode_uleb128, encode_uleb128, uleb128_len, zigzag_decode, zigzag_encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;

/// A single self-contained record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Tags identifying where the frame came from
    pub source: BTreeMap<String, String>,
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    /// Frame value
    pub payload: Payload,
}

/// Frame value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// No value
    #[default]
    Empty,
    /// Unsigned integer
    Number(u64),
    /// 64-bit float
    Real(f64),
    /// UTF-8 text
    Text(String),
    /// Opaque bytes
    Binary(Vec<u8>),
}

impl Payload {
    /// Wire tag for this payload kind
    pub fn tag(&self) -> u8 {
        match self {
            Payload::Empty => PAYLOAD_EMPTY,
            Payload::Number(_) => PAYLOAD_NUMBER,
            Payload::Real(_) => PAYLOAD_REAL,
            Payload::Text(_) => PAYLOAD_TEXT,
            Payload::Binary(_) => PAYLOAD_BINARY,
        }
    }

    fn data_len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Number(value) => uleb128_len(*value),
            Payload::Real(_) => 8,
            Payload::Text(text) => prefixed_len(text.len()),
            Payload::Binary(bytes) => prefixed_len(bytes.len()),
        }
    }
}

impl Frame {
    /// Create a frame from its parts
    pub fn new(source: BTreeMap<String, String>, timestamp: i64, payload: Payload) -> Self {
        Self {
            source,
            timestamp,
            payload,
        }
    }

    /// Length of the encoded body (between the length prefix and the CRC)
    pub fn body_len(&self) -> usize {
        let tags: usize = self
            .source
            .iter()
            .map(|(key, value)| prefixed_len(key.len()) + prefixed_len(value.len()))
            .sum();

        uleb128_len(zigzag_encode(self.timestamp))
            + uleb128_len(self.source.len() as u64)
            + tags
            + 1
            + self.payload.data_len()
    }

    /// Exact length of `encode()` output, computed without encoding
    pub fn encoded_len(&self) -> usize {
        let body_len = self.body_len();
        MAGIC_LEN + uleb128_len(body_len as u64) + body_len + CRC_LEN
    }

    /// Reject frames that a decoder with default limits would refuse
    pub fn check_encodable(&self) -> Result<()> {
        let limits = Limits::default();
        if self.source.len() > limits.max_source_tags {
            return Err(FrameError::Encode(format!(
                "frame carries {} source tags (max {})",
                self.source.len(),
                limits.max_source_tags
            )));
        }
        let body_len = self.body_len();
        if body_len > limits.max_frame_bytes {
            return Err(FrameError::Encode(format!(
                "frame body of {} bytes (max {})",
                body_len, limits.max_frame_bytes
            )));
        }
        Ok(())
    }

    /// Encode frame to its canonical binary form
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.check_encodable()?;
        let mut result = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut result);
        Ok(result)
    }

    /// Append the canonical binary form to `out` without limit checks
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.extend_from_slice(&FRAME_MAGIC);
        out.extend_from_slice(&encode_uleb128(self.body_len() as u64));
        self.write_body(out);
        let crc = compute_crc32c(&out[start..]);
        out.extend_from_slice(&crc.to_le_bytes());
    }

    fn write_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&encode_uleb128(zigzag_encode(self.timestamp)));
        out.extend_from_slice(&encode_uleb128(self.source.len() as u64));
        for (key, value) in &self.source {
            write_prefixed(out, key.as_bytes());
            write_prefixed(out, value.as_bytes());
        }

        out.push(self.payload.tag());
        match &self.payload {
            Payload::Empty => {}
            Payload::Number(value) => out.extend_from_slice(&encode_uleb128(*value)),
            Payload::Real(value) => out.extend_from_slice(&value.to_le_bytes()),
            Payload::Text(text) => write_prefixed(out, text.as_bytes()),
            Payload::Binary(bytes) => write_prefixed(out, bytes),
        }
    }

    /// Decode a frame from the start of `bytes`, returning it and the bytes consumed
    pub fn decode(bytes: &[u8], limits: &Limits) -> Result<(Self, usize)> {
        if bytes.len() < MAGIC_LEN {
            return Err(FrameError::UnexpectedEof);
        }
        let magic: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != FRAME_MAGIC {
            return Err(FrameError::InvalidMagic(magic));
        }
        let mut pos = MAGIC_LEN;

        let (body_len, len_bytes) = decode_uleb128(&bytes[pos..])?;
        let body_len = check_body_len(body_len, limits)?;
        pos += len_bytes;

        let body_end = pos + body_len;
        let frame_end = body_end + CRC_LEN;
        if frame_end > bytes.len() {
            return Err(FrameError::UnexpectedEof);
        }

        let stored_crc = u32::from_le_bytes([
            bytes[body_end],
            bytes[body_end + 1],
            bytes[body_end + 2],
            bytes[body_end + 3],
        ]);
        verify_crc32c(&bytes[..body_end], stored_crc)?;

        let frame = Self::decode_body(&bytes[pos..body_end], limits)?;
        Ok((frame, frame_end))
    }

    /// Decode a frame body whose CRC has already been checked
    pub fn decode_body(body: &[u8], limits: &Limits) -> Result<Self> {
        let mut cursor = BodyCursor::new(body);

        let timestamp = zigzag_decode(cursor.read_uleb128()?);

        let tag_count = cursor.read_len()?;
        if tag_count > limits.max_source_tags {
            return Err(FrameError::LimitExceeded(format!(
                "frame carries {} source tags (max {})",
                tag_count, limits.max_source_tags
            )));
        }
        let mut source = BTreeMap::new();
        for _ in 0..tag_count {
            let key = cursor.read_string()?;
            let value = cursor.read_string()?;
            if source.insert(key, value).is_some() {
                return Err(FrameError::CorruptFrame("duplicate source tag".to_string()));
            }
        }

        let payload = match cursor.read_u8()? {
            PAYLOAD_EMPTY => Payload::Empty,
            PAYLOAD_NUMBER => Payload::Number(cursor.read_uleb128()?),
            PAYLOAD_REAL => {
                let raw = cursor.read_bytes(8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                Payload::Real(f64::from_le_bytes(buf))
            }
            PAYLOAD_TEXT => Payload::Text(cursor.read_string()?),
            PAYLOAD_BINARY => {
                let len = cursor.read_len()?;
                Payload::Binary(cursor.read_bytes(len)?.to_vec())
            }
            other => return Err(FrameError::UnsupportedPayloadTag(other)),
        };

        if !cursor.is_empty() {
            return Err(FrameError::CorruptFrame(format!(
                "{} trailing bytes after payload",
                cursor.remaining()
            )));
        }

        Ok(Self {
            source,
            timestamp,
            payload,
        })
    }
}

/// Validate a decoded body length against the configured limit
pub fn check_body_len(body_len: u64, limits: &Limits) -> Result<usize> {
    let body_len = usize::try_from(body_len)
        .map_err(|_| FrameError::LimitExceeded("frame length exceeds platform limits".into()))?;
    if body_len > limits.max_frame_bytes {
        return Err(FrameError::LimitExceeded(format!(
            "frame body of {} bytes (max {})",
            body_len, limits.max_frame_bytes
        )));
    }
    Ok(body_len)
}

fn prefixed_len(len: usize) -> usize {
    uleb128_len(len as u64) + len
}

fn write_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&encode_uleb128(bytes.len() as u64));
    out.extend_from_slice(bytes);
}

struct BodyCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BodyCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_uleb128(&mut self) -> Result<u64> {
        let (value, consumed) = decode_uleb128(&self.bytes[self.pos..]).map_err(|err| match err {
            FrameError::UnexpectedEof => FrameError::CorruptFrame("truncated varint".to_string()),
            other => other,
        })?;
        self.pos += consumed;
        Ok(value)
    }

    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_uleb128()?;
        let len = usize::try_from(len)
            .map_err(|_| FrameError::CorruptFrame("length exceeds platform limits".into()))?;
        if len > self.remaining() {
            return Err(FrameError::CorruptFrame(format!(
                "length {} overruns frame body ({} bytes left)",
                len,
                self.remaining()
            )));
        }
        Ok(len)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(FrameError::CorruptFrame("frame body truncated".to_string()));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| FrameError::CorruptFrame("invalid UTF-8 string".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        let mut source = BTreeMap::new();
        source.insert("host".to_string(), "db-01".to_string());
        source.insert("metric".to_string(), "load".to_string());
        Frame::new(source, 1_600_000_000_000_000_000, Payload::Real(0.75))
    }

    #[test]
    fn test_frame_roundtrip() {
        let frame = sample_frame();
        let encoded = frame.encode().unwrap();
        assert_eq!(&encoded[..4], &FRAME_MAGIC);

        let (decoded, consumed) = Frame::decode(&encoded, &Limits::default()).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn test_encode_rejects_undecodable_frames() {
        let limits = Limits::default();

        let oversized = Frame::new(
            BTreeMap::new(),
            0,
            Payload::Binary(vec![0; limits.max_frame_bytes]),
        );
        assert!(matches!(oversized.encode(), Err(FrameError::Encode(_))));

        let source = (0..=limits.max_source_tags)
            .map(|i| (i.to_string(), String::new()))
            .collect();
        let tagged = Frame::new(source, 0, Payload::Empty);
        let err = tagged.encode().unwrap_err();
        assert!(err.to_string().contains("source tags"));
    }

    #[test]
    fn test_encoded_len_is_exact() {
        let payloads = vec![
            Payload::Empty,
            Payload::Number(u64::MAX),
            Payload::Real(-1.5),
            Payload::Text("x".repeat(300)),
            Payload::Binary(vec![0xAB; 129]),
        ];
        for payload in payloads {
            let mut frame = sample_frame();
            frame.payload = payload;
            assert_eq!(frame.encoded_len(), frame.encode().unwrap().len());
        }
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut encoded = sample_frame().encode().unwrap();
        encoded[0] = b'X';
        assert!(matches!(
            Frame::decode(&encoded, &Limits::default()),
            Err(FrameError::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_decode_detects_checksum_mismatch() {
        let mut encoded = sample_frame().encode().unwrap();
        let last = encoded.len() - 6;
        encoded[last] ^= 0xFF;
        assert!(matches!(
            Frame::decode(&encoded, &Limits::default()),
            Err(FrameError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = sample_frame().encode().unwrap();
        assert!(matches!(
            Frame::decode(&encoded[..encoded.len() - 1], &Limits::default()),
            Err(FrameError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_decode_enforces_frame_limit() {
        let mut frame = sample_frame();
        frame.payload = Payload::Binary(vec![0; 256]);
        let encoded = frame.encode().unwrap();
        let limits = Limits {
            max_frame_bytes: 64,
            ..Limits::default()
        };
        assert!(matches!(
            Frame::decode(&encoded, &limits),
            Err(FrameError::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_decode_body_rejects_unknown_payload_tag() {
        // timestamp 0, no tags, payload tag 9
        let body = [0x00, 0x00, 0x09];
        assert!(matches!(
            Frame::decode_body(&body, &Limits::default()),
            Err(FrameError::UnsupportedPayloadTag(9))
        ));
    }

    #[test]
    fn test_decode_body_rejects_trailing_bytes() {
        let body = [0x00, 0x00, PAYLOAD_EMPTY, 0xFF];
        assert!(matches!(
            Frame::decode_body(&body, &Limits::default()),
            Err(FrameError::CorruptFrame(_))
        ));
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(sample_frame()).unwrap();
        assert_eq!(value["source"]["host"], "db-01");
        assert_eq!(value["timestamp"], 1_600_000_000_000_000_000i64);
        assert_eq!(value["payload"]["real"], 0.75);
    }
}
