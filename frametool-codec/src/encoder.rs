//! Output encoders for frames and bursts

use frametool_format::{Burst, Frame, Result};

/// Serializes one frame into an output buffer
pub trait FrameEncoder {
    /// Format name this encoder is registered under
    fn name(&self) -> &'static str;

    /// Encode a single frame
    fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>>;
}

/// Serializes a whole burst into an output buffer
pub trait BurstEncoder {
    /// Format name this encoder is registered under
    fn name(&self) -> &'static str;

    /// Encode a burst
    fn encode_burst(&self, burst: &Burst) -> Result<Vec<u8>>;
}

/// Canonical binary frame form
#[derive(Debug, Default, Clone, Copy)]
pub struct RawFrameEncoder;

impl FrameEncoder for RawFrameEncoder {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>> {
        frame.encode()
    }
}

/// One compact JSON object per line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFrameEncoder;

impl FrameEncoder for JsonFrameEncoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>> {
        let mut out = serde_json::to_vec(frame)?;
        out.push(b'\n');
        Ok(out)
    }
}

/// Canonical binary burst form
#[derive(Debug, Default, Clone, Copy)]
pub struct RawBurstEncoder;

impl BurstEncoder for RawBurstEncoder {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn encode_burst(&self, burst: &Burst) -> Result<Vec<u8>> {
        burst.encode()
    }
}
