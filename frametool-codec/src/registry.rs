//! Output format names and the encoder registry

use crate::encoder::{
    BurstEncoder, FrameEncoder, JsonFrameEncoder, RawBurstEncoder, RawFrameEncoder,
};
use frametool_format::{FrameError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Known output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Canonical binary form
    #[default]
    Raw,
    /// Line-delimited JSON
    Json,
}

impl OutputFormat {
    /// Registry name of this format
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Raw => "raw",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(OutputFormat::Raw),
            "json" => Ok(OutputFormat::Json),
            other => Err(FrameError::UnknownFormat(other.to_string())),
        }
    }
}

/// How output frames are packed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Packing {
    /// Encode and write each frame as it is read
    #[default]
    Frame,
    /// Collect every frame into one burst and write it once
    Burst,
}

/// Encoder chosen for one command invocation
#[derive(Clone, Copy)]
pub enum ResolvedEncoder<'a> {
    /// Frame-by-frame encoding
    Frame(&'a dyn FrameEncoder),
    /// Whole-stream burst encoding
    Burst(&'a dyn BurstEncoder),
}

impl<'a> ResolvedEncoder<'a> {
    /// Format name of the resolved encoder
    pub fn name(&self) -> &'static str {
        match self {
            ResolvedEncoder::Frame(encoder) => encoder.name(),
            ResolvedEncoder::Burst(encoder) => encoder.name(),
        }
    }
}

/// Mapping from format name to encoder
pub struct EncoderRegistry {
    frame: BTreeMap<&'static str, Box<dyn FrameEncoder>>,
    burst: BTreeMap<&'static str, Box<dyn BurstEncoder>>,
}

impl EncoderRegistry {
    /// Registry with no encoders
    pub fn empty() -> Self {
        Self {
            frame: BTreeMap::new(),
            burst: BTreeMap::new(),
        }
    }

    /// Registry holding the raw and json frame encoders and the raw burst encoder
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_frame(Box::new(RawFrameEncoder));
        registry.register_frame(Box::new(JsonFrameEncoder));
        registry.register_burst(Box::new(RawBurstEncoder));
        registry
    }

    /// Add or replace a frame encoder under its own name
    pub fn register_frame(&mut self, encoder: Box<dyn FrameEncoder>) {
        self.frame.insert(encoder.name(), encoder);
    }

    /// Add or replace a burst encoder under its own name
    pub fn register_burst(&mut self, encoder: Box<dyn BurstEncoder>) {
        self.burst.insert(encoder.name(), encoder);
    }

    /// Names usable for frame-by-frame output
    pub fn frame_formats(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.frame.keys().copied()
    }

    /// Look up a frame encoder
    pub fn frame_encoder(&self, name: &str) -> Result<&dyn FrameEncoder> {
        self.frame
            .get(name)
            .map(|encoder| encoder.as_ref())
            .ok_or_else(|| FrameError::UnknownFormat(name.to_string()))
    }

    /// Look up a burst encoder; a known frame format without burst support is rejected
    pub fn burst_encoder(&self, name: &str) -> Result<&dyn BurstEncoder> {
        match self.burst.get(name) {
            Some(encoder) => Ok(encoder.as_ref()),
            None if self.frame.contains_key(name) => Err(FrameError::UnsupportedPacking {
                format: name.to_string(),
            }),
            None => Err(FrameError::UnknownFormat(name.to_string())),
        }
    }

    /// Resolve the encoder for a format and packing mode
    pub fn resolve(&self, name: &str, packing: Packing) -> Result<ResolvedEncoder<'_>> {
        match packing {
            Packing::Frame => self.frame_encoder(name).map(ResolvedEncoder::Frame),
            Packing::Burst => self.burst_encoder(name).map(ResolvedEncoder::Burst),
        }
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
