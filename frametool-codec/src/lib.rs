//! frametool codec - Encoders and stream decoding
//!
//! This crate sits between the format primitives and the I/O layer:
//!
//! - Frame and burst encoders (`raw`, `json`)
//! - The encoder registry that maps format names to encoders
//! - An incremental record reader over any `std::io::Read`

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod encoder;
pub mod registry;
pub mod stream;

// Re-export commonly used types
pub use frametool_format::{build_burst, Burst, Frame, FrameError, Limits, Payload, Result};

// Re-export our own types
pub use encoder::{BurstEncoder, FrameEncoder, JsonFrameEncoder, RawBurstEncoder, RawFrameEncoder};
pub use registry::{EncoderRegistry, OutputFormat, Packing, ResolvedEncoder};
pub use stream::{Record, RecordReader};
