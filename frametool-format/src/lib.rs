//! frametool format - Core primitives for frame and burst streams
//!
//! This crate provides the data model and canonical binary codec with no
//! I/O dependencies. It includes:
//!
//! - Magic numbers and payload tags
//! - Variable-length integer encoding (ULEB128/ZigZag)
//! - CRC32C checksums
//! - Error types
//! - Decoding limits
//! - Frame and Burst structures

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod burst;
pub mod checksum;
pub mod constants;
pub mod error;
pub mod frame;
pub mod limits;
pub mod varint;

// Re-export commonly used types
pub use burst::{build_burst, burst_encoded_len, Burst};
pub use error::{FrameError, Result};
pub use frame::{Frame, Payload};
pub use limits::Limits;
