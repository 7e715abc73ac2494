//! Error types for frametool

use std::path::PathBuf;
use thiserror::Error;

/// frametool error types
#[derive(Debug, Error)]
pub enum FrameError {
    /// Record does not start with a known frame or burst magic.
    #[error("Invalid magic bytes: {0:02x?}")]
    InvalidMagic([u8; 4]),
    /// CRC32C verification failed for a frame or burst.
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    /// Input ended in the middle of a record.
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Frame body is inconsistent or corrupt.
    #[error("Corrupt frame: {0}")]
    CorruptFrame(String),
    /// Payload carried a type tag this decoder does not know.
    #[error("Unsupported payload tag: {0}")]
    UnsupportedPayloadTag(u8),
    /// A configured decoding limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// Output format name is not registered.
    #[error("Unknown output format '{0}' (expected one of: raw, json)")]
    UnknownFormat(String),
    /// Output format exists but cannot encode bursts.
    #[error("Output format '{format}' does not support burst packing")]
    UnsupportedPacking {
        /// Requested format name
        format: String,
    },
    /// Configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// An input file could not be opened.
    #[error("Cannot open input #{index} '{}': {source}", path.display())]
    SourceOpen {
        /// Zero-based position of the file in the input list
        index: usize,
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// An output file could not be created.
    #[error("Cannot create output '{}': {source}", path.display())]
    SinkOpen {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// Encoder rejected a frame or burst.
    #[error("Encode error: {0}")]
    Encode(String),
    /// Writing to the output destination failed.
    #[error("Write failed: {0}")]
    SinkWrite(#[source] std::io::Error),
    /// I/O operation failed while reading data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FrameError {
    /// True for failures caused by malformed input rather than configuration or I/O.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidMagic(_)
                | FrameError::ChecksumMismatch
                | FrameError::UnexpectedEof
                | FrameError::CorruptFrame(_)
                | FrameError::UnsupportedPayloadTag(_)
                | FrameError::LimitExceeded(_)
        )
    }

    /// True for errors raised while resolving configuration, before any I/O.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            FrameError::UnknownFormat(_)
                | FrameError::UnsupportedPacking { .. }
                | FrameError::InvalidConfig(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, FrameError>;
