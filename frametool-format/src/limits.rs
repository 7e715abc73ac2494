//! Decoding limits

/// Limits applied while decoding untrusted input
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum encoded frame body length (default: 16 MiB)
    pub max_frame_bytes: usize,
    /// Maximum frames in a single burst (default: 1,000,000)
    pub max_burst_frames: usize,
    /// Maximum source tags per frame (default: 1,024)
    pub max_source_tags: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_bytes: 16 * 1024 * 1024,
            max_burst_frames: 1_000_000,
            max_source_tags: 1_024,
        }
    }
}
