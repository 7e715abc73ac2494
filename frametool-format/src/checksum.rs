//! CRC32C checksum utilities

/// Compute CRC32C for data
pub fn compute_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Extend a running CRC32C with more data
pub fn append_crc32c(crc: u32, data: &[u8]) -> u32 {
    crc32c::crc32c_append(crc, data)
}

/// Verify CRC32C for data
pub fn verify_crc32c(data: &[u8], expected: u32) -> Result<(), crate::error::FrameError> {
    check_crc32c(compute_crc32c(data), expected)
}

/// Compare an already computed CRC against the stored value
pub fn check_crc32c(actual: u32, expected: u32) -> Result<(), crate::error::FrameError> {
    if actual == expected {
        Ok(())
    } else {
        Err(crate::error::FrameError::ChecksumMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_matches_one_shot() {
        let data = b"frames and bursts";
        let split = append_crc32c(compute_crc32c(&data[..6]), &data[6..]);
        assert_eq!(split, compute_crc32c(data));
    }

    #[test]
    fn verify_detects_corruption() {
        let crc = compute_crc32c(b"abc");
        assert!(verify_crc32c(b"abc", crc).is_ok());
        assert!(verify_crc32c(b"abd", crc).is_err());
    }
}
