//! Property tests feeding hostile bytes to the record reader
//!
//! Arbitrary input must always end in a clean end-of-stream or a typed
//! error; it must never panic or allocate past the configured limits.

use frametool_codec::{build_burst, Frame, FrameError, Limits, Payload, RecordReader};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::io::Cursor;

fn tight_limits() -> Limits {
    Limits {
        max_frame_bytes: 4096,
        max_burst_frames: 64,
        max_source_tags: 16,
    }
}

fn drain(bytes: Vec<u8>, limits: Limits) -> Result<usize, FrameError> {
    let mut reader = RecordReader::with_limits(Cursor::new(bytes), limits);
    let mut frames = 0;
    while let Some(record) = reader.next_record()? {
        frames += record.into_frames().len();
    }
    Ok(frames)
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(input in prop::collection::vec(any::<u8>(), 0..2048)) {
        let _ = drain(input, tight_limits());
    }

    #[test]
    fn valid_prefix_then_garbage_reports_error(
        count in 1usize..8,
        garbage in prop::collection::vec(any::<u8>(), 1..64)
    ) {
        let frames: Vec<Frame> = (0..count)
            .map(|i| Frame::new(BTreeMap::new(), i as i64, Payload::Number(i as u64)))
            .collect();
        let mut bytes = build_burst(frames).encode().unwrap();
        bytes.extend(garbage);

        // Garbage after a complete record must never be mistaken for a clean finish.
        prop_assert!(drain(bytes, tight_limits()).is_err());
    }

    #[test]
    fn flipped_byte_is_detected(seq in 0u64..1000, flip in 0usize..64) {
        let mut source = BTreeMap::new();
        source.insert("seq".to_string(), seq.to_string());
        let frame = Frame::new(source, seq as i64, Payload::Text("payload".into()));
        let mut bytes = frame.encode().unwrap();
        let idx = flip % bytes.len();
        bytes[idx] ^= 0x01;

        prop_assert!(drain(bytes, Limits::default()).is_err());
    }
}

#[test]
fn burst_count_limit_checked_before_reading_frames() {
    let frames: Vec<Frame> = (0..65)
        .map(|i| Frame::new(BTreeMap::new(), i, Payload::Empty))
        .collect();
    let bytes = build_burst(frames).encode().unwrap();
    assert!(matches!(
        drain(bytes, tight_limits()),
        Err(FrameError::LimitExceeded(_))
    ));
}
