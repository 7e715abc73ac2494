#![no_main]

use frametool_codec::RecordReader;
use frametool_format::{Frame, Limits};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_frame_bytes: 1 << 20,
        max_burst_frames: 1 << 12,
        max_source_tags: 64,
    };

    let mut reader = RecordReader::with_limits(Cursor::new(data), limits.clone());
    while let Ok(Some(_)) = reader.next_record() {}

    // Slice decoding must agree with stream decoding on well-formed frames.
    if let Ok((frame, consumed)) = Frame::decode(data, &limits) {
        let mut stream = RecordReader::with_limits(Cursor::new(&data[..consumed]), limits);
        let record = stream.next_record().expect("slice-valid frame must stream-decode");
        let streamed = record.expect("one record").into_frames();
        assert_eq!(streamed.len(), 1);
        // Compare encodings so NaN payloads still match.
        assert_eq!(streamed[0].encode().unwrap(), frame.encode().unwrap());
    }
});
