#![no_main]

use frametool_format::varint::{decode_uleb128, encode_uleb128, uleb128_len, zigzag_decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((value, consumed)) = decode_uleb128(data) {
        assert!(consumed <= 10);
        assert_eq!(encode_uleb128(value).len(), uleb128_len(value));
        let _ = zigzag_decode(value);
    }
});
