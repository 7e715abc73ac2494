use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use frametool_codec::{
    build_burst, BurstEncoder, Frame, FrameEncoder, JsonFrameEncoder, Payload, RawBurstEncoder,
    RawFrameEncoder, RecordReader,
};
use std::collections::BTreeMap;
use std::io::Cursor;

fn create_test_frames(count: usize, payload_len: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            let mut source = BTreeMap::new();
            source.insert("host".to_string(), format!("host{}", i % 16));
            source.insert("metric".to_string(), "bench".to_string());
            Frame::new(
                source,
                1_600_000_000_000_000_000 + i as i64,
                Payload::Binary(vec![(i % 251) as u8; payload_len]),
            )
        })
        .collect()
}

fn bench_frame_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encoding");

    for payload_len in [16, 256, 4096] {
        let frames = create_test_frames(1000, payload_len);

        group.bench_with_input(
            BenchmarkId::new("raw", payload_len),
            &frames,
            |b, frames| {
                b.iter(|| {
                    for frame in frames {
                        black_box(RawFrameEncoder.encode_frame(black_box(frame)).unwrap());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("json", payload_len),
            &frames,
            |b, frames| {
                b.iter(|| {
                    for frame in frames {
                        black_box(JsonFrameEncoder.encode_frame(black_box(frame)).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_burst_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_roundtrip");

    for count in [100, 10_000] {
        let burst = build_burst(create_test_frames(count, 64));
        let encoded = RawBurstEncoder.encode_burst(&burst).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", count), &burst, |b, burst| {
            b.iter(|| black_box(RawBurstEncoder.encode_burst(black_box(burst)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("read", count), &encoded, |b, encoded| {
            b.iter(|| {
                let mut reader = RecordReader::new(Cursor::new(encoded.as_slice()));
                black_box(reader.next_record().unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame_encoding, bench_burst_roundtrip);
criterion_main!(benches);
