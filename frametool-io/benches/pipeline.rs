use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use frametool_io::{
    cat_frames, split_frames, EncoderRegistry, Frame, GenOptions, GeneratedSource, MemoryChunks,
    MemorySink, Result, SplitOptions, StreamSource, VecSource, WriteFailurePolicy,
};
use frametool_io::FrameSource;
use std::io::Cursor;

fn generate_frames(count: u64) -> Vec<Frame> {
    GeneratedSource::new(GenOptions {
        count,
        ..GenOptions::default()
    })
    .frames()
    .collect::<Result<_>>()
    .unwrap()
}

fn raw_stream(frames: &[Frame]) -> Vec<u8> {
    frames.iter().flat_map(|f| f.encode().unwrap()).collect()
}

fn bench_cat(c: &mut Criterion) {
    let mut group = c.benchmark_group("cat");
    let encoders = EncoderRegistry::builtin();

    for count in [1_000u64, 10_000] {
        let bytes = raw_stream(&generate_frames(count));
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        for format in ["raw", "json"] {
            let encoder = encoders.frame_encoder(format).unwrap();
            group.bench_with_input(BenchmarkId::new(format, count), &bytes, |b, bytes| {
                b.iter(|| {
                    let mut source = StreamSource::new(Cursor::new(black_box(bytes)));
                    let mut sink = MemorySink::new();
                    cat_frames(&mut source, encoder, &mut sink, WriteFailurePolicy::Abort)
                        .unwrap()
                });
            });
        }
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let encoder = EncoderRegistry::builtin().burst_encoder("raw").unwrap();
    let frames = generate_frames(10_000);

    for max_chunk_size in [1024u64, 64 * 1024, 1024 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_chunk_size),
            &frames,
            |b, frames| {
                b.iter(|| {
                    let mut chunks = MemoryChunks::new();
                    split_frames(
                        &mut VecSource::new(frames.clone()),
                        encoder,
                        &mut chunks,
                        &SplitOptions {
                            max_chunk_size,
                            first_ordinal: 0,
                        },
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cat, bench_split);
criterion_main!(benches);
