//! Producer hot-path benchmarks.
//!
//! Run with: `cargo bench -p limlog --bench produce`
//!
//! # What we measure
//!
//! - Raw ring produce/publish of a fixed record
//! - Full record assembly (header formatting + payload + publish)
//! - The cost of an emitted-but-filtered record

use std::fmt::Write as FmtWrite;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use limlog::{Config, Level, Logger, NullWriter, RingBuffer};

fn bench_ring_produce(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");
    let record = b"INFO  2021-10-10T13:46:58.123456Z 4242 benchmark payload\n";
    group.throughput(Throughput::Bytes(record.len() as u64));

    let ring = RingBuffer::with_default_capacity();
    let mut sink = vec![0u8; 64 * 1024];
    let mut pending = 0u32;

    group.bench_function("produce_publish", |b| {
        b.iter(|| {
            ring.produce(black_box(record));
            ring.advance_consumable(record.len() as u32);
            pending += record.len() as u32;
            // Drain periodically so the producer never hits back-pressure.
            if pending >= 32 * 1024 {
                while ring.consumable() > 0 {
                    ring.consume(&mut sink);
                }
                pending = 0;
            }
        });
    });

    group.finish();
}

fn bench_record_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");

    let logger = Logger::with_writer(Config::default(), Box::new(NullWriter::new()));

    group.bench_function("info_with_two_args", |b| {
        b.iter(|| {
            let mut record = logger.record(Level::Info, None);
            let _ = write!(record, "iteration={} state={}", black_box(42u64), "running");
        });
    });

    group.bench_function("filtered_out", |b| {
        b.iter(|| {
            // Below the Info threshold: the only cost is the level check.
            if logger.enabled(black_box(Level::Debug)) {
                let mut record = logger.record(Level::Debug, None);
                let _ = write!(record, "never rendered");
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_ring_produce, bench_record_assembly);
criterion_main!(benches);
