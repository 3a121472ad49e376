use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use bytepool::{ByteBuffer, CalibratedPool};

/// Benchmark pooled get/put cycles
fn bench_get_put(c: &mut Criterion) {
    let pool = CalibratedPool::new();
    let payload = vec![0u8; 16_384];

    let mut group = c.benchmark_group("get_put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fixed_size", |b| {
        b.iter(|| {
            let mut buf = pool.get();
            buf.append(black_box(&payload[..1024]));
            pool.put(buf);
        })
    });

    group.bench_function("mixed_sizes", |b| {
        let sizes = [100usize, 4000, 512, 64, 16_384];
        let mut i = 0usize;
        b.iter(|| {
            let len = sizes[i % sizes.len()];
            i = i.wrapping_add(1);
            let mut buf = pool.get();
            buf.append(black_box(&payload[..len]));
            pool.put(buf);
        })
    });

    group.finish();
}

/// Benchmark the unpooled baseline for comparison
fn bench_fresh_allocation(c: &mut Criterion) {
    let payload = vec![0u8; 1024];

    let mut group = c.benchmark_group("fresh_allocation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fixed_size", |b| {
        b.iter(|| {
            let mut buf = ByteBuffer::new();
            buf.append(black_box(&payload));
            black_box(buf.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_get_put, bench_fresh_allocation);
criterion_main!(benches);
