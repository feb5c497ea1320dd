use criterion::{black_box, Criterion};

use super::XorShift64;

const LIVE_BYTES: usize = 4 * 1024 * 1024;
const OPS: usize = 10_000;

pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("shbench");

    group.bench_function("fragmentation_churn", |b| {
        b.iter(|| {
            let mut rng = XorShift64::new(0x1234_5678);
            let mut live_data = Vec::new();
            let mut current_bytes = 0;

            // Build a live set, then churn random entries so pages fill,
            // retire, and recycle continuously.
            while current_bytes < LIVE_BYTES {
                let size = rng.gen_range(16, 8192);
                live_data.push(vec![0u8; size]);
                current_bytes += size;
            }

            for _ in 0..OPS {
                let idx = rng.gen_range(0, live_data.len());
                let new_size = rng.gen_range(16, 8192);
                live_data[idx] = vec![0u8; new_size];
                black_box(&live_data[idx]);
            }

            black_box(live_data);
        })
    });

    group.finish();
}
