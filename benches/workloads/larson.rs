use criterion::{black_box, Criterion, Throughput};
use std::thread;

use super::XorShift64;

const OPS_PER_THREAD: usize = 50_000;
const OBJECTS_PER_THREAD: usize = 1000;
const MIN_SIZE: usize = 16;
const MAX_SIZE: usize = 2048; // Mini-path sizes with realistic spread

pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("larson");

    for t in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements((OPS_PER_THREAD * t) as u64));
        group.bench_function(format!("larson_{}_threads", t), |b| {
            b.iter(|| {
                let mut handles = Vec::with_capacity(t);
                for i in 0..t {
                    handles.push(thread::spawn(move || {
                        let mut rng = XorShift64::new((i as u64 + 1) * 0xdead_beef);
                        let mut objects: Vec<Vec<u8>> = Vec::with_capacity(OBJECTS_PER_THREAD);
                        for _ in 0..OBJECTS_PER_THREAD {
                            objects.push(Vec::new());
                        }

                        // Replace a random live object each iteration: a
                        // steady mix of frees and fresh carves.
                        for _ in 0..OPS_PER_THREAD {
                            let idx = rng.gen_range(0, OBJECTS_PER_THREAD);
                            let size = rng.gen_range(MIN_SIZE, MAX_SIZE);
                            objects[idx] = vec![0u8; size];
                            black_box(&objects[idx]);
                        }
                        black_box(objects);
                    }));
                }
                for h in handles {
                    h.join().unwrap();
                }
            })
        });
    }
    group.finish();
}
