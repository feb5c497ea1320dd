use criterion::{black_box, Criterion, Throughput};
use std::sync::mpsc;
use std::thread;

const OPS: usize = 50_000;

// Producer/consumer pairs: every block is freed by a thread other than the
// one that allocated it, the pattern the shared-slot protocol exists for.
pub fn run(c: &mut Criterion) {
    let mut group = c.benchmark_group("threadtest_prod_cons");

    for t in [2, 4, 8, 16] {
        let pairs = t / 2;
        group.throughput(Throughput::Elements((OPS * pairs) as u64));

        group.bench_function(format!("threadtest_{}_threads", t), |b| {
            b.iter(|| {
                let mut handles = Vec::with_capacity(t);

                for _ in 0..pairs {
                    let (tx, rx) = mpsc::channel();

                    handles.push(thread::spawn(move || {
                        for i in 0..OPS {
                            let boxed = Box::new(i);
                            if tx.send(boxed).is_err() {
                                break;
                            }
                        }
                    }));

                    handles.push(thread::spawn(move || {
                        while let Ok(val) = rx.recv() {
                            black_box(val);
                        }
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
