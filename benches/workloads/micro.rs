use criterion::{black_box, Criterion};

pub fn run(c: &mut Criterion) {
    bench_alloc_mini(c);
    bench_alloc_threshold(c);
    bench_alloc_huge(c);
    bench_vec_push(c);
}

fn bench_alloc_mini(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_mini");
    group.warm_up_time(std::time::Duration::from_millis(500));
    group.measurement_time(std::time::Duration::from_secs(1));
    group.sample_size(10);

    group.bench_function("alloc_free_16b", |b| {
        b.iter(|| {
            black_box(Box::new(black_box(10u128)));
        })
    });

    group.bench_function("alloc_free_1kb", |b| {
        b.iter(|| {
            let v = Vec::<u8>::with_capacity(1024);
            black_box(v.into_boxed_slice());
        })
    });

    group.finish();
}

// Sizes straddling the 16 KiB mini/huge split.
fn bench_alloc_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_threshold");

    group.bench_function("alloc_free_16kb_minus", |b| {
        b.iter(|| {
            let v = Vec::<u8>::with_capacity(16 * 1024 - 64);
            black_box(v.into_boxed_slice());
        })
    });

    group.bench_function("alloc_free_16kb_plus", |b| {
        b.iter(|| {
            let v = Vec::<u8>::with_capacity(16 * 1024 + 64);
            black_box(v.into_boxed_slice());
        })
    });

    group.finish();
}

fn bench_alloc_huge(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_huge");

    group.bench_function("alloc_free_1mb", |b| {
        b.iter(|| {
            let v = Vec::<u8>::with_capacity(1024 * 1024);
            black_box(v.into_boxed_slice());
        })
    });

    group.finish();
}

fn bench_vec_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro_vec");

    group.bench_function("vec_push_1000", |b| {
        b.iter(|| {
            let mut v = Vec::with_capacity(1000);
            for i in 0..1000 {
                v.push(black_box(i));
            }
            black_box(v);
        })
    });

    group.finish();
}
