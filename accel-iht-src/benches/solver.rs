use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use accel_iht_src::prelude::*;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn recovery_problem(m: usize, n: usize, k: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let phi = Array2::from_shape_fn((m, n), |_| rng.gen::<f64>() - 0.5);
    let mut w = Array1::<f64>::zeros(n);
    for j in rand::seq::index::sample(&mut rng, n, k).iter() {
        w[j] = rng.gen::<f64>();
    }
    let y = phi.dot(&w);
    (phi, y)
}

fn bench_modes(c: &mut Criterion) {
    let (phi, y) = recovery_problem(300, 1000, 100, 233);
    let options = SolverOptions::default();
    let mut group = c.benchmark_group("recovery_300x1000_k100");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    for mode in [Mode::Iht, Mode::IhtII] {
        group.bench_function(mode.to_string(), |b| {
            b.iter(|| {
                let s = solve(black_box(phi.view()), black_box(y.view()), 100, mode, &options)
                    .expect("solve failed");
                black_box(s.objective)
            })
        });
    }
    group.finish();
}

fn bench_stochastic(c: &mut Criterion) {
    let (phi, y) = recovery_problem(300, 1000, 100, 233);
    let options = SolverOptions::default().with_stochastic_ratio(0.5).with_seed(1);
    c.bench_function("recovery_300x1000_k100_batch_0.5", |b| {
        b.iter(|| {
            let s = solve(black_box(phi.view()), black_box(y.view()), 100, Mode::Iht, &options)
                .expect("solve failed");
            black_box(s.objective)
        })
    });
}

criterion_group!(benches, bench_modes, bench_stochastic);
criterion_main!(benches);
