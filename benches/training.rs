use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use score_predictor::training::{
    builtin_factories, EvaluationMode, EvaluationOptions, ModelEvaluator, ModelRegistry, Regressor,
    STANDARD_MODELS,
};

/// Matrix shaped like the transformed student table: 2 numeric + 17 indicator columns
fn create_regression_data(n_rows: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x = Array2::from_shape_fn((n_rows, 19), |(_, j)| {
        if j < 2 {
            rng.gen::<f64>() * 2.0 - 1.0
        } else {
            f64::from(u8::from(rng.gen_bool(0.3)))
        }
    });
    let y = x.column(0).mapv(|v| 10.0 * v) + x.column(1).mapv(|v| 6.0 * v) + x.column(2).mapv(|v| 3.0 * v);
    (x, y)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);

    let (x, y) = create_regression_data(1000, 0);
    for ((name, _), factory) in STANDARD_MODELS.iter().zip(builtin_factories()) {
        group.bench_with_input(BenchmarkId::new("model", name), &factory, |b, factory| {
            b.iter(|| {
                let mut model = factory.build(42);
                model.fit(black_box(&x), black_box(&y)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(10);

    let (x, y) = create_regression_data(800, 0);
    let (test_x, test_y) = create_regression_data(200, 1);

    for mode in [EvaluationMode::Sequential, EvaluationMode::Parallel] {
        let evaluator = ModelEvaluator::new(EvaluationOptions::default().with_mode(mode));
        group.bench_with_input(BenchmarkId::new("registry", format!("{:?}", mode)), &evaluator, |b, evaluator| {
            b.iter(|| {
                let mut registry = ModelRegistry::standard(42);
                evaluator.evaluate(&x, &y, &test_x, &test_y, &mut registry).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_evaluation);
criterion_main!(benches);
