use criterion::{black_box, criterion_group, criterion_main, Criterion};
use soil_scorer_rust::{ScoringConfig, ScoringEngine};
use std::collections::HashMap;

fn mk_samples(n: usize) -> Vec<HashMap<String, f64>> {
    (0..n)
        .map(|i| {
            let t = (i % 100) as f64 / 100.0;
            HashMap::from([
                ("ph".to_string(), 4.5 + 3.5 * t),
                ("nitrogen".to_string(), 5.0 + 60.0 * t),
                ("phosphorus".to_string(), 8.0 + 30.0 * (1.0 - t)),
                ("potassium".to_string(), 100.0 + 200.0 * t),
                ("organic_matter".to_string(), 1.0 + 6.0 * t),
                ("cec".to_string(), 5.0 + 20.0 * (1.0 - t)),
                ("moisture".to_string(), 10.0 + 30.0 * t),
            ])
        })
        .collect()
}

fn bench_soil_scoring(c: &mut Criterion) {
    let engine = ScoringEngine::new(ScoringConfig::default()).unwrap();
    let samples = mk_samples(10_000);

    c.bench_function("score_soil_single", |b| {
        b.iter(|| engine.score_soil(black_box(&samples[17]), Some("Manicaland"), Some("rainy")))
    });

    c.bench_function("score_soil_batch_10k", |b| {
        b.iter(|| {
            let res = engine.score_soil_batch(black_box(&samples), Some("Manicaland"), Some("rainy"));
            black_box(res.len())
        })
    });

    c.bench_function("recommend", |b| {
        b.iter(|| engine.recommend(black_box(&samples[3]), Some("Matabeleland"), Some("rainy"), Some("maize")))
    });
}

fn bench_yield_prediction(c: &mut Criterion) {
    let engine = ScoringEngine::new(ScoringConfig::default()).unwrap();
    let samples = mk_samples(100);
    engine.yield_predictor().train(None).unwrap();

    c.bench_function("predict_yield", |b| {
        b.iter(|| engine.predict_yield(black_box(&samples[42])))
    });
}

criterion_group!(benches, bench_soil_scoring, bench_yield_prediction);
criterion_main!(benches);
