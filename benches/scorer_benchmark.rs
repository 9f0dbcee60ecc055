use criterion::{black_box, criterion_group, criterion_main, Criterion};
use criticore::{BuiltinModel, RuntimeConfig, Scorer};

fn setup_benchmark_scorer(config: RuntimeConfig) -> Scorer {
    Scorer::builder()
        .with_runtime_config(config)
        .with_model(BuiltinModel::CamembertCriticality)
        .unwrap()
        .build()
        .unwrap()
}

fn bench_prediction(c: &mut Criterion) {
    let scorer = setup_benchmark_scorer(RuntimeConfig::default());
    let mut group = c.benchmark_group("Prediction");

    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Short report (< 10 tokens)
    group.bench_function("short_text", |b| {
        b.iter(|| scorer.predict(black_box("fuite d'huile pompe P-101")).unwrap())
    });

    // Typical report (~40 tokens)
    group.bench_function("medium_text", |b| {
        b.iter(|| {
            scorer
                .predict(black_box(
                    "vibration anormale détectée sur le palier côté accouplement de la pompe \
                     alimentaire, accompagnée d'une élévation de température et d'un bruit \
                     métallique intermittent pendant la montée en charge",
                ))
                .unwrap()
        })
    });

    // Past the fixed sequence length, exercising truncation
    group.bench_function("long_text", |b| {
        let long_text = "corrosion avancée constatée sur la tuyauterie vapeur haute pression ".repeat(40);
        b.iter(|| scorer.predict(black_box(long_text.as_str())).unwrap())
    });

    group.finish();
}

fn bench_runtime_configs(c: &mut Criterion) {
    let mut group = c.benchmark_group("RuntimeConfig");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let configs = vec![
        (
            "single_thread",
            RuntimeConfig {
                inter_threads: 1,
                intra_threads: 1,
                optimization_level: 1,
            },
        ),
        (
            "multi_thread",
            RuntimeConfig {
                inter_threads: 2,
                intra_threads: 2,
                optimization_level: 2,
            },
        ),
        ("optimized", RuntimeConfig::default()),
    ];

    for (name, config) in configs {
        let scorer = setup_benchmark_scorer(config);
        group.bench_function(format!("predict_{}", name), |b| {
            b.iter(|| {
                scorer
                    .predict(black_box("défaut capteur de température sur la chaudière B"))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let scorer = setup_benchmark_scorer(RuntimeConfig::default());
    let mut group = c.benchmark_group("Batch");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for &size in &[1usize, 8, 32] {
        let texts: Vec<String> = (0..size)
            .map(|i| format!("anomalie numéro {} sur l'équipement EQ-{:03}", i, i))
            .collect();
        group.bench_function(format!("batch_{}", size), |b| {
            b.iter(|| scorer.predict_batch(black_box(&texts)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prediction, bench_runtime_configs, bench_batch);
criterion_main!(benches);
