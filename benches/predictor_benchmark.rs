use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spendcat::classifier::TfIdfVectorizer;
use spendcat::{normalize, CategoryDefinition, Classifier, ClassifierBuilder, Predictor};

const MERCHANTS: &[(&str, &[&str])] = &[
    ("Dining", &["STARBUCKS COFFEE #1203", "MCDONALDS F2345", "CHIPOTLE 0921"]),
    ("Groceries", &["WALMART SUPERCENTER", "KROGER #221", "WHOLE FOODS MARKET"]),
    ("Gas", &["SHELL OIL 5745", "CHEVRON 0091", "EXXONMOBIL 4432"]),
    ("Shopping", &["AMAZON.COM*MK1AB", "TARGET T-1234", "BEST BUY 00012"]),
];

fn builder_with(count: usize) -> ClassifierBuilder {
    let mut builder = Classifier::builder();
    for i in 0..count {
        let (name, examples) = MERCHANTS[i % MERCHANTS.len()];
        let examples: Vec<String> = examples.iter().map(|e| format!("{} {}", e, i)).collect();
        builder = builder
            .add_category(CategoryDefinition::new(format!("{} {}", name, i)).with_examples(examples))
            .unwrap();
    }
    builder
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| {
        normalize(black_box("STARBUCKS #123"), black_box(Some("Starbucks")))
    }));

    group.bench_function("long_text", |b| b.iter(|| {
        normalize(
            black_box("POS DEBIT 04/12 AMAZON.COM*MK1AB2CD3 AMZN.COM/BILL WA REF# 0012345678 CARD ENDING 4321"),
            black_box(None),
        )
    }));

    group.bench_function("tokenize", |b| b.iter(|| {
        TfIdfVectorizer::tokenize(black_box("pos debit amazon com mk1ab2cd3 amzn com bill wa")).unwrap()
    }));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let predictor = Predictor::with_loader(builder_with(4).build().unwrap().into_classifier());
    group.bench_function("predict", |b| b.iter(|| {
        predictor.predict(black_box("SHELL OIL 9999"), black_box(Some("Shell")))
    }));

    let unloaded = Predictor::from_dir("/nonexistent/spendcat/models");
    group.bench_function("predict_fallback", |b| b.iter(|| {
        unloaded.predict(black_box("SHELL OIL 9999"), black_box(Some("Shell")))
    }));

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scaling");
    group.sample_size(20);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Scaling with number of categories
    for &count in &[2, 5, 10, 20] {
        let classifier = builder_with(count).build().unwrap().into_classifier();
        group.bench_function(format!("categories_{}", count), |b| b.iter(|| {
            classifier.categorize(black_box("walmart supercenter 3")).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_normalization,
    bench_prediction,
    bench_scaling
);
criterion_main!(benches);
