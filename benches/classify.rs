//! Measures keyword classification of the built-in requirement table, and a
//! full generation run that writes every report to disk.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rtm::{
    domain::{Config, HierarchyCatalog, RawRequirement},
    pipeline::Generator,
    storage::{BuiltinExtractor, Extractor, ReportAssembler},
};
use tempfile::TempDir;

fn classify(c: &mut Criterion) {
    let catalog = HierarchyCatalog::sbs();
    let classifier = Config::default().classifier(&catalog).unwrap();
    let raw: Vec<RawRequirement> = BuiltinExtractor.extract().unwrap();

    c.bench_function("classify builtin", |b| {
        b.iter(|| {
            for record in &raw {
                std::hint::black_box(classifier.classify(&record.description));
            }
        });
    });
}

fn generate(c: &mut Criterion) {
    let catalog = HierarchyCatalog::sbs();
    let config = Config::default();
    let generator = Generator::new(config.classifier(&catalog).unwrap(), config.linker());

    c.bench_function("generate reports", |b| {
        b.iter_batched(
            || TempDir::new().unwrap(),
            |tmp_dir| {
                let requirements = generator.generate(&BuiltinExtractor).unwrap();
                ReportAssembler::new(tmp_dir.path(), config.document.clone(), &catalog)
                    .write_all(&requirements)
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, classify, generate);
criterion_main!(benches);
