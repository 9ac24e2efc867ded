use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pbxsync::config::{MatchMode, ProjectConfig};
use pbxsync::manifest::{Document, GroupForest, add_missing};
use pbxsync::scanner::missing_files;
use std::hint::black_box;
use std::path::PathBuf;

const SAMPLE_MANIFEST: &str = include_str!("../tests/fixtures/App.pbxproj");

fn project() -> ProjectConfig {
    ProjectConfig::new(
        "bench",
        PathBuf::from("/src"),
        PathBuf::from("/src/App.xcodeproj/project.pbxproj"),
    )
}

fn source_files(count: usize, prefix: &str) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("Module{}/Sub{}/{prefix}{i}.swift", i % 10, i % 3)))
        .collect()
}

/// Manifest already referencing `size` files spread over nested groups
fn create_test_manifest(size: usize) -> Document {
    add_missing(Document::new(SAMPLE_MANIFEST), &source_files(size, "Existing"), &project())
        .expect("synthetic manifest")
}

fn benchmark_group_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_forest");
    for size in [100, 1000] {
        let doc = create_test_manifest(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| GroupForest::parse(black_box(doc)));
        });
    }
    group.finish();
}

fn benchmark_missing_files(c: &mut Criterion) {
    let doc = create_test_manifest(1000);
    let mut candidates = source_files(1000, "Existing");
    candidates.extend(source_files(50, "New"));

    let mut by_name = project();
    by_name.match_mode = MatchMode::Filename;
    c.bench_function("missing_files_filename", |b| {
        b.iter(|| missing_files(black_box(&doc), black_box(&candidates), &by_name));
    });

    let mut by_path = project();
    by_path.match_mode = MatchMode::Path;
    c.bench_function("missing_files_path", |b| {
        b.iter(|| missing_files(black_box(&doc), black_box(&candidates), &by_path));
    });
}

fn benchmark_add_missing(c: &mut Criterion) {
    let doc = create_test_manifest(1000);
    let new_files = source_files(20, "New");
    let project = project();

    c.bench_function("add_20_files_to_1000", |b| {
        b.iter(|| add_missing(black_box(doc.clone()), black_box(&new_files), &project));
    });
}

criterion_group!(
    benches,
    benchmark_group_parsing,
    benchmark_missing_files,
    benchmark_add_missing
);
criterion_main!(benches);
