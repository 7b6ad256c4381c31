//! Benchmarks for indexing a pack.
//!
//! These benchmarks measure Phase 1 over packs with a growing number of
//! integration packages and layout files.

use std::fs;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pack_sync::phases::index;
use tempfile::TempDir;

/// Create a pack with `count` integrations and `count` layouts.
fn populate(root: &Path, count: usize) {
    for i in 0..count {
        let package = root.join(format!("Integrations/Bench{i}"));
        fs::create_dir_all(&package).unwrap();
        fs::write(
            package.join(format!("Bench{i}.yml")),
            format!("commonfields:\n  id: bench-{i}\nname: Bench {i}\ncategory: Utilities\nscript:\n  script: '-'\n"),
        )
        .unwrap();
        fs::write(package.join(format!("Bench{i}.py")), "def main():\n    pass\n").unwrap();
        fs::write(package.join(format!("Bench{i}_description.md")), "Bench").unwrap();
    }

    let layouts = root.join("Layouts");
    fs::create_dir_all(&layouts).unwrap();
    for i in 0..count {
        fs::write(
            layouts.join(format!("layout-Bench{i}.json")),
            format!(r#"{{"typeId": "Bench{i}", "kind": "details"}}"#),
        )
        .unwrap();
    }
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_index");

    for count in [10, 100, 500] {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), count);
        group.bench_with_input(BenchmarkId::new("items", count), temp.path(), |b, root| {
            b.iter(|| index::build(black_box(root)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_index_build);
criterion_main!(benches);
