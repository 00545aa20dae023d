//! Chunking performance benchmarks
//!
//! Measures performance of:
//! - Semantic (block) chunking of code
//! - Line-window chunking of prose
//! - The oversize fallback path
//! - Walking a small synthetic repository

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use repoingest_core::index::{identify_blocks, walk_repository, Chunker, WalkOptions};
use tempfile::TempDir;

fn generate_typescript(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        source.push_str(&format!(
            "export async function handler{i}(req: Request) {{\n  const body = await req.json();\n  if (body.id === {i}) {{\n    return respond(body);\n  }}\n  return null;\n}}\n\n"
        ));
    }
    source
}

fn generate_prose(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Paragraph {i}: the quick brown fox jumps over the lazy dog."))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_semantic(c: &mut Criterion) {
    let mut group = c.benchmark_group("semantic_chunking");
    let chunker = Chunker::default();

    for functions in [10, 50, 100] {
        let source = generate_typescript(functions);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(functions), &source, |b, source| {
            b.iter(|| chunker.chunk_file("bench/repo", "/bench/app.ts", black_box(source), "app.ts"))
        });
    }
    group.finish();
}

fn bench_block_scan(c: &mut Criterion) {
    let source = generate_typescript(200);
    let lines: Vec<&str> = source.split('\n').collect();
    c.bench_function("identify_blocks_200_functions", |b| {
        b.iter(|| identify_blocks(black_box(&lines)))
    });
}

fn bench_simple(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_window_chunking");
    let chunker = Chunker::default();

    for lines in [100, 1_000, 10_000] {
        let prose = generate_prose(lines);
        group.throughput(Throughput::Bytes(prose.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &prose, |b, prose| {
            b.iter(|| chunker.chunk_file("bench/repo", "/bench/notes.txt", black_box(prose), "notes.txt"))
        });
    }
    group.finish();
}

fn bench_oversize_fallback(c: &mut Criterion) {
    let body: String = (0..2_000).map(|i| format!("    let v{i} = {i};\n")).collect();
    let source = format!("fn giant() {{\n{body}}}\n");
    let chunker = Chunker::default();

    c.bench_function("oversize_fallback", |b| {
        b.iter(|| chunker.chunk_file("bench/repo", "/bench/giant.rs", black_box(&source), "giant.rs"))
    });
}

fn bench_walk(c: &mut Criterion) {
    let temp = TempDir::new().unwrap();
    for i in 0..50 {
        let dir = temp.path().join(format!("src/module{}", i % 5));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("file{i}.ts")), generate_typescript(10)).unwrap();
    }
    std::fs::create_dir_all(temp.path().join("node_modules/dep")).unwrap();
    std::fs::write(
        temp.path().join("node_modules/dep/index.js"),
        generate_typescript(100),
    )
    .unwrap();

    let chunker = Chunker::default();
    let options = WalkOptions::default();
    c.bench_function("walk_50_files", |b| {
        b.iter(|| walk_repository(black_box(temp.path()), "bench/repo", &options, &chunker))
    });
}

criterion_group!(
    benches,
    bench_semantic,
    bench_block_scan,
    bench_simple,
    bench_oversize_fallback,
    bench_walk
);
criterion_main!(benches);
