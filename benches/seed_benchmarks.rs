use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use helvetia_seed::config::default_base_time;
use helvetia_seed::generate::{
    stream_rng, ArticleGenerator, Distributions, ReadGenerator, ReferentialIndex, UserGenerator,
};
use helvetia_seed::insert::build_read_statement;
use helvetia_seed::model::Read;
use helvetia_seed::pipeline::Batches;
use std::sync::Arc;

fn populated_index(users: usize, articles: usize) -> ReferentialIndex {
    let dists = Distributions::standard().unwrap();
    let mut index = ReferentialIndex::new();
    let gen = UserGenerator::new(stream_rng(Some(1), 0), dists.clone(), default_base_time(), &mut index);
    Batches::new(gen, users, 2000).for_each(drop);
    let gen = ArticleGenerator::new(
        stream_rng(Some(1), 1),
        dists,
        default_base_time(),
        articles,
        365,
        50,
        &mut index,
    );
    Batches::new(gen, articles, 1000).for_each(drop);
    index
}

/// Benchmark user generation throughput
fn bench_user_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("user_generation");
    let dists = Distributions::standard().unwrap();

    for size in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut index = ReferentialIndex::new();
                let gen = UserGenerator::new(stream_rng(Some(3), 0), dists.clone(), default_base_time(), &mut index);
                Batches::new(gen, size, 2000).map(|batch| batch.len()).sum::<usize>()
            });
        });
    }
    group.finish();
}

/// Benchmark read generation including rejected candidates
fn bench_read_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_generation");
    let index = Arc::new(populated_index(10_000, 10_000));

    for size in [10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let gen = ReadGenerator::new(
                    stream_rng(Some(5), 2),
                    default_base_time(),
                    10_000,
                    10_000,
                    size,
                    365,
                    Arc::clone(&index),
                );
                Batches::new(gen, size, 2000).map(|batch| batch.len()).sum::<usize>()
            });
        });
    }
    group.finish();
}

/// Benchmark building the inline INSERT IGNORE text for one read batch
fn bench_fast_path_statement(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_path_statement");
    let index = Arc::new(populated_index(1_000, 1_000));
    let gen = ReadGenerator::new(stream_rng(Some(9), 2), default_base_time(), 1_000, 1_000, 2_000, 365, index);
    let reads: Vec<Read> = Batches::new(gen, 2_000, 2_000).flatten().collect();

    for size in [500, 2_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| build_read_statement(&reads[..size]).map(|sql| sql.len()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_user_generation,
    bench_read_generation,
    bench_fast_path_statement
);
criterion_main!(benches);
