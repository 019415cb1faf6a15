use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::Rng;
use reelframe::{
    AggregateOp, CsvReader, Frame, FrameBuilder, JoinKind, QueryCache, group_by, join, order_by,
};
use std::fmt::Write;
use std::rc::Rc;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const MOVIES: usize = 5_000;
const RATINGS: usize = 500_000;

fn movies_csv() -> String {
    let mut out = String::from("movieId,title,genres\n");
    for id in 1..=MOVIES {
        writeln!(out, "{id},\"Movie {id}, The ({})\",Drama|Comedy", 1950 + id % 70).unwrap();
    }
    out
}

fn ratings_csv() -> String {
    let mut rng = rand::rng();
    let mut out = String::from("userId,movieId,rating,timestamp\n");
    for _ in 0..RATINGS {
        let user = rng.random_range(1..2_000);
        let movie = rng.random_range(1..=MOVIES);
        let rating = f64::from(rng.random_range(1..=10_u8)) / 2.0;
        writeln!(out, "{user},{movie},{rating:.1},964982703").unwrap();
    }
    out
}

fn build(text: &str, extract_year: bool) -> Frame {
    let table = CsvReader::new().parse_str(text);
    FrameBuilder::new()
        .extract_year(extract_year)
        .build_table(&table)
        .unwrap()
}

fn operators(c: &mut Criterion) {
    let movies_text = movies_csv();
    let ratings_text = ratings_csv();
    let movies = Rc::new(build(&movies_text, true));
    let ratings = Rc::new(build(&ratings_text, false));

    let mut group = c.benchmark_group("reelframe");
    group.sample_size(10);
    group.throughput(Throughput::Elements(RATINGS as u64));

    group.bench_function("load_ratings", |b| {
        b.iter(|| build(&ratings_text, false));
    });

    group.bench_function("group_by_movie_avg", |b| {
        b.iter(|| group_by(&ratings, &["movieId"], &["rating"], AggregateOp::Avg).unwrap());
    });

    group.bench_function("group_by_movie_avg_cached", |b| {
        let cache = Rc::new(QueryCache::new());
        b.iter(|| {
            ratings
                .query_with_cache(&cache)
                .group_by(&["movieId"])
                .aggregate("rating", AggregateOp::Avg)
                .execute()
                .unwrap()
        });
    });

    group.bench_function("join_movies_ratings", |b| {
        b.iter(|| join(&movies, &ratings, &["movieId"], JoinKind::Inner).unwrap());
    });

    group.bench_function("order_by_rating", |b| {
        b.iter(|| order_by(&ratings, "rating", true, Some(100)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, operators);
criterion_main!(benches);
