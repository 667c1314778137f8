//! Benchmarks for the offline model build
//!
//! Run with: cargo bench --package similarity
//!
//! Uses a synthetic catalog so the benchmark does not need the dataset.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Catalog, CatalogItem};
use similarity::{RowIndex, SimilarityMatrix, TagEncoder};

const GENRES: &[&str] = &[
    "Action", "Adventure", "Animation", "Children", "Comedy", "Crime", "Documentary", "Drama",
    "Fantasy", "Film-Noir", "Horror", "Musical", "Mystery", "Romance", "Sci-Fi", "Thriller",
    "War", "Western",
];

fn synthetic_catalog(n: usize) -> Catalog {
    let items = (0..n)
        .map(|i| CatalogItem {
            id: i as u32 + 1,
            title: format!("Movie {i}"),
            // 1-3 genres picked deterministically from the index
            tags: (0..(i % 3 + 1))
                .map(|k| GENRES[(i * 7 + k * 5) % GENRES.len()].to_string())
                .collect(),
        })
        .collect();
    Catalog::from_items(items).expect("Failed to build synthetic catalog")
}

fn bench_encode(c: &mut Criterion) {
    let catalog = synthetic_catalog(2_000);
    let encoder = TagEncoder::new();

    c.bench_function("encode_2000", |b| {
        b.iter(|| black_box(encoder.fit_transform(black_box(&catalog))))
    });
}

fn bench_build_matrix(c: &mut Criterion) {
    let catalog = synthetic_catalog(2_000);
    let (features, _) = TagEncoder::new().fit_transform(&catalog);
    let rows = RowIndex::from_catalog(&catalog);

    c.bench_function("similarity_matrix_2000", |b| {
        b.iter(|| {
            let matrix = SimilarityMatrix::build(black_box(&features), rows.clone()).unwrap();
            black_box(matrix)
        })
    });
}

criterion_group!(benches, bench_encode, bench_build_matrix);
criterion_main!(benches);
