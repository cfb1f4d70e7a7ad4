use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use knn_index::kdtree::{KDTree, KDTreeBuilder, KDTreeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_coords(rng: &mut StdRng, num_items: usize, dims: usize) -> Vec<f64> {
    (0..num_items * dims).map(|_| rng.gen()).collect()
}

fn construct(coords: &[f64], dims: usize, bucket_size: usize) -> KDTree<f64, usize> {
    let mut builder = KDTreeBuilder::with_capacity(dims, coords.len() / dims)
        .unwrap()
        .with_bucket_size(bucket_size)
        .unwrap();
    for (i, point) in coords.chunks(dims).enumerate() {
        builder.add_pattern(point, i).unwrap();
    }
    builder.finish()
}

fn brute_force(coords: &[f64], dims: usize, query: &[f64], k: usize) -> Vec<usize> {
    let mut all: Vec<(f64, usize)> = coords
        .chunks(dims)
        .enumerate()
        .map(|(i, point)| {
            let d: f64 = point.iter().zip(query).map(|(a, b)| (a - b) * (a - b)).sum();
            (d, i)
        })
        .collect();
    all.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0));
    all.truncate(k);
    all.sort_by(|a, b| a.0.total_cmp(&b.0));
    all.into_iter().map(|(_, i)| i).collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let num_items = 100_000;

    for dims in [2, 4, 8] {
        let coords = random_coords(&mut rng, num_items, dims);
        let queries = random_coords(&mut rng, 100, dims);

        c.bench_with_input(BenchmarkId::new("construction", dims), &dims, |b, &dims| {
            b.iter(|| construct(&coords, dims, 10))
        });

        let tree = construct(&coords, dims, 10);

        for k in [1, 10] {
            c.bench_with_input(
                BenchmarkId::new(format!("k_nearest_neighbours (k={k})"), dims),
                &dims,
                |b, &dims| {
                    b.iter(|| {
                        for query in queries.chunks(dims) {
                            tree.k_nearest_neighbours(query, k).unwrap();
                        }
                    })
                },
            );
        }

        c.bench_with_input(BenchmarkId::new("brute force (k=10)", dims), &dims, |b, &dims| {
            b.iter(|| {
                for query in queries.chunks(dims).take(10) {
                    brute_force(&coords, dims, query, 10);
                }
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
