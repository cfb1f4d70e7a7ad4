use rand::Rng;
use rstest::rstest;

use crate::kdtree::KDTreeIndex;
use crate::test::brute_force::{random_query, seeded_rng, Patterns};

#[rstest]
#[case(1, 50, 1)]
#[case(2, 500, 4)]
#[case(3, 1000, 10)]
#[case(5, 800, 16)]
#[case(10, 300, 7)]
fn k_nearest_matches_brute_force(
    #[case] dims: usize,
    #[case] num_items: usize,
    #[case] bucket_size: usize,
) {
    let mut rng = seeded_rng(dims as u64 * 7919 + num_items as u64);
    let patterns = Patterns::random(&mut rng, num_items, dims);
    let tree = patterns.tree(bucket_size);

    for _ in 0..50 {
        let query = random_query(&mut rng, dims);
        let k = rng.gen_range(1..=20usize.min(num_items));

        let result = tree.k_nearest_neighbours(&query, k).unwrap();
        assert_eq!(result.len(), k);
        assert!(result.windows(2).all(|w| w[0].distance <= w[1].distance));

        let expected = patterns.scan(&query);

        // random data is tie-free, so ids must match in order
        let ids: Vec<usize> = result.iter().map(|n| *n.value).collect();
        let expected_ids: Vec<usize> = expected.iter().take(k).map(|(_, id)| *id).collect();
        assert_eq!(ids, expected_ids);

        for (found, (distance, _)) in result.iter().zip(&expected) {
            assert!((found.distance - distance).abs() < 1e-12);
        }
    }
}

#[rstest]
fn nearest_one_is_argmin(#[values(1, 2, 4)] dims: usize, #[values(1, 3, 32)] bucket_size: usize) {
    let mut rng = seeded_rng(42 + dims as u64);
    let patterns = Patterns::random(&mut rng, 400, dims);
    let tree = patterns.tree(bucket_size);

    for _ in 0..100 {
        let query = random_query(&mut rng, dims);
        let result = tree.k_nearest_neighbours(&query, 1).unwrap();
        assert_eq!(*result[0].value, patterns.scan(&query)[0].1);
    }
}

#[rstest]
#[case(2, 10)]
#[case(3, 1)]
fn k_equal_to_size_returns_everything(#[case] dims: usize, #[case] bucket_size: usize) {
    let mut rng = seeded_rng(7);
    let patterns = Patterns::random(&mut rng, 64, dims);
    let tree = patterns.tree(bucket_size);

    let query = random_query(&mut rng, dims);
    let result = tree.k_nearest_neighbours(&query, 64).unwrap();
    let ids: Vec<usize> = result.iter().map(|n| *n.value).collect();
    let expected: Vec<usize> = patterns.scan(&query).iter().map(|(_, id)| *id).collect();
    assert_eq!(ids, expected);
}

#[rstest]
fn within_matches_brute_force(#[values(2, 3, 6)] dims: usize) {
    let mut rng = seeded_rng(1234 + dims as u64);
    let patterns = Patterns::random(&mut rng, 600, dims);
    let tree = patterns.tree(8);

    for _ in 0..30 {
        let query = random_query(&mut rng, dims);
        let radius = rng.gen_range(0.0..0.6);

        let ids: Vec<usize> = tree
            .within(&query, radius)
            .unwrap()
            .iter()
            .map(|n| *n.value)
            .collect();
        let expected: Vec<usize> = patterns
            .scan(&query)
            .into_iter()
            .take_while(|(distance, _)| *distance <= radius)
            .map(|(_, id)| id)
            .collect();
        assert_eq!(ids, expected);
    }
}

#[rstest]
fn range_matches_brute_force(#[values(2, 4)] dims: usize) {
    let mut rng = seeded_rng(99 + dims as u64);
    let patterns = Patterns::random(&mut rng, 500, dims);
    let tree = patterns.tree(6);

    for _ in 0..30 {
        let a = random_query(&mut rng, dims);
        let b = random_query(&mut rng, dims);
        let min: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x.min(*y)).collect();
        let max: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x.max(*y)).collect();

        let mut ids = tree.range(&min, &max).unwrap();
        ids.sort_unstable();

        let expected: Vec<u32> = (0..patterns.len())
            .filter(|&id| {
                patterns
                    .get(id)
                    .iter()
                    .zip(min.iter().zip(&max))
                    .all(|(c, (lo, hi))| c >= lo && c <= hi)
            })
            .map(|id| id as u32)
            .collect();
        assert_eq!(ids, expected);
    }
}

/// The share of tested patterns should shrink with fewer dimensions and more patterns.
#[test]
fn pruning_improves_with_size_and_lower_dimensionality() {
    fn tested_fraction(dims: usize, num_items: usize) -> f64 {
        let mut rng = seeded_rng(5);
        let patterns = Patterns::random(&mut rng, num_items, dims);
        let tree = patterns.tree(10);

        let mut tested = 0;
        let rounds = 200;
        for _ in 0..rounds {
            let query: Vec<f64> = (0..dims).map(|_| rng.gen()).collect();
            let (_, stats) = tree.k_nearest_neighbours_with_stats(&query, 5).unwrap();
            tested += stats.tested_patterns;
        }
        tested as f64 / (rounds * num_items) as f64
    }

    let small_low = tested_fraction(2, 1_000);
    let large_low = tested_fraction(2, 20_000);
    let large_high = tested_fraction(8, 20_000);

    assert!(large_low < small_low);
    assert!(large_low < large_high);
    assert!(large_low < 0.05);
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_batch_matches_sequential() {
    let mut rng = seeded_rng(77);
    let patterns = Patterns::random(&mut rng, 2_000, 3);
    let tree = patterns.tree(10);
    let queries: Vec<Vec<f64>> = (0..64).map(|_| random_query(&mut rng, 3)).collect();

    let batch = tree.par_k_nearest_neighbours(&queries, 5).unwrap();
    for (query, result) in queries.iter().zip(batch) {
        assert_eq!(result, tree.k_nearest_neighbours(query, 5).unwrap());
    }
}
