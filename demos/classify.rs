//! Classify points sampled around three cluster centres with a kNN classifier.

use knn_index::kdtree::KDTreeIndex;
use knn_index::knn::{KnnClassifierBuilder, KnnSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CENTRES: [(&str, [f64; 2]); 3] = [("north", [0., 5.]), ("east", [5., 0.]), ("west", [-5., 0.])];

fn sample(rng: &mut StdRng, centre: [f64; 2]) -> [f64; 2] {
    [
        centre[0] + rng.gen_range(-2.0..2.0),
        centre[1] + rng.gen_range(-2.0..2.0),
    ]
}

fn main() -> knn_index::Result<()> {
    let mut rng = StdRng::seed_from_u64(2024);

    let settings = KnnSettings::new(5)?
        .with_weight_by_distance(true)
        .with_class_probabilities(true);
    let mut builder = KnnClassifierBuilder::new(2, settings)?;

    for _ in 0..300 {
        let (class, centre) = CENTRES[rng.gen_range(0..CENTRES.len())];
        let [x, y] = sample(&mut rng, centre);
        builder.add_row(&[Some(x), Some(y)], class)?;
    }
    let classifier = builder.finish();
    println!(
        "Indexed {} training rows: {:?}",
        classifier.tree().size(),
        classifier.class_distribution()
    );

    let mut correct = 0;
    let rounds = 100;
    for _ in 0..rounds {
        let (class, centre) = CENTRES[rng.gen_range(0..CENTRES.len())];
        let [x, y] = sample(&mut rng, centre);
        if let Some(prediction) = classifier.classify(&[Some(x), Some(y)])? {
            if prediction.class == class {
                correct += 1;
            }
        }
    }
    println!("Accuracy: {correct}/{rounds}");

    if let Some(prediction) = classifier.classify(&[Some(0.), Some(0.)])? {
        println!("Origin is {} with {:?}", prediction.class, prediction.probabilities);
    }

    Ok(())
}
