use fleet_cluster::{ClusterOptions, Leaf, Supercluster};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// `n` points scattered around Denmark, the data of each leaf is its input position.
pub fn point_cloud(n: usize, seed: u64) -> Vec<Leaf<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| Leaf {
            lng: rng.random_range(7.0..13.0),
            lat: rng.random_range(54.5..58.0),
            data: i,
        })
        .collect()
}

pub fn index(n: usize, seed: u64) -> Supercluster<usize> {
    Supercluster::new(ClusterOptions::default(), point_cloud(n, seed)).unwrap()
}
