use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Create the generator used by one partitioning run.
///
/// A fixed seed makes the whole run reproducible.
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy()
    }
}

/// A cheap, bounded-cost permutation of `0..n`.
///
/// Small inputs (`n < 10`) get one random swap per slot. Larger inputs get
/// `num_shuffles` rounds, each swapping two runs of four consecutive slots
/// starting at random offsets. The result is not uniformly distributed.
pub fn chunked_permutation<R: Rng + ?Sized>(n: usize, num_shuffles: usize, rng: &mut R) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..n).collect();

    if n < 10 {
        for slot in 0..n {
            let other = rng.gen_range(0..n);
            permutation.swap(slot, other);
        }
    } else {
        for _ in 0..num_shuffles {
            let first = rng.gen_range(0..n - 3);
            let second = rng.gen_range(0..n - 3);
            for offset in 0..4 {
                permutation.swap(first + offset, second + offset);
            }
        }
    }

    permutation
}
