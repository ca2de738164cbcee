use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable context threaded through rank construction rather than a
/// process-global RNG, per spec.md §9's "Random tie-breaking" design note.
pub struct RankContext {
    rng: StdRng,
}

impl RankContext {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

/// Builds the rank permutation for one replicate's signal vector, per
/// spec.md §4.C: ascending signal order with a uniform random tie-break,
/// rank = index of each element in that order (so higher signal gets a
/// higher rank value).
fn build_rank_vector(signals: &[f64], ctx: &mut RankContext) -> Vec<usize> {
    let n = signals.len();
    let tie_breakers: Vec<f64> = (0..n).map(|_| ctx.rng.gen::<f64>()).collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        signals[a]
            .partial_cmp(&signals[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| tie_breakers[a].partial_cmp(&tie_breakers[b]).unwrap())
    });

    let mut rank = vec![0usize; n];
    for (r, &i) in order.iter().enumerate() {
        rank[i] = r;
    }
    rank
}

/// Builds both replicates' rank vectors for a merged-peak list, per
/// spec.md §4.C / §3's `RankVectors`.
pub fn build_rank_vectors(
    signals_1: &[f64],
    signals_2: &[f64],
    ctx: &mut RankContext,
) -> (Vec<usize>, Vec<usize>) {
    let r1 = build_rank_vector(signals_1, ctx);
    let r2 = build_rank_vector(signals_2, ctx);
    (r1, r2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rank_is_a_permutation_preserving_order() {
        let mut ctx = RankContext::from_seed(42);
        let signals = [3.0, 1.0, 2.0, 5.0, 4.0];
        let rank = build_rank_vector(&signals, &mut ctx);

        let unique: HashSet<usize> = rank.iter().cloned().collect();
        assert_eq!(unique.len(), signals.len());
        assert!(rank.iter().all(|&r| r < signals.len()));

        // signals[3] = 5.0 is the max, so it must have the highest rank.
        assert_eq!(rank[3], 4);
        // signals[1] = 1.0 is the min, so it must have rank 0.
        assert_eq!(rank[1], 0);
    }

    #[test]
    fn tie_breaking_is_reproducible_given_a_seed() {
        // S6 from spec.md §8
        let signals = vec![1.0; 100];
        let mut ctx_a = RankContext::from_seed(7);
        let mut ctx_b = RankContext::from_seed(7);
        let rank_a = build_rank_vector(&signals, &mut ctx_a);
        let rank_b = build_rank_vector(&signals, &mut ctx_b);
        assert_eq!(rank_a, rank_b);
    }

    #[test]
    fn ties_are_broken_uniformly_not_by_input_order() {
        let signals = vec![1.0; 50];
        let mut ctx = RankContext::from_seed(1);
        let rank = build_rank_vector(&signals, &mut ctx);
        assert_ne!(rank, (0..50).collect::<Vec<_>>());
    }
}
