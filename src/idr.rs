use crate::em::ModelParams;
use crate::errs::IdrError;
use crate::pseudovalue::compute_pseudo_values;

/// Local and global IDR values aligned with the merged-peak sequence,
/// spec.md §3's `IDRResult`.
pub struct IdrResult {
    pub local_idr: Vec<f64>,
    pub global_idr: Vec<f64>,
}

/// Computes local and global IDR from converged model parameters and rank
/// vectors, per spec.md §4.G.
///
/// `filter_below_noise_mean` implements the optional step 2: peaks whose
/// pseudo-values sum below zero (i.e. below the noise component's mean) are
/// treated as definitively irreproducible.
pub fn calc_idr(
    theta: &ModelParams,
    r1: &[usize],
    r2: &[usize],
    posterior_membership: impl Fn(&[f64], &[f64], &ModelParams) -> Vec<f64>,
    filter_below_noise_mean: bool,
) -> Result<IdrResult, IdrError> {
    let z1 = compute_pseudo_values(r1, theta)?;
    let z2 = compute_pseudo_values(r2, theta)?;
    let w = posterior_membership(&z1, &z2, theta);

    let mut local_idr: Vec<f64> = w.iter().map(|&wi| 1.0 - wi).collect();
    if filter_below_noise_mean {
        for (i, l) in local_idr.iter_mut().enumerate() {
            if z1[i] + z2[i] < 0.0 {
                *l = 1.0;
            }
        }
    }

    let global_idr = assemble_global_idr(&local_idr);
    Ok(IdrResult { local_idr, global_idr })
}

/// Given local IDR values, computes the global IDR by sorting ascending,
/// max-tie-breaking the rank, and taking the cumulative mean of the
/// ascending-ordered local IDRs up to each element's rank, then scattering
/// back to the original order. spec.md §4.G steps 3-5.
pub fn assemble_global_idr(local_idr: &[f64]) -> Vec<f64> {
    let n = local_idr.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        local_idr[a].partial_cmp(&local_idr[b]).unwrap_or(std::cmp::Ordering::Equal)
    });

    let ordered: Vec<f64> = order.iter().map(|&i| local_idr[i]).collect();

    // max tie-breaking: equal values share the largest position among the
    // tied group (1-indexed rank), matching R's `rank(x, ties.method =
    // "max")`.
    let mut max_rank = vec![0usize; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && ordered[j + 1] == ordered[i] {
            j += 1;
        }
        for k in i..=j {
            max_rank[k] = j + 1; // 1-indexed, shared by the whole tie group
        }
        i = j + 1;
    }

    // prefix sums over the ascending-ordered values give each rank's
    // cumulative mean in O(n) rather than O(n^2).
    let mut prefix_sum = vec![0.0f64; n + 1];
    for (idx, &v) in ordered.iter().enumerate() {
        prefix_sum[idx + 1] = prefix_sum[idx] + v;
    }

    let cumulative_mean: Vec<f64> = max_rank
        .iter()
        .map(|&rank| prefix_sum[rank] / rank as f64)
        .collect();

    let mut global_idr = vec![0.0f64; n];
    for (pos, &orig_idx) in order.iter().enumerate() {
        global_idr[orig_idx] = cumulative_mean[pos];
    }
    global_idr
}
