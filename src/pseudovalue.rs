use rayon::prelude::*;

use crate::em::ModelParams;
use crate::errs::IdrError;
use crate::numeric::std_normal_cdf;

const DEFAULT_EPS: f64 = 1e-12;
const MAX_BRACKET_EXPANSIONS: u32 = 64;
const MAX_BISECTIONS: u32 = 200;

/// The mixture marginal cdf `G(z;θ) = π·Φ((z-μ)/σ) + (1-π)·Φ(z)`, spec.md
/// §4.E. Strictly increasing in `z` since it's a convex combination of two
/// strictly increasing cdfs.
pub fn mixture_marginal_cdf(z: f64, theta: &ModelParams) -> f64 {
    theta.pi * std_normal_cdf((z - theta.mu) / theta.sigma)
        + (1.0 - theta.pi) * std_normal_cdf(z)
}

/// Finds the unique root of `G(z;θ) = u` by expanding a bracket around 0
/// until the endpoints disagree in sign, then bisecting to `EPS`
/// precision. spec.md §9 explicitly calls for adaptive bracket expansion
/// here rather than the reference implementation's fixed bracket, which can
/// fail to contain the root for extreme θ.
pub fn solve_pseudo_value(u: f64, theta: &ModelParams) -> Result<f64, IdrError> {
    solve_pseudo_value_with_eps(u, theta, DEFAULT_EPS)
}

pub fn solve_pseudo_value_with_eps(
    u: f64,
    theta: &ModelParams,
    eps: f64,
) -> Result<f64, IdrError> {
    let mut half_width = 1.0;
    let (mut lo, mut hi) = (-half_width, half_width);
    let mut f_lo = mixture_marginal_cdf(lo, theta) - u;
    let mut f_hi = mixture_marginal_cdf(hi, theta) - u;

    let mut expansions = 0;
    while f_lo.signum() == f_hi.signum() {
        if expansions >= MAX_BRACKET_EXPANSIONS {
            return Err(IdrError::BracketFailure { u });
        }
        half_width *= 2.0;
        lo = -half_width;
        hi = half_width;
        f_lo = mixture_marginal_cdf(lo, theta) - u;
        f_hi = mixture_marginal_cdf(hi, theta) - u;
        expansions += 1;
    }

    // f_lo and f_hi disagree in sign (or one is exactly zero already).
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }

    let mut iterations = 0;
    loop {
        let mid = 0.5 * (lo + hi);
        let f_mid = mixture_marginal_cdf(mid, theta) - u;
        if f_mid.abs() < eps || (hi - lo) < eps {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
        iterations += 1;
        if iterations >= MAX_BISECTIONS {
            return Ok(mid);
        }
    }
}

/// Vectorized contract from spec.md §4.E: given a rank vector of length
/// `N`, produce a pseudo-value vector `z_k[i] = F^{-1}((r_k[i]+1)/(N+1) |
/// θ)` of the same length. Each element's root-find is independent of
/// every other, so this is run across `rayon`'s global pool; the result is
/// identical to the sequential version since order is preserved by
/// `collect`.
pub fn compute_pseudo_values(
    ranks: &[usize],
    theta: &ModelParams,
) -> Result<Vec<f64>, IdrError> {
    let n = ranks.len() as f64;
    ranks
        .par_iter()
        .map(|&r| {
            let u = (r as f64 + 1.0) / (n + 1.0);
            solve_pseudo_value(u, theta)
        })
        .collect()
}
