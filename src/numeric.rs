use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use std::sync::OnceLock;

/// Standard normal distribution, cached: spec.md §4.D requires pdf/cdf/
/// inverse-cdf for a fixed N(0,1), and `statrs::distribution::Normal`
/// construction is cheap but there's no reason to repeat it per call.
fn standard_normal() -> &'static Normal {
    static STD_NORMAL: OnceLock<Normal> = OnceLock::new();
    STD_NORMAL.get_or_init(|| Normal::new(0.0, 1.0).expect("N(0,1) is valid"))
}

/// Standard-normal pdf `φ(x)`.
pub fn std_normal_pdf(x: f64) -> f64 {
    standard_normal().pdf(x)
}

/// Standard-normal cdf `Φ(x)`.
pub fn std_normal_cdf(x: f64) -> f64 {
    standard_normal().cdf(x)
}

/// Standard-normal inverse cdf `Φ^{-1}(p)`, accurate to statrs's internal
/// precision (well past the 8-digit floor spec.md §4.D requires) across
/// `p ∈ (1e-12, 1-1e-12)`.
pub fn std_normal_inv_cdf(p: f64) -> f64 {
    standard_normal().inverse_cdf(p.clamp(1e-15, 1.0 - 1e-15))
}

/// Bivariate normal pdf with mean `(mu1, mu2)`, common variance `sigma^2`
/// on both axes, and correlation `rho`. Not provided by `statrs`, so
/// implemented directly from the closed form (spec.md §4.D).
pub fn bivariate_normal_pdf(
    x: f64,
    y: f64,
    mu1: f64,
    mu2: f64,
    sigma: f64,
    rho: f64,
) -> f64 {
    let dx = (x - mu1) / sigma;
    let dy = (y - mu2) / sigma;
    let one_minus_rho2 = 1.0 - rho * rho;
    let z = dx * dx - 2.0 * rho * dx * dy + dy * dy;
    let denom =
        2.0 * std::f64::consts::PI * sigma * sigma * one_minus_rho2.sqrt();
    (-z / (2.0 * one_minus_rho2)).exp() / denom
}

/// Log of the bivariate normal pdf, used directly inside the mixture
/// log-likelihood so the E-step never has to exponentiate and re-log.
pub fn bivariate_normal_log_pdf(
    x: f64,
    y: f64,
    mu1: f64,
    mu2: f64,
    sigma: f64,
    rho: f64,
) -> f64 {
    let dx = (x - mu1) / sigma;
    let dy = (y - mu2) / sigma;
    let one_minus_rho2 = 1.0 - rho * rho;
    let z = dx * dx - 2.0 * rho * dx * dy + dy * dy;
    -z / (2.0 * one_minus_rho2)
        - (2.0 * std::f64::consts::PI * sigma * sigma * one_minus_rho2.sqrt())
            .ln()
}

/// Numerically stable `ln(sum(exp(xs)))`, used when combining the two
/// mixture components' log-likelihoods (spec.md §4.D).
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}
