use log::warn;

use crate::errs::{IdrError, IdrWarning};
use crate::numeric::{bivariate_normal_log_pdf, log_sum_exp};
use crate::pseudovalue::compute_pseudo_values;

const SIGMA_MIN: f64 = 1e-4;
const RHO_MAX_ABS: f64 = 1.0 - 1e-6;
const PI_MIN: f64 = 1e-6;
const PI_MAX: f64 = 1.0 - 1e-6;

pub const DEFAULT_MU: f64 = 0.1;
pub const DEFAULT_SIGMA: f64 = 1.0;
pub const DEFAULT_RHO: f64 = 0.2;
pub const DEFAULT_MIX_PARAM: f64 = 0.5;
pub const MAX_ITER_DEFAULT: usize = 100;
pub const CONVERGENCE_EPS_DEFAULT: f64 = 1e-6;

/// The two-component Gaussian copula mixture's parameters, spec.md §3.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ModelParams {
    pub mu: f64,
    pub sigma: f64,
    pub rho: f64,
    pub pi: f64,
}

impl ModelParams {
    pub fn starting_point() -> Self {
        Self {
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
            rho: DEFAULT_RHO,
            pi: DEFAULT_MIX_PARAM,
        }
    }

    /// Clamps parameters into the degenerate-avoiding ranges from spec.md
    /// §4.F ("Degeneracy guards").
    fn clamped(self) -> Self {
        Self {
            mu: self.mu,
            sigma: self.sigma.max(SIGMA_MIN),
            rho: self.rho.clamp(-RHO_MAX_ABS, RHO_MAX_ABS),
            pi: self.pi.clamp(PI_MIN, PI_MAX),
        }
    }

    fn max_abs_diff(&self, other: &Self) -> f64 {
        [
            (self.mu - other.mu).abs(),
            (self.sigma - other.sigma).abs(),
            (self.rho - other.rho).abs(),
            (self.pi - other.pi).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }

    fn is_finite(&self) -> bool {
        self.mu.is_finite()
            && self.sigma.is_finite()
            && self.rho.is_finite()
            && self.pi.is_finite()
    }
}

/// Which starting parameters are pinned rather than updated by the M-step,
/// per spec.md §4.F's `fix_mu`/`fix_sigma` flags.
#[derive(Debug, Copy, Clone, Default)]
pub struct FixedFlags {
    pub fix_mu: bool,
    pub fix_sigma: bool,
}

/// E-step: posterior membership probability that element `i` belongs to
/// the reproducible ("signal") component, per spec.md §4.F.
pub fn posterior_membership(z1: &[f64], z2: &[f64], theta: &ModelParams) -> Vec<f64> {
    z1.iter()
        .zip(z2.iter())
        .map(|(&a, &b)| {
            let log_f1 = bivariate_normal_log_pdf(
                a, b, theta.mu, theta.mu, theta.sigma, theta.rho,
            );
            let log_f0 = bivariate_normal_log_pdf(a, b, 0.0, 0.0, 1.0, 0.0);
            let log_num = theta.pi.ln() + log_f1;
            let log_denom = log_sum_exp(&[
                theta.pi.ln() + log_f1,
                (1.0 - theta.pi).ln() + log_f0,
            ]);
            (log_num - log_denom).exp()
        })
        .collect()
}

/// M-step: closed-form weighted MLE update in `(z1, z2)` pseudo-value
/// space, per spec.md §4.F.
fn m_step(
    z1: &[f64],
    z2: &[f64],
    weights: &[f64],
    starting: &ModelParams,
    fixed: FixedFlags,
) -> ModelParams {
    let sum_w: f64 = weights.iter().sum();

    let mu = if fixed.fix_mu {
        starting.mu
    } else {
        let num: f64 = weights
            .iter()
            .zip(z1.iter().zip(z2.iter()))
            .map(|(&w, (&a, &b))| w * (a + b))
            .sum();
        num / (2.0 * sum_w)
    };

    let sigma = if fixed.fix_sigma {
        starting.sigma
    } else {
        let num: f64 = weights
            .iter()
            .zip(z1.iter().zip(z2.iter()))
            .map(|(&w, (&a, &b))| {
                w * ((a - mu).powi(2) + (b - mu).powi(2))
            })
            .sum();
        (num / (2.0 * sum_w)).sqrt()
    };

    let rho = {
        let num: f64 = weights
            .iter()
            .zip(z1.iter().zip(z2.iter()))
            .map(|(&w, (&a, &b))| w * (a - mu) * (b - mu))
            .sum();
        num / (sigma * sigma * sum_w)
    };

    let pi = sum_w / weights.len() as f64;

    ModelParams { mu, sigma, rho, pi }.clamped()
}

/// The outer pseudo-value/EM loop, modeled as a pure function with no
/// shared mutable state (spec.md §9's "EM outer loop as coroutine-free
/// iteration"): `(θ, r1, r2, fixed_flags) -> (θ', loss, iterations)`.
pub struct EmResult {
    pub theta: ModelParams,
    pub z1: Vec<f64>,
    pub z2: Vec<f64>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
}

fn mixture_log_likelihood(z1: &[f64], z2: &[f64], theta: &ModelParams) -> f64 {
    z1.iter()
        .zip(z2.iter())
        .map(|(&a, &b)| {
            let log_f1 = bivariate_normal_log_pdf(
                a, b, theta.mu, theta.mu, theta.sigma, theta.rho,
            );
            let log_f0 = bivariate_normal_log_pdf(a, b, 0.0, 0.0, 1.0, 0.0);
            log_sum_exp(&[
                theta.pi.ln() + log_f1,
                (1.0 - theta.pi).ln() + log_f0,
            ])
        })
        .sum()
}

pub fn estimate_model_params(
    r1: &[usize],
    r2: &[usize],
    starting_point: ModelParams,
    max_iter: usize,
    convergence_eps: f64,
    fixed: FixedFlags,
) -> Result<EmResult, IdrError> {
    let mut theta = starting_point.clamped();
    let mut z1 = compute_pseudo_values(r1, &theta)?;
    let mut z2 = compute_pseudo_values(r2, &theta)?;
    let mut prev_log_likelihood = mixture_log_likelihood(&z1, &z2, &theta);
    if !prev_log_likelihood.is_finite() {
        return Err(IdrError::NonFiniteLikelihood);
    }

    let mut converged = false;
    let mut iterations = 0;
    for _ in 0..max_iter {
        iterations += 1;

        let weights = posterior_membership(&z1, &z2, &theta);
        let next_theta = m_step(&z1, &z2, &weights, &starting_point, fixed);
        if !next_theta.is_finite() {
            return Err(IdrError::NonFiniteParams(format!("{next_theta:?}")));
        }

        z1 = compute_pseudo_values(r1, &next_theta)?;
        z2 = compute_pseudo_values(r2, &next_theta)?;

        let log_likelihood = mixture_log_likelihood(&z1, &z2, &next_theta);
        if !log_likelihood.is_finite() {
            return Err(IdrError::NonFiniteLikelihood);
        }
        if log_likelihood < prev_log_likelihood - 1e-4 {
            warn!(
                "{}",
                IdrWarning::LikelihoodDecreased {
                    from: prev_log_likelihood,
                    to: log_likelihood
                }
            );
        }

        let delta = theta.max_abs_diff(&next_theta);
        theta = next_theta;
        prev_log_likelihood = log_likelihood;

        if delta < convergence_eps {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!("{}", IdrWarning::EmNonConvergence { iterations });
    }

    Ok(EmResult {
        theta,
        z1,
        z2,
        log_likelihood: prev_log_likelihood,
        iterations,
        converged,
    })
}
