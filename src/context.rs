use crate::cli::{Cli, DEFAULT_IDR_THRESH, DEFAULT_SOFT_IDR_THRESH};
use crate::rank::RankContext;

/// Everything the merger/EM/writer stages need that would otherwise be a
/// module-level global: the rank tie-break seed and the two IDR
/// thresholds, resolved once from the parsed CLI and threaded through
/// explicitly from there. Mirrors `motifs/args.rs`'s habit of bundling
/// related CLI-derived fields into one struct rather than passing each
/// `Cli` field independently down the call chain.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub random_seed: Option<u64>,
    pub idr_threshold: f64,
    pub soft_idr_threshold: f64,
}

impl RunContext {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            random_seed: cli.random_seed,
            idr_threshold: cli.idr_threshold,
            soft_idr_threshold: cli
                .soft_idr_threshold
                .unwrap_or(DEFAULT_SOFT_IDR_THRESH),
        }
    }

    /// A context that retains every peak regardless of `--idr-threshold`,
    /// for the `--only-merge-peaks` and insufficient-data paths where no
    /// IDR was ever computed.
    pub fn retain_all(&self) -> Self {
        Self { idr_threshold: DEFAULT_IDR_THRESH, ..*self }
    }

    /// Builds the seedable generator the rank builder threads through
    /// instead of a process-global one, per spec.md's "reproducible from a
    /// documented seed" requirement.
    pub fn rank_context(&self) -> RankContext {
        match self.random_seed {
            Some(seed) => RankContext::from_seed(seed),
            None => RankContext::from_entropy(),
        }
    }
}
