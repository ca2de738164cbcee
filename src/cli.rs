use std::fs::File;
use std::io::BufWriter;

use clap::{Args, ValueEnum};
use log::{info, warn};

use crate::em::{
    estimate_model_params, posterior_membership, FixedFlags, ModelParams,
    CONVERGENCE_EPS_DEFAULT, DEFAULT_MIX_PARAM, DEFAULT_MU, DEFAULT_RHO,
    DEFAULT_SIGMA, MAX_ITER_DEFAULT,
};
use crate::context::RunContext;
use crate::errs::IdrError;
use crate::idr::calc_idr;
use crate::loader::{load_peaks, InputFileType};
use crate::merge::{merge_peaks, PeakMergeMethod};
use crate::rank::build_rank_vectors;
use crate::writer::{merge_only_results, IdrResultWriter, MergedPeakResult};

pub const MIN_MERGED_PEAKS: usize = 20;
pub const DEFAULT_IDR_THRESH: f64 = 1.0;
pub const DEFAULT_SOFT_IDR_THRESH: f64 = 0.05;

/// `--peak-merge-method` choices, matching spec.md §6's CLI-facing spelling
/// (`avg` rather than `mean`) on top of the internal [`PeakMergeMethod`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum PeakMergeMethodArg {
    Sum,
    Avg,
    Min,
    Max,
}

impl From<PeakMergeMethodArg> for PeakMergeMethod {
    fn from(value: PeakMergeMethodArg) -> Self {
        match value {
            PeakMergeMethodArg::Sum => PeakMergeMethod::Sum,
            PeakMergeMethodArg::Avg => PeakMergeMethod::Mean,
            PeakMergeMethodArg::Min => PeakMergeMethod::Min,
            PeakMergeMethodArg::Max => PeakMergeMethod::Max,
        }
    }
}

/// CLI surface for the `idrs` binary, arg-for-arg matching spec.md §6.
/// Grouped with `#[clap(help_heading = ...)]`, following
/// `dmr/subcommands.rs`'s `PairwiseDmr` convention of grouping "Sample
/// Options" separately from "Segmentation Options".
#[derive(Args, Debug)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Files containing peaks and scores. Exactly two are required.
    #[clap(help_heading = "Input Options")]
    #[arg(long = "samples", short = 's', num_args = 2)]
    pub samples: Vec<String>,

    /// If provided, all peaks are taken from this oracle file instead of
    /// the union of the replicates.
    #[clap(help_heading = "Input Options")]
    #[arg(long = "peak-list", short = 'p')]
    pub peak_list: Option<String>,

    /// File type of --samples and --peak-list.
    #[clap(help_heading = "Input Options")]
    #[arg(long = "input-file-type", default_value = "narrowPeak")]
    pub input_file_type: InputFileType,

    /// Which column to use to rank peaks. Options: score, signal.value,
    /// p.value, q.value, or (bed only) a column index.
    #[clap(help_heading = "Input Options")]
    #[arg(long = "rank")]
    pub rank: Option<String>,

    /// Seed the tie-breaking random generator for reproducible rank
    /// vectors across runs. Omit for a fresh, non-reproducible seed.
    #[clap(help_heading = "Input Options")]
    #[arg(long = "random-seed")]
    pub random_seed: Option<u64>,

    /// File to write output to.
    #[clap(help_heading = "Output Options")]
    #[arg(long = "output-file", short = 'o', default_value = "idrValues.txt")]
    pub output_file: String,

    /// File to write diagnostic log output to.
    #[clap(help_heading = "Output Options")]
    #[arg(long = "log-output-file", short = 'l')]
    pub log_output_file: Option<String>,

    /// Only return peaks with a global IDR below this value.
    #[clap(help_heading = "Output Options")]
    #[arg(
        long = "idr-threshold",
        short = 'i',
        allow_hyphen_values = true,
        default_value_t = DEFAULT_IDR_THRESH
    )]
    pub idr_threshold: f64,

    /// Report statistics for peaks with a global IDR below this value, but
    /// return all peaks passing --idr-threshold regardless.
    #[clap(help_heading = "Output Options")]
    #[arg(long = "soft-idr-threshold")]
    pub soft_idr_threshold: Option<f64>,

    /// Use peaks without an overlapping match in the other replicate and
    /// set the missing replicate's aggregated signal to 0.
    #[clap(help_heading = "Merging Options")]
    #[arg(long = "use-nonoverlapping-peaks", default_value_t = false)]
    pub use_nonoverlapping_peaks: bool,

    /// Which method to use for merging overlapping peaks within a
    /// replicate. Default: sum for score/signal-value, avg for p/q-value.
    #[clap(help_heading = "Merging Options")]
    #[arg(long = "peak-merge-method")]
    pub peak_merge_method: Option<PeakMergeMethodArg>,

    /// Initial value of mu.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "initial-mu", default_value_t = DEFAULT_MU)]
    pub initial_mu: f64,

    /// Initial value of sigma.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "initial-sigma", default_value_t = DEFAULT_SIGMA)]
    pub initial_sigma: f64,

    /// Initial value of rho.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "initial-rho", default_value_t = DEFAULT_RHO)]
    pub initial_rho: f64,

    /// Initial value of the mixture parameter.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "initial-mix-param", default_value_t = DEFAULT_MIX_PARAM)]
    pub initial_mix_param: f64,

    /// Fix mu to the starting point and do not let it vary.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "fix-mu", default_value_t = false)]
    pub fix_mu: bool,

    /// Fix sigma to the starting point and do not let it vary.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "fix-sigma", default_value_t = false)]
    pub fix_sigma: bool,

    /// Maximum number of optimization iterations.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "max-iter", default_value_t = MAX_ITER_DEFAULT)]
    pub max_iter: usize,

    /// Maximum change in parameter values for convergence.
    #[clap(help_heading = "Model Fitting Options")]
    #[arg(long = "convergence-eps", default_value_t = CONVERGENCE_EPS_DEFAULT)]
    pub convergence_eps: f64,

    /// Only return the merged peak list; skip model fitting entirely.
    #[clap(help_heading = "Output Options")]
    #[arg(long = "only-merge-peaks", default_value_t = false)]
    pub only_merge_peaks: bool,

    /// Print out additional debug information.
    #[clap(help_heading = "Logging Options")]
    #[arg(long = "verbose", default_value_t = false, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Don't print any status messages.
    #[clap(help_heading = "Logging Options")]
    #[arg(long = "quiet", default_value_t = false)]
    pub quiet: bool,

    /// Plot the results. Best-effort: no-op other than a warning, per the
    /// reference implementation's own incomplete plotting support.
    #[clap(help_heading = "Output Options")]
    #[arg(long = "plot", default_value_t = false)]
    pub plot: bool,
}

fn resolve_peak_merge_method(
    cli: &Cli,
    signal_index: usize,
) -> PeakMergeMethod {
    cli.peak_merge_method
        .map(PeakMergeMethod::from)
        .unwrap_or_else(|| PeakMergeMethod::default_for_signal_index(signal_index))
}

pub fn run(cli: Cli) -> Result<(), IdrError> {
    if cli.samples.len() != 2 {
        return Err(IdrError::MalformedRecord {
            path: "--samples".to_string(),
            line: 0,
            message: "exactly two sample files are required".to_string(),
        });
    }

    let signal_index = cli.input_file_type.resolve_signal_index(cli.rank.as_deref())?;
    let agg = resolve_peak_merge_method(&cli, signal_index);

    info!("loading peak files");
    let sample_1 = load_peaks(&cli.samples[0], signal_index)?;
    let sample_2 = load_peaks(&cli.samples[1], signal_index)?;
    let oracle = cli
        .peak_list
        .as_ref()
        .map(|p| load_peaks(p, signal_index))
        .transpose()?;

    info!("merging peaks");
    let merged = merge_peaks(
        &sample_1,
        &sample_2,
        oracle.as_ref(),
        agg,
        cli.use_nonoverlapping_peaks,
    );

    let output = File::create(&cli.output_file)?;
    let ctx = RunContext::from_cli(&cli);

    if cli.only_merge_peaks {
        // no IDR was computed, so every peak is retained regardless of
        // --idr-threshold.
        let retained = ctx.retain_all();
        let mut writer = IdrResultWriter::new(
            BufWriter::new(output),
            retained.idr_threshold,
            retained.soft_idr_threshold,
        );
        let results = merge_only_results(&merged);
        writer.write_all(&results)?;
        return Ok(());
    }

    if merged.len() < MIN_MERGED_PEAKS {
        let retained = ctx.retain_all();
        let mut writer = IdrResultWriter::new(
            BufWriter::new(output),
            retained.idr_threshold,
            retained.soft_idr_threshold,
        );
        let results = merge_only_results(&merged);
        writer.write_all(&results)?;
        return Err(IdrError::InsufficientData { found: merged.len() });
    }

    if cli.plot {
        warn!(
            "plotting is not supported; the --plot flag is a no-op (see \
             spec notes on orthogonal plotting support)"
        );
    }

    info!("ranking peaks");
    let signals_1: Vec<f64> = merged.iter().map(|m| m.signal_1).collect();
    let signals_2: Vec<f64> = merged.iter().map(|m| m.signal_2).collect();
    let mut rank_ctx = ctx.rank_context();
    let (r1, r2) = build_rank_vectors(&signals_1, &signals_2, &mut rank_ctx);

    let starting_point = ModelParams {
        mu: cli.initial_mu,
        sigma: cli.initial_sigma,
        rho: cli.initial_rho,
        pi: cli.initial_mix_param,
    };
    let fixed = FixedFlags { fix_mu: cli.fix_mu, fix_sigma: cli.fix_sigma };

    info!("fitting the model parameters");
    let em_result = estimate_model_params(
        &r1,
        &r2,
        starting_point,
        cli.max_iter,
        cli.convergence_eps,
        fixed,
    )?;
    info!(
        "final parameter values: mu={:.4} sigma={:.4} rho={:.4} pi={:.4}",
        em_result.theta.mu, em_result.theta.sigma, em_result.theta.rho, em_result.theta.pi
    );

    let idr_result = calc_idr(
        &em_result.theta,
        &r1,
        &r2,
        posterior_membership,
        true,
    )?;

    let results: Vec<MergedPeakResult> = merged
        .iter()
        .zip(idr_result.local_idr.iter())
        .zip(idr_result.global_idr.iter())
        .map(|((merged_peak, &local_idr), &global_idr)| MergedPeakResult {
            merged_peak,
            local_idr,
            global_idr,
        })
        .collect();

    let mut writer = IdrResultWriter::new(
        BufWriter::new(output),
        ctx.idr_threshold,
        ctx.soft_idr_threshold,
    );
    let summary = writer.write_all(&results)?;
    writer.flush()?;
    info!(
        "number of reported peaks - {}/{} ({:.1}%)",
        summary.peaks_passing_hard_threshold,
        summary.total_peaks,
        100.0 * summary.peaks_passing_hard_threshold as f64
            / summary.total_peaks.max(1) as f64
    );
    info!(
        "number of peaks passing IDR cutoff of {} - {}/{} ({:.1}%)",
        ctx.soft_idr_threshold,
        summary.peaks_passing_soft_threshold,
        summary.total_peaks,
        100.0 * summary.peaks_passing_soft_threshold as f64
            / summary.total_peaks.max(1) as f64
    );

    Ok(())
}
