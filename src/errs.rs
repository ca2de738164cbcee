use thiserror::Error;

/// Errors surfaced by the IDR pipeline, distinguished by kind so that the
/// driver can map them to the exit codes and recovery policy in spec.md §7.
#[derive(Debug, Error)]
pub enum IdrError {
    #[error("unrecognized rank specifier '{rank}' for file type '{file_type}'")]
    UnrecognizedRank { file_type: String, rank: String },

    #[error("{path}:{line}: {message}")]
    MalformedRecord { path: String, line: usize, message: String },

    #[error("invalid signal value {value} at {path}:{line} (signal must be non-negative and finite)")]
    NegativeSignal { path: String, line: usize, value: f64 },

    #[error(
        "merged peak set has only {found} peaks, fewer than the required 20; \
         the merged set was written and the EM fit was skipped"
    )]
    InsufficientData { found: usize },

    #[error("non-finite log-likelihood encountered during model fitting")]
    NonFiniteLikelihood,

    #[error("pseudo-value solver failed to bracket a root for u={u}")]
    BracketFailure { u: f64 },

    #[error("model parameters diverged to a non-finite value: {0:?}")]
    NonFiniteParams(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type IdrResult<T> = Result<T, IdrError>;

/// Non-fatal conditions the driver still wants to know about, reported via
/// `log::warn!` rather than surfaced as an `Err`.
#[derive(Debug)]
pub enum IdrWarning {
    EmNonConvergence { iterations: usize },
    LikelihoodDecreased { from: f64, to: f64 },
}

impl std::fmt::Display for IdrWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmNonConvergence { iterations } => write!(
                f,
                "EM did not converge within {iterations} iterations; using \
                 the last parameter vector"
            ),
            Self::LikelihoodDecreased { from, to } => write!(
                f,
                "log-likelihood decreased between outer iterations ({from} \
                 -> {to})"
            ),
        }
    }
}
