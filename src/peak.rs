use std::fmt::{Display, Formatter};

use derive_new::new;

use crate::errs::IdrError;

/// One of the three strands a peak record can be reported on.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Positive,
    Negative,
    Unstranded,
}

impl Strand {
    pub fn parse_char(c: char) -> Self {
        match c {
            '-' => Self::Negative,
            '.' => Self::Unstranded,
            // narrowPeak/broadPeak/bed writers use '.' for "no strand" but
            // some callers emit anything else as unstranded too.
            '+' => Self::Positive,
            _ => Self::Unstranded,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Self::Positive => '+',
            Self::Negative => '-',
            Self::Unstranded => '.',
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A single genomic interval with an associated signal, as loaded from a
/// peak-call file. Immutable after construction.
#[derive(new, Debug, Clone, PartialEq)]
pub struct Peak {
    pub contig: String,
    pub strand: Strand,
    pub start: u64,
    pub stop: u64,
    pub signal: f64,
}

impl Peak {
    /// Validates and constructs a `Peak`, rejecting negative or non-finite
    /// signal values. `path`/`line` carry file-position context into the
    /// error, since this is the constructor `loader::load_peaks` uses for
    /// every parsed record.
    pub fn try_new(
        contig: String,
        strand: Strand,
        start: u64,
        stop: u64,
        signal: f64,
        path: &str,
        line: usize,
    ) -> Result<Self, IdrError> {
        if !signal.is_finite() || signal < 0.0 {
            return Err(IdrError::NegativeSignal {
                path: path.to_string(),
                line,
                value: signal,
            });
        }
        Ok(Self { contig, strand, start, stop, signal })
    }
}

/// Which of the two replicates (or the oracle set) a raw interval came from,
/// used while sweeping a contig's merged intervals in `merge`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PeakOrigin {
    Oracle,
    Sample1,
    Sample2,
}

/// The result of merging overlapping intervals from both replicates (and
/// optionally an oracle set) into a single consensus interval.
#[derive(Debug, Clone)]
pub struct MergedPeak {
    pub contig: String,
    pub strand: Strand,
    pub merged_start: u64,
    pub merged_stop: u64,
    pub signal_1: f64,
    pub signal_2: f64,
    pub members_1: Vec<Peak>,
    pub members_2: Vec<Peak>,
}

impl MergedPeak {
    /// The joint score used both to sort the merged peak list and to build
    /// the rank vectors, per the caller-supplied aggregator.
    pub fn joint_score(&self, agg: crate::merge::PeakMergeMethod) -> f64 {
        agg.combine(&[self.signal_1, self.signal_2])
    }
}
