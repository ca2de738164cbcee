use std::fs::File;
use std::io::{BufRead, BufReader};

use flate2::read::GzDecoder;
use rustc_hash::FxHashMap;

use crate::errs::IdrError;
use crate::peak::{Peak, Strand};

/// File format of `--samples`/`--peak-list`, selecting which columns carry
/// contig/start/stop/strand/signal (spec.md §6).
#[derive(Debug, Copy, Clone, Eq, PartialEq, clap::ValueEnum)]
pub enum InputFileType {
    #[clap(name = "narrowPeak")]
    NarrowPeak,
    #[clap(name = "broadPeak")]
    BroadPeak,
    #[clap(name = "bed")]
    Bed,
}

impl InputFileType {
    /// Resolves a `--rank` string to a 0-based signal column, per spec.md
    /// §6's per-filetype table.
    pub fn resolve_signal_index(
        &self,
        rank: Option<&str>,
    ) -> Result<usize, IdrError> {
        match self {
            Self::NarrowPeak | Self::BroadPeak => {
                let rank = rank.unwrap_or("signal.value");
                match rank {
                    "score" => Ok(4),
                    "signal.value" => Ok(6),
                    "p.value" => Ok(7),
                    "q.value" => Ok(8),
                    other => Err(IdrError::UnrecognizedRank {
                        file_type: self.name().to_string(),
                        rank: other.to_string(),
                    }),
                }
            }
            Self::Bed => match rank {
                None | Some("score") => Ok(4),
                Some(other) => other.parse::<usize>().map_err(|_| {
                    IdrError::UnrecognizedRank {
                        file_type: self.name().to_string(),
                        rank: other.to_string(),
                    }
                }),
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NarrowPeak => "narrowPeak",
            Self::BroadPeak => "broadPeak",
            Self::Bed => "bed",
        }
    }
}

/// `(contig, strand) -> peaks`, one per input replicate or oracle set.
pub type PeakBucket = FxHashMap<(String, Strand), Vec<Peak>>;

fn open_reader(path: &str) -> Result<Box<dyn BufRead>, IdrError> {
    if path == "-" || path == "stdin" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(path)?;
    if path.ends_with(".gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parses a single narrowPeak/broadPeak/bed file into a [`PeakBucket`],
/// following spec.md §4.A: whitespace-delimited, `#`/`track` lines skipped,
/// contig/start/stop/strand at fields 0/1/2/5, signal at `signal_index`.
pub fn load_peaks(path: &str, signal_index: usize) -> Result<PeakBucket, IdrError> {
    let reader = open_reader(path)?;
    let mut buckets: PeakBucket = FxHashMap::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with('#') || line.starts_with("track") || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let min_fields = signal_index.max(5) + 1;
        if fields.len() < min_fields {
            return Err(IdrError::MalformedRecord {
                path: path.to_string(),
                line: lineno + 1,
                message: format!(
                    "expected at least {min_fields} whitespace-delimited \
                     fields, found {}",
                    fields.len()
                ),
            });
        }
        let contig = fields[0].to_string();
        let parse_coord = |field: &str| -> Result<u64, IdrError> {
            field.parse::<f64>().map(|v| v as u64).map_err(|_| {
                IdrError::MalformedRecord {
                    path: path.to_string(),
                    line: lineno + 1,
                    message: format!("could not parse coordinate '{field}'"),
                }
            })
        };
        let start = parse_coord(fields[1])?;
        let stop = parse_coord(fields[2])?;
        let strand = Strand::parse_char(
            fields[5].chars().next().unwrap_or('.'),
        );
        let signal = fields[signal_index].parse::<f64>().map_err(|_| {
            IdrError::MalformedRecord {
                path: path.to_string(),
                line: lineno + 1,
                message: format!(
                    "could not parse signal '{}'",
                    fields[signal_index]
                ),
            }
        })?;
        let peak = Peak::try_new(
            contig.clone(),
            strand,
            start,
            stop,
            signal,
            path,
            lineno + 1,
        )?;
        buckets.entry((contig, strand)).or_insert_with(Vec::new).push(peak);
    }
    Ok(buckets)
}
