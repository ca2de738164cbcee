use std::io::{Result as IoResult, Write};

use crate::peak::MergedPeak;

/// A single peak's final reportable result: the merged peak plus its local
/// and global IDR values (spec.md §3's `IDRResult`, joined back to the
/// peak it was computed for).
pub struct MergedPeakResult<'a> {
    pub merged_peak: &'a MergedPeak,
    pub local_idr: f64,
    pub global_idr: f64,
}

/// Output sink for per-peak results, mirroring the teacher's `OutWriter<T>`
/// trait split between pileup writers and generic writers (`writers.rs`).
pub trait OutWriter<T> {
    fn write(&mut self, item: T) -> IoResult<u64>;
}

/// Summary of what the writer reported, for the driver's final log line:
/// spec.md §4.H's hard/soft threshold counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteSummary {
    pub total_peaks: usize,
    pub peaks_passing_hard_threshold: usize,
    pub peaks_passing_soft_threshold: usize,
}

pub struct IdrResultWriter<W: Write> {
    inner: W,
    hard_threshold: f64,
    soft_threshold: f64,
}

impl<W: Write> IdrResultWriter<W> {
    pub fn new(inner: W, hard_threshold: f64, soft_threshold: f64) -> Self {
        Self { inner, hard_threshold, soft_threshold }
    }

    pub fn flush(&mut self) -> IoResult<()> {
        self.inner.flush()
    }

    fn format_member_bounds(members: &[crate::peak::Peak]) -> (String, String) {
        if members.is_empty() {
            ("-1".to_string(), "-1".to_string())
        } else {
            let start = members.iter().map(|p| p.start).min().unwrap();
            let stop = members.iter().map(|p| p.stop).max().unwrap();
            (start.to_string(), stop.to_string())
        }
    }

    /// Writes every result, returning a [`WriteSummary`] per spec.md §4.H:
    /// peaks with `globalIDR > hard_threshold` are suppressed entirely; the
    /// soft-threshold count is over only the peaks actually retained.
    pub fn write_all(
        &mut self,
        results: &[MergedPeakResult],
    ) -> IoResult<WriteSummary> {
        let mut summary = WriteSummary { total_peaks: results.len(), ..Default::default() };
        for result in results {
            if result.global_idr > self.hard_threshold {
                continue;
            }
            summary.peaks_passing_hard_threshold += 1;
            if result.global_idr <= self.soft_threshold {
                summary.peaks_passing_soft_threshold += 1;
            }

            let (start_1, stop_1) =
                Self::format_member_bounds(&result.merged_peak.members_1);
            let (start_2, stop_2) =
                Self::format_member_bounds(&result.merged_peak.members_2);

            writeln!(
                self.inner,
                "{contig}\t{start_1}\t{stop_1}\t{signal_1:.5}\t{start_2}\t\
                 {stop_2}\t{signal_2:.5}\t{global_idr:.5}\t{local_idr:.5}\t\
                 {strand}",
                contig = result.merged_peak.contig,
                signal_1 = result.merged_peak.signal_1,
                signal_2 = result.merged_peak.signal_2,
                global_idr = result.global_idr,
                local_idr = result.local_idr,
                strand = result.merged_peak.strand,
            )?;
        }
        Ok(summary)
    }
}

impl<'a, W: Write> OutWriter<&[MergedPeakResult<'a>]> for IdrResultWriter<W> {
    fn write(&mut self, items: &[MergedPeakResult<'a>]) -> IoResult<u64> {
        self.write_all(items).map(|s| s.peaks_passing_hard_threshold as u64)
    }
}

/// Builds [`MergedPeakResult`]s for the `--only-merge-peaks` path: IDR was
/// never computed, so every peak is reported with local/global IDR pinned
/// to 1.0, matching `idr.py::write_results_to_file`'s `None`-default
/// behavior (spec.md §4.H).
pub fn merge_only_results(merged_peaks: &[MergedPeak]) -> Vec<MergedPeakResult> {
    merged_peaks
        .iter()
        .map(|merged_peak| MergedPeakResult {
            merged_peak,
            local_idr: 1.0,
            global_idr: 1.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peak::{Peak, Strand};

    fn merged_peak() -> MergedPeak {
        MergedPeak {
            contig: "chr1".to_string(),
            strand: Strand::Positive,
            merged_start: 10,
            merged_stop: 20,
            signal_1: 5.0,
            signal_2: 4.0,
            members_1: vec![Peak::new(
                "chr1".to_string(),
                Strand::Positive,
                10,
                20,
                5.0,
            )],
            members_2: vec![],
        }
    }

    #[test]
    fn formats_line_with_dash_one_for_absent_replicate() {
        let mp = merged_peak();
        let result =
            MergedPeakResult { merged_peak: &mp, local_idr: 0.01234, global_idr: 0.05678 };
        let mut buf = Vec::new();
        let mut writer = IdrResultWriter::new(&mut buf, 1.0, 1.0);
        let summary = writer.write_all(std::slice::from_ref(&result)).unwrap();
        assert_eq!(summary.peaks_passing_hard_threshold, 1);

        let line = String::from_utf8(buf).unwrap();
        similar_asserts::assert_eq!(
            line,
            "chr1\t10\t20\t5.00000\t-1\t-1\t4.00000\t0.05678\t0.01234\t+\n"
        );
    }

    #[test]
    fn suppresses_peaks_above_hard_threshold() {
        let mp = merged_peak();
        let result =
            MergedPeakResult { merged_peak: &mp, local_idr: 0.5, global_idr: 0.9 };
        let mut buf = Vec::new();
        let mut writer = IdrResultWriter::new(&mut buf, 0.1, 0.1);
        let summary = writer.write_all(std::slice::from_ref(&result)).unwrap();
        assert_eq!(summary.peaks_passing_hard_threshold, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn soft_threshold_counts_only_retained_peaks() {
        let mp = merged_peak();
        let below = MergedPeakResult { merged_peak: &mp, local_idr: 0.01, global_idr: 0.02 };
        let above_soft_below_hard =
            MergedPeakResult { merged_peak: &mp, local_idr: 0.2, global_idr: 0.3 };
        let results = vec![below, above_soft_below_hard];
        let mut buf = Vec::new();
        let mut writer = IdrResultWriter::new(&mut buf, 0.5, 0.1);
        let summary = writer.write_all(&results).unwrap();
        assert_eq!(summary.peaks_passing_hard_threshold, 2);
        assert_eq!(summary.peaks_passing_soft_threshold, 1);
    }
}
