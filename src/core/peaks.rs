use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::consts::*;
use crate::error::PipelineError;

/// One called peak: the raw tab-separated line plus the two numeric rank
/// columns (signalValue, pValue) peak sets are ordered by.
#[derive(Debug, Clone)]
pub struct PeakRecord {
    line: String,
    signal: f64,
    pvalue: f64,
}

impl PeakRecord {
    pub fn parse(line: &str) -> Result<Self, PipelineError> {
        let fields = line.split('\t').collect::<Vec<_>>();

        if fields.len() <= PVALUE_COLUMN {
            return Err(PipelineError::MalformedPeak(format!(
                "expected at least {} columns, got {}: {}",
                PVALUE_COLUMN + 1,
                fields.len(),
                line
            )));
        }

        let signal = parse_rank(fields[SIGNAL_COLUMN], line)?;
        let pvalue = parse_rank(fields[PVALUE_COLUMN], line)?;

        Ok(Self {
            line: line.to_string(),
            signal,
            pvalue,
        })
    }

    pub fn rank(&self) -> (f64, f64) {
        (self.signal, self.pvalue)
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

fn parse_rank(field: &str, line: &str) -> Result<f64, PipelineError> {
    field
        .parse::<f64>()
        .map_err(|_| PipelineError::MalformedPeak(format!("bad rank value `{}`: {}", field, line)))
}

/// Read every record of a gzipped peak set. Multi-member files (pooled
/// outputs are plain member concatenations) decompress transparently.
pub fn read_peaks(path: &Path) -> Result<Vec<PeakRecord>, PipelineError> {
    let reader = BufReader::new(MultiGzDecoder::new(File::open(path)?));

    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(PeakRecord::parse(&line)?);
    }

    Ok(records)
}

pub fn write_peaks(path: &Path, records: &[PeakRecord]) -> Result<(), PipelineError> {
    let mut encoder = GzEncoder::new(
        BufWriter::new(File::create(path)?),
        Compression::default(),
    );

    for record in records {
        writeln!(encoder, "{}", record.line)?;
    }

    encoder.finish()?.flush()?;

    Ok(())
}

/// Stable descending sort by signalValue, then pValue. Records with
/// identical rank columns keep their input order.
pub fn sort_by_rank(records: &mut [PeakRecord]) {
    records.sort_by(|a, b| {
        b.rank()
            .partial_cmp(&a.rank())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Sort a peak set by its rank columns and keep the top `cap` records,
/// writing the result as a fresh gzipped peak set. Returns the number of
/// records written. `cap = None` keeps the whole set.
pub fn merge_top_peaks(
    input: &Path,
    output: &Path,
    cap: Option<usize>,
) -> Result<usize, PipelineError> {
    let mut records = read_peaks(input)?;
    sort_by_rank(&mut records);

    if let Some(cap) = cap {
        records.truncate(cap);
    }

    write_peaks(output, &records)?;

    Ok(records.len())
}

/// Count the rows of an IDR overlap report whose score is at or below the
/// reproducibility threshold. The report is whitespace-separated with a
/// header line; the score sits in the eleventh column.
pub fn count_reproducible(report: &Path, threshold: f64) -> Result<usize, PipelineError> {
    let text = std::fs::read_to_string(report)?;

    let mut count = 0;
    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let field = line.split_whitespace().nth(IDR_SCORE_COLUMN).ok_or_else(|| {
            PipelineError::MalformedTable(format!(
                "{}: expected at least {} columns: {}",
                report.display(),
                IDR_SCORE_COLUMN + 1,
                line
            ))
        })?;

        let score = field.parse::<f64>().map_err(|_| {
            PipelineError::MalformedTable(format!(
                "{}: bad IDR score `{}`",
                report.display(),
                field
            ))
        })?;

        if score <= threshold {
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_line(name: &str, signal: f64, pvalue: f64) -> String {
        format!(
            "chr1\t100\t200\t{}\t0\t.\t{}\t{}\t-1\t50",
            name, signal, pvalue
        )
    }

    fn write_gz(path: &Path, lines: &[String]) {
        let records = lines
            .iter()
            .map(|l| PeakRecord::parse(l).expect("fixture line"))
            .collect::<Vec<_>>();
        write_peaks(path, &records).expect("fixture peak set");
    }

    #[test]
    fn parse_rejects_short_and_garbled_lines() {
        assert!(PeakRecord::parse(&peak_line("ok", 5.0, 2.0)).is_ok());
        assert!(PeakRecord::parse("chr1\t100\t200").is_err());
        assert!(PeakRecord::parse("chr1\t100\t200\tp\t0\t.\tNA?\tx\t-1\t50").is_err());
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let mut records = [
            peak_line("a", 5.0, 1.0),
            peak_line("b", 9.0, 1.0),
            peak_line("c", 5.0, 3.0),
            peak_line("d", 5.0, 1.0),
            peak_line("e", 9.0, 2.0),
        ]
        .iter()
        .map(|l| PeakRecord::parse(l).expect("line"))
        .collect::<Vec<_>>();

        sort_by_rank(&mut records);

        let names = records
            .iter()
            .map(|r| r.line().split('\t').nth(3).expect("name"))
            .collect::<Vec<_>>();

        // ties on both rank columns ("a" before "d") keep input order
        assert_eq!(names, vec!["e", "b", "c", "a", "d"]);
    }

    #[test]
    fn merge_truncates_to_the_cap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("peaks.regionPeak.gz");
        let output = dir.path().join("final.regionPeak.gz");

        write_gz(
            &input,
            &[
                peak_line("low", 1.0, 1.0),
                peak_line("high", 9.0, 1.0),
                peak_line("mid", 5.0, 1.0),
                peak_line("tail", 0.5, 1.0),
            ],
        );

        let written = merge_top_peaks(&input, &output, Some(2)).expect("merge");
        assert_eq!(written, 2);

        let names = read_peaks(&output)
            .expect("final set")
            .iter()
            .map(|r| r.line().split('\t').nth(3).expect("name").to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["high", "mid"]);
    }

    #[test]
    fn merge_without_cap_keeps_everything_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("peaks.regionPeak.gz");
        let output = dir.path().join("final.regionPeak.gz");

        write_gz(
            &input,
            &[peak_line("low", 1.0, 1.0), peak_line("high", 9.0, 1.0)],
        );

        assert_eq!(merge_top_peaks(&input, &output, None).expect("merge"), 2);
        assert_eq!(read_peaks(&output).expect("final set").len(), 2);
    }

    #[test]
    fn merge_with_oversized_cap_is_harmless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("peaks.regionPeak.gz");
        let output = dir.path().join("final.regionPeak.gz");

        write_gz(&input, &[peak_line("only", 1.0, 1.0)]);

        assert_eq!(merge_top_peaks(&input, &output, Some(120)).expect("merge"), 1);
    }

    #[test]
    fn counts_scores_at_or_below_threshold() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = dir.path().join("idr-overlapped-peaks.txt");

        let row = |score: f64| {
            format!(
                "chr1 100 200 5.0 chr1 110 210 4.0 180 3.5 {} extra",
                score
            )
        };
        let text = [
            "header line".to_string(),
            row(0.005),
            row(0.01),
            row(0.5),
            row(0.0099),
        ]
        .join("\n");
        std::fs::write(&report, text).expect("report fixture");

        assert_eq!(count_reproducible(&report, 0.01).expect("count"), 3);
        assert_eq!(count_reproducible(&report, 0.001).expect("count"), 0);
    }

    #[test]
    fn short_report_rows_are_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = dir.path().join("idr-overlapped-peaks.txt");
        std::fs::write(&report, "header\nchr1 100 200\n").expect("report fixture");

        match count_reproducible(&report, 0.01) {
            Err(PipelineError::MalformedTable(_)) => {}
            other => panic!("expected MalformedTable, got {:?}", other),
        }
    }
}
