//! CSV and JSON artifacts: per-chunk partial files, the merged daily output,
//! sector rankings and the scan summary.
//!
//! File layout:
//! - `{partial_dir}/scanner_output_{date}_chunk{n}.csv`
//! - `{dir}/scanner_output_{date}.csv` and `{dir}/scanner_output_latest.csv`
//! - `{dir}/sector_rankings.csv`

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::record::ScanRecord;
use crate::scan::ScanSummary;
use crate::sector::SectorRanking;

pub const LATEST_FILE: &str = "scanner_output_latest.csv";
pub const SECTOR_FILE: &str = "sector_rankings.csv";

fn partial_prefix(date: NaiveDate) -> String {
    format!("scanner_output_{}_chunk", date.format("%Y%m%d"))
}

pub fn partial_file_name(date: NaiveDate, chunk: usize) -> String {
    format!("{}{chunk}.csv", partial_prefix(date))
}

pub fn merged_file_name(date: NaiveDate) -> String {
    format!("scanner_output_{}.csv", date.format("%Y%m%d"))
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Records as CSV text, header included.
pub fn records_to_csv(records: &[ScanRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)
            .with_context(|| format!("failed to serialize record for {}", record.code))?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn read_records(path: &Path) -> Result<Vec<ScanRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    rdr.deserialize()
        .collect::<Result<Vec<ScanRecord>, _>>()
        .with_context(|| format!("failed to read records from {}", path.display()))
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Write one chunk's records, highest total score first. Returns the path.
pub fn write_partial(
    partial_dir: &Path,
    date: NaiveDate,
    chunk: usize,
    records: &[ScanRecord],
) -> Result<PathBuf> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    let path = partial_dir.join(partial_file_name(date, chunk));
    write_text(&path, &records_to_csv(&sorted)?)?;
    info!(path = %path.display(), rows = sorted.len(), "wrote partial output");
    Ok(path)
}

// ─── Merge ──────────────────────────────────────────────────────────

/// Union partial record sets in the order given, keep the first record per
/// code, then sort by total score descending. The sort is stable.
pub fn merge_records(parts: impl IntoIterator<Item = Vec<ScanRecord>>) -> Vec<ScanRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ScanRecord> = parts
        .into_iter()
        .flatten()
        .filter(|r| seen.insert(r.code.clone()))
        .collect();
    merged.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    merged
}

/// Partial files for `date` in `partial_dir`, in path order.
pub fn find_partials(partial_dir: &Path, date: NaiveDate) -> Result<Vec<PathBuf>> {
    let prefix = partial_prefix(date);
    let entries = std::fs::read_dir(partial_dir)
        .with_context(|| format!("failed to list {}", partial_dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", partial_dir.display()))?
            .path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".csv"));
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub partials: Vec<PathBuf>,
    pub rows_read: usize,
    pub rows_written: usize,
    pub dated: PathBuf,
    pub latest: PathBuf,
}

/// Merge every partial file for `date` into the dated and latest outputs.
pub fn merge_partials(partial_dir: &Path, out_dir: &Path, date: NaiveDate) -> Result<MergeOutcome> {
    let partials = find_partials(partial_dir, date)?;
    if partials.is_empty() {
        bail!(
            "no partial files for {} in {}",
            date.format("%Y%m%d"),
            partial_dir.display()
        );
    }

    let parts = partials
        .iter()
        .map(|p| read_records(p))
        .collect::<Result<Vec<_>>>()?;
    let rows_read = parts.iter().map(Vec::len).sum();
    let merged = merge_records(parts);
    let text = records_to_csv(&merged)?;

    let dated = out_dir.join(merged_file_name(date));
    let latest = out_dir.join(LATEST_FILE);
    write_text(&dated, &text)?;
    write_text(&latest, &text)?;
    info!(
        files = partials.len(),
        rows_read,
        rows_written = merged.len(),
        path = %dated.display(),
        "merged partial outputs"
    );

    Ok(MergeOutcome {
        partials,
        rows_read,
        rows_written: merged.len(),
        dated,
        latest,
    })
}

// ─── Sector rankings and summary ────────────────────────────────────

pub fn sector_rankings_csv(rankings: &[SectorRanking]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for ranking in rankings {
        wtr.serialize(ranking)
            .with_context(|| format!("failed to serialize sector {}", ranking.sector))?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn write_sector_rankings(out_dir: &Path, rankings: &[SectorRanking]) -> Result<PathBuf> {
    let path = out_dir.join(SECTOR_FILE);
    write_text(&path, &sector_rankings_csv(rankings)?)?;
    info!(path = %path.display(), sectors = rankings.len(), "wrote sector rankings");
    Ok(path)
}

pub fn summary_json(summary: &ScanSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize scan summary to JSON")
}
