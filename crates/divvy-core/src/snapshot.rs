use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use divvy_ingest::{Metric, ParsedExport};
use polars::prelude::*;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Canonical snapshot column order. `published_at` is kept as a formatted
/// string so the frame round-trips through CSV without dtype surprises.
pub const SNAPSHOT_COLUMNS: [&str; 8] = [
    "platform",
    "title",
    "published_at",
    "plays",
    "likes",
    "comments",
    "shares",
    "collects",
];

pub const SNAPSHOT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_snapshot_datetime(value: NaiveDateTime) -> String {
    value.format(SNAPSHOT_DATETIME_FORMAT).to_string()
}

pub fn parse_snapshot_datetime(value: &str) -> Option<NaiveDateTime> {
    static FORMATS: &[&str] = &[
        SNAPSHOT_DATETIME_FORMAT,
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    let trimmed = value.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Flattens a batch of parsed exports into one frame with a row per content
/// item, both platforms stacked together.
pub fn snapshot_frame(exports: &[ParsedExport]) -> Result<DataFrame> {
    let capacity: usize = exports.iter().map(|export| export.rows.len()).sum();

    let mut platforms: Vec<&str> = Vec::with_capacity(capacity);
    let mut titles: Vec<&str> = Vec::with_capacity(capacity);
    let mut published: Vec<String> = Vec::with_capacity(capacity);
    let mut counters: [Vec<i64>; 5] = Default::default();

    for export in exports {
        for row in &export.rows {
            platforms.push(export.platform.as_str());
            titles.push(row.title.as_str());
            published.push(format_snapshot_datetime(row.published_at));
            for (slot, metric) in Metric::ALL.iter().enumerate() {
                counters[slot].push(row.metric(*metric));
            }
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(SNAPSHOT_COLUMNS.len());
    columns.push(Series::new("platform".into(), platforms).into());
    columns.push(Series::new("title".into(), titles).into());
    columns.push(Series::new("published_at".into(), published).into());
    for (slot, metric) in Metric::ALL.iter().enumerate() {
        columns.push(Series::new(metric.canonical_name().into(), counters[slot].clone()).into());
    }

    DataFrame::new(columns).map_err(PipelineError::from)
}

pub fn read_snapshot(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

pub fn write_snapshot(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    let mut clone = df.clone();
    CsvWriter::new(&mut file).finish(&mut clone)?;
    Ok(())
}

/// Promotes today's canonical snapshot to previous-day state so tomorrow's
/// run diffs against it. Today's file is consumed by the move.
pub fn rotate(today: &Path, previous: &Path) -> Result<()> {
    if !today.exists() {
        return Err(PipelineError::Validation(format!(
            "no snapshot to promote at {}",
            today.display()
        )));
    }

    if previous.exists() {
        std::fs::remove_file(previous)?;
        info!(path = %previous.display(), "removed previous-day snapshot");
    }

    std::fs::rename(today, previous)?;
    info!(
        from = %today.display(),
        to = %previous.display(),
        "promoted today's snapshot to previous-day state"
    );
    Ok(())
}
