use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use divvy_ingest::Metric;
use polars::prelude::*;
use serde_json::{json, Value};

use crate::allocation::{ItemPayout, PersonPayout};
use crate::error::{PipelineError, Result};

/// `<dir>/<stem>_<date>.csv`
pub fn report_path(dir: &Path, stem: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{stem}_{}.csv", date.format("%Y-%m-%d")))
}

pub fn write_csv_report(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    let mut clone = df.clone();
    CsvWriter::new(&mut file).finish(&mut clone)?;
    Ok(())
}

pub fn item_payout_frame(items: &[ItemPayout], report_date: NaiveDate) -> Result<DataFrame> {
    let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
    let units: Vec<i64> = items.iter().map(|item| item.units).collect();
    let amounts: Vec<f64> = items.iter().map(|item| item.amount).collect();
    let dates = vec![report_date.format("%Y-%m-%d").to_string(); items.len()];

    DataFrame::new(vec![
        Series::new("title".into(), titles).into(),
        Series::new("units".into(), units).into(),
        Series::new("amount".into(), amounts).into(),
        Series::new("report_date".into(), dates).into(),
    ])
    .map_err(PipelineError::from)
}

pub fn person_payout_frame(persons: &[PersonPayout], report_date: NaiveDate) -> Result<DataFrame> {
    let names: Vec<&str> = persons.iter().map(|person| person.person.as_str()).collect();
    let amounts: Vec<f64> = persons.iter().map(|person| person.amount).collect();
    let dates = vec![report_date.format("%Y-%m-%d").to_string(); persons.len()];

    DataFrame::new(vec![
        Series::new("person".into(), names).into(),
        Series::new("amount".into(), amounts).into(),
        Series::new("report_date".into(), dates).into(),
    ])
    .map_err(PipelineError::from)
}

/// Rows for the per-person payout push: label-keyed objects, widget mapping
/// happens at the upload boundary.
pub fn person_payout_rows(persons: &[PersonPayout], report_date: NaiveDate) -> Vec<Value> {
    persons
        .iter()
        .map(|person| {
            json!({
                "person": person.person,
                "amount": person.amount,
                "date": report_date.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}

/// Rows for the daily metric-table push, straight off the daily frame.
pub fn daily_metric_rows(daily: &DataFrame) -> Result<Vec<Value>> {
    let report_dates = daily.column("report_date")?.str()?;
    let platforms = daily.column("platform")?.str()?;
    let titles = daily.column("title")?.str()?;
    let published = daily.column("published_at")?.str()?;

    let mut counters = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        counters.push(daily.column(metric.canonical_name())?.i64()?);
    }

    let mut rows = Vec::with_capacity(daily.height());
    for idx in 0..daily.height() {
        let mut row = json!({
            "date": report_dates.get(idx).unwrap_or_default(),
            "platform": platforms.get(idx).unwrap_or_default(),
            "title": titles.get(idx).unwrap_or_default(),
            "published_at": published.get(idx).unwrap_or_default(),
        });
        for (slot, metric) in Metric::ALL.iter().enumerate() {
            row[metric.canonical_name()] = json!(counters[slot].get(idx).unwrap_or(0));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Serializes a run summary next to the CSV reports for audit trails.
pub fn write_summary_json<T: serde::Serialize>(summary: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(summary)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
