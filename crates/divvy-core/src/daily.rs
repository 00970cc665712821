use std::collections::HashMap;

use chrono::NaiveDate;
use divvy_ingest::{Metric, Platform};
use polars::prelude::*;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::snapshot::parse_snapshot_datetime;

/// Per-platform minimum publish dates; anything older predates the dividend
/// scheme and never earns.
#[derive(Debug, Clone, Copy)]
pub struct PublishCutoffs {
    pub douyin: NaiveDate,
    pub xiaohongshu: NaiveDate,
}

impl PublishCutoffs {
    pub fn for_platform(&self, platform: Platform) -> NaiveDate {
        match platform {
            Platform::Douyin => self.douyin,
            Platform::Xiaohongshu => self.xiaohongshu,
        }
    }
}

/// Turns cumulative counters into daily deltas: join yesterday's snapshot by
/// (platform, raw title), treat missing titles as zero, and take the absolute
/// difference per metric. The output frame leads with `report_date`.
pub fn compute_daily(
    today: &DataFrame,
    yesterday: Option<&DataFrame>,
    cutoffs: &PublishCutoffs,
    report_date: NaiveDate,
) -> Result<DataFrame> {
    let len = today.height();

    let platforms = today.column("platform")?.str()?;
    let titles = today.column("title")?.str()?;
    let published = today.column("published_at")?.str()?;

    let mut today_counters = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        today_counters.push(today.column(metric.canonical_name())?.i64()?);
    }

    let previous = match yesterday {
        Some(df) => index_counters(df)?,
        None => HashMap::new(),
    };

    let mut out_platforms: Vec<String> = Vec::with_capacity(len);
    let mut out_titles: Vec<String> = Vec::with_capacity(len);
    let mut out_published: Vec<String> = Vec::with_capacity(len);
    let mut out_counters: [Vec<i64>; 5] = Default::default();

    for idx in 0..len {
        let (Some(platform_str), Some(title), Some(published_str)) =
            (platforms.get(idx), titles.get(idx), published.get(idx))
        else {
            warn!(row = idx, "snapshot row missing platform/title/published_at, skipping");
            continue;
        };

        let platform = Platform::try_from(platform_str)
            .map_err(PipelineError::Processing)?;
        let published_at = parse_snapshot_datetime(published_str).ok_or_else(|| {
            PipelineError::Processing(format!(
                "unparseable published_at '{published_str}' for '{title}'"
            ))
        })?;

        if published_at.date() < cutoffs.for_platform(platform) {
            continue;
        }

        let key = (platform_str.to_string(), title.to_string());
        let baseline = previous.get(&key).copied().unwrap_or([0; 5]);

        out_platforms.push(platform_str.to_string());
        out_titles.push(title.to_string());
        out_published.push(published_str.to_string());
        for slot in 0..Metric::ALL.len() {
            let current = today_counters[slot].get(idx).unwrap_or(0);
            out_counters[slot].push((current - baseline[slot]).abs());
        }
    }

    let height = out_titles.len();
    let mut columns: Vec<Column> = Vec::with_capacity(4 + Metric::ALL.len());
    columns.push(
        Series::new(
            "report_date".into(),
            vec![report_date.format("%Y-%m-%d").to_string(); height],
        )
        .into(),
    );
    columns.push(Series::new("platform".into(), out_platforms).into());
    columns.push(Series::new("title".into(), out_titles).into());
    columns.push(Series::new("published_at".into(), out_published).into());
    for (slot, metric) in Metric::ALL.iter().enumerate() {
        columns.push(
            Series::new(
                metric.canonical_name().into(),
                std::mem::take(&mut out_counters[slot]),
            )
            .into(),
        );
    }

    DataFrame::new(columns).map_err(PipelineError::from)
}

fn index_counters(df: &DataFrame) -> Result<HashMap<(String, String), [i64; 5]>> {
    // a header-only snapshot infers no dtypes; nothing to index either way
    if df.height() == 0 {
        return Ok(HashMap::new());
    }

    let platforms = df.column("platform")?.str()?;
    let titles = df.column("title")?.str()?;

    let mut counters = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        counters.push(df.column(metric.canonical_name())?.i64()?);
    }

    let mut index = HashMap::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(platform), Some(title)) = (platforms.get(idx), titles.get(idx)) else {
            continue;
        };
        let mut values = [0i64; 5];
        for slot in 0..Metric::ALL.len() {
            values[slot] = counters[slot].get(idx).unwrap_or(0);
        }
        // last write wins when an export repeats a title
        index.insert((platform.to_string(), title.to_string()), values);
    }

    Ok(index)
}
