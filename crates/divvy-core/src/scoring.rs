use divvy_ingest::Metric;
use polars::prelude::*;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Metric weights for the composite performance score. Engagement-heavy
/// metrics dominate; raw reach barely moves the needle.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub plays: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub collects: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            plays: 0.05,
            likes: 0.05,
            comments: 0.30,
            shares: 0.30,
            collects: 0.30,
        }
    }
}

impl MetricWeights {
    pub fn weight_for(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Plays => self.plays,
            Metric::Likes => self.likes,
            Metric::Comments => self.comments,
            Metric::Shares => self.shares,
            Metric::Collects => self.collects,
        }
    }

    /// Weights are shares of a whole; reject configs that silently inflate or
    /// deflate every score.
    pub fn validate(&self) -> Result<()> {
        let total: f64 = Metric::ALL.iter().map(|m| self.weight_for(*m)).sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(PipelineError::Validation(format!(
                "metric weights must sum to 1.0, got {total}"
            )));
        }
        if Metric::ALL.iter().any(|m| self.weight_for(*m) < 0.0) {
            return Err(PipelineError::Validation(
                "metric weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Appends one `<metric>_norm` column per metric (value / column max ×
/// weight; zero when the column max is zero) plus their sum as `score`.
pub fn score_items(df: &DataFrame, weights: &MetricWeights) -> Result<DataFrame> {
    let len = df.height();

    let mut score = vec![0.0f64; len];
    let mut norm_columns: Vec<Column> = Vec::with_capacity(Metric::ALL.len() + 1);

    for metric in Metric::ALL {
        let values = df.column(metric.canonical_name())?.i64()?;
        let weight = weights.weight_for(metric);

        let mut max_value = 0i64;
        for idx in 0..len {
            let value = values.get(idx).unwrap_or(0);
            if value > max_value {
                max_value = value;
            }
        }

        let mut normalized = Vec::with_capacity(len);
        for idx in 0..len {
            let value = values.get(idx).unwrap_or(0);
            let contribution = if max_value > 0 {
                (value as f64 / max_value as f64) * weight
            } else {
                0.0
            };
            normalized.push(contribution);
        }

        for (idx, contribution) in normalized.iter().enumerate() {
            score[idx] += contribution;
        }

        let name = format!("{}_norm", metric.canonical_name());
        norm_columns.push(Series::new(name.into(), normalized).into());
    }

    norm_columns.push(Series::new("score".into(), score).into());

    let mut output = df.clone();
    output.hstack_mut(&mut norm_columns)?;
    Ok(output)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentScore {
    pub title: String,
    pub score: f64,
}

/// Extracts the scored titles that actually earned something, preserving
/// frame order.
pub fn content_scores(df: &DataFrame) -> Result<Vec<ContentScore>> {
    let titles = df.column("title")?.str()?;
    let scores = df.column("score")?.f64()?;

    let mut out = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(title), Some(score)) = (titles.get(idx), scores.get(idx)) else {
            continue;
        };
        if score > 0.0 {
            out.push(ContentScore {
                title: title.to_string(),
                score,
            });
        }
    }
    Ok(out)
}
