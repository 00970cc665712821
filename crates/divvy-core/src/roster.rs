use std::collections::{HashMap, HashSet};

use divvy_ingest::Metric;
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::types::{clean_title, Completeness, ContributorRole};

/// Widget-field ids the registry form stores its answers under. Defaults are
/// the production form's ids; a config override covers form rebuilds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryFieldMap {
    pub title: String,
    pub submitted: String,
    pub account_name: String,
    pub account_id: String,
    pub complete: String,
    pub full_content: String,
    pub semi_content: String,
    pub editing: String,
    pub publishing: String,
    pub department: String,
}

impl Default for RegistryFieldMap {
    fn default() -> Self {
        Self {
            title: "_widget_1740646149825".to_string(),
            submitted: "_widget_1740646149826".to_string(),
            account_name: "_widget_1741257105163".to_string(),
            account_id: "_widget_1741257105165".to_string(),
            complete: "_widget_1740798082550".to_string(),
            full_content: "_widget_1740798082567".to_string(),
            semi_content: "_widget_1740798082568".to_string(),
            editing: "_widget_1740798082569".to_string(),
            publishing: "_widget_1740798082570".to_string(),
            department: "_widget_1741934971937".to_string(),
        }
    }
}

/// One registry entry: a published content item and who gets credit for it.
/// The title is already hashtag-cleaned.
#[derive(Debug, Clone)]
pub struct ContentRecord {
    pub title: String,
    pub account_name: String,
    pub account_id: String,
    pub completeness: Completeness,
    pub full_content: Vec<String>,
    pub semi_content: Vec<String>,
    pub editing: Vec<String>,
    pub publishing: Vec<String>,
    pub submitted_on: Option<String>,
    pub department: Option<String>,
}

impl ContentRecord {
    pub fn contributors(&self, role: ContributorRole) -> &[String] {
        match role {
            ContributorRole::FullContent => &self.full_content,
            ContributorRole::SemiContent => &self.semi_content,
            ContributorRole::Editing => &self.editing,
            ContributorRole::Publishing => &self.publishing,
        }
    }
}

/// One (item, role, person) credit mention.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditRow {
    pub title: String,
    pub role: ContributorRole,
    pub person: String,
}

/// Decodes form documents into registry records. Entries without a usable
/// title are dropped with a warning; they cannot be joined to anything.
pub fn decode_registry(docs: &[Value], fields: &RegistryFieldMap) -> Vec<ContentRecord> {
    let mut records = Vec::with_capacity(docs.len());

    for doc in docs {
        let raw_title = string_field(doc, &fields.title);
        let title = clean_title(&raw_title);
        if title.is_empty() {
            warn!(title = %raw_title, "registry entry without a title, skipping");
            continue;
        }

        let complete_flag = string_field(doc, &fields.complete);
        records.push(ContentRecord {
            title,
            account_name: string_field(doc, &fields.account_name),
            account_id: string_field(doc, &fields.account_id),
            completeness: Completeness::from_flag(&complete_flag),
            full_content: user_group(doc, &fields.full_content),
            semi_content: user_group(doc, &fields.semi_content),
            editing: user_group(doc, &fields.editing),
            publishing: user_group(doc, &fields.publishing),
            submitted_on: optional_string_field(doc, &fields.submitted),
            department: doc
                .get(&fields.department)
                .and_then(|v| v.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
        });
    }

    records
}

fn string_field(doc: &Value, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_string_field(doc: &Value, field: &str) -> Option<String> {
    doc.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Member fields hold arrays of `{"username": ...}` objects.
fn user_group(doc: &Value, field: &str) -> Vec<String> {
    doc.get(field)
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|member| member.get("username").and_then(Value::as_str))
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Expands each record into one row per contributor mention, roles in fixed
/// order so downstream output is deterministic.
pub fn explode_credits(records: &[ContentRecord]) -> Vec<CreditRow> {
    let mut rows = Vec::new();
    for record in records {
        for role in ContributorRole::ALL {
            for person in record.contributors(role) {
                rows.push(CreditRow {
                    title: record.title.clone(),
                    role,
                    person: person.clone(),
                });
            }
        }
    }
    rows
}

/// What fell out of the registry-metrics join.
#[derive(Debug, Clone, Default)]
pub struct JoinReport {
    pub registry_titles: usize,
    pub matched_titles: usize,
    pub metrics_without_registry: Vec<String>,
}

/// Builds the scoring input: one row per registry title with that title's
/// daily metrics summed across platforms. The registry is the master table;
/// registry items with no metrics score zero, and metric rows with no
/// registry entry are reported but excluded.
pub fn attach_metrics(records: &[ContentRecord], daily: &DataFrame) -> Result<(DataFrame, JoinReport)> {
    let titles = daily.column("title")?.str()?;
    let mut counters = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        counters.push(daily.column(metric.canonical_name())?.i64()?);
    }

    let mut by_title: HashMap<String, [i64; 5]> = HashMap::new();
    for idx in 0..daily.height() {
        let Some(raw_title) = titles.get(idx) else {
            continue;
        };
        let cleaned = clean_title(raw_title);
        let entry = by_title.entry(cleaned).or_insert([0; 5]);
        for slot in 0..Metric::ALL.len() {
            entry[slot] += counters[slot].get(idx).unwrap_or(0);
        }
    }

    let registry_titles: HashSet<&str> = records.iter().map(|r| r.title.as_str()).collect();

    let mut out_titles: Vec<&str> = Vec::with_capacity(records.len());
    let mut out_counters: [Vec<i64>; 5] = Default::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    let mut matched = 0usize;

    for record in records {
        // a title registered twice collapses into one scoring row
        if !seen.insert(record.title.as_str()) {
            continue;
        }
        let metrics = by_title.get(record.title.as_str());
        if metrics.is_some() {
            matched += 1;
        }
        let values = metrics.copied().unwrap_or([0; 5]);
        out_titles.push(record.title.as_str());
        for slot in 0..Metric::ALL.len() {
            out_counters[slot].push(values[slot]);
        }
    }

    let mut unmatched: Vec<String> = by_title
        .keys()
        .filter(|title| !registry_titles.contains(title.as_str()))
        .cloned()
        .collect();
    unmatched.sort();
    if !unmatched.is_empty() {
        warn!(
            count = unmatched.len(),
            "daily metrics present for titles missing from the registry"
        );
    }

    let mut columns: Vec<Column> = Vec::with_capacity(1 + Metric::ALL.len());
    columns.push(Series::new("title".into(), out_titles).into());
    for (slot, metric) in Metric::ALL.iter().enumerate() {
        columns.push(
            Series::new(
                metric.canonical_name().into(),
                std::mem::take(&mut out_counters[slot]),
            )
            .into(),
        );
    }

    let frame = DataFrame::new(columns).map_err(PipelineError::from)?;
    let report = JoinReport {
        registry_titles: seen.len(),
        matched_titles: matched,
        metrics_without_registry: unmatched,
    };
    Ok((frame, report))
}
