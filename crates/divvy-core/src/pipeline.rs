use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::allocation::{
    self, ConservationReport, ItemPayout, PersonPayout, Reconciliation, RoleSplitTable,
};
use crate::error::Result;
use crate::roster::{self, ContentRecord, JoinReport};
use crate::scoring::{self, MetricWeights};
use crate::types::round_yuan;

/// Everything a dividend run needs besides the daily metric frame.
#[derive(Debug)]
pub struct DividendContext {
    pub report_date: NaiveDate,
    pub weights: MetricWeights,
    pub split_table: RoleSplitTable,
    pub unit_yuan: f64,
    pub pool_yuan: f64,
    pub records: Vec<ContentRecord>,
}

#[derive(Debug)]
pub struct DividendRun {
    pub items: Vec<ItemPayout>,
    pub persons: Vec<PersonPayout>,
    pub reconciliation: Reconciliation,
    pub conservation: ConservationReport,
    pub join_report: JoinReport,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub report_date: NaiveDate,
    pub pool_yuan: f64,
    pub unit_yuan: f64,
    pub allocatable_units: i64,
    pub registry_titles: usize,
    pub matched_titles: usize,
    pub metrics_without_registry: usize,
    pub scored_items: usize,
    pub paid_items: usize,
    pub paid_persons: usize,
    pub distributed_yuan: f64,
    pub undistributed_yuan: f64,
    pub correction_yuan: f64,
    pub residual_yuan: f64,
    pub conservation_ok: bool,
}

/// The full allocation pass: registry join → scoring → unit allocation →
/// role split → per-person reconciliation → conservation check.
pub fn run_dividend(context: &DividendContext, daily: &DataFrame) -> Result<DividendRun> {
    context.weights.validate()?;

    let (scoring_input, join_report) = roster::attach_metrics(&context.records, daily)?;
    let scored = scoring::score_items(&scoring_input, &context.weights)?;
    let scores = scoring::content_scores(&scored)?;

    let items = allocation::allocate_units(&scores, context.pool_yuan, context.unit_yuan)?;
    let shares = allocation::split_by_role(&items, &context.records, &context.split_table);

    let item_total = round_yuan(items.iter().map(|item| item.amount).sum());
    let (persons, reconciliation) = allocation::aggregate_by_person(&shares, item_total);

    let allocatable_units = (context.pool_yuan / context.unit_yuan).floor() as i64;
    let expected_total = if items.is_empty() {
        0.0
    } else {
        allocatable_units as f64 * context.unit_yuan
    };
    let conservation = allocation::check_conservation(expected_total, &items, &persons);

    let summary = RunSummary {
        run_id: Uuid::new_v4(),
        report_date: context.report_date,
        pool_yuan: round_yuan(context.pool_yuan),
        unit_yuan: context.unit_yuan,
        allocatable_units,
        registry_titles: join_report.registry_titles,
        matched_titles: join_report.matched_titles,
        metrics_without_registry: join_report.metrics_without_registry.len(),
        scored_items: scores.len(),
        paid_items: items.len(),
        paid_persons: persons.len(),
        distributed_yuan: conservation.person_total,
        undistributed_yuan: round_yuan(context.pool_yuan - conservation.person_total),
        correction_yuan: reconciliation.correction,
        residual_yuan: reconciliation.residual,
        conservation_ok: conservation.ok,
    };

    info!(
        run_id = %summary.run_id,
        report_date = %summary.report_date,
        paid_items = summary.paid_items,
        paid_persons = summary.paid_persons,
        distributed_yuan = summary.distributed_yuan,
        conservation_ok = summary.conservation_ok,
        "dividend run complete"
    );

    Ok(DividendRun {
        items,
        persons,
        reconciliation,
        conservation,
        join_report,
        summary,
    })
}
