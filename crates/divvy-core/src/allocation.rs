use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::roster::ContentRecord;
use crate::scoring::ContentScore;
use crate::types::{round_yuan, Completeness, ContributorRole};

/// Totals stay comparable despite f64 accumulation as long as everything is
/// rounded to cents; half a cent separates "equal" from "drifted".
const CENT_TOLERANCE: f64 = 0.005;

/// A content item's slice of the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayout {
    pub title: String,
    pub score: f64,
    pub units: i64,
    pub amount: f64,
}

/// Allocates whole units of the pool proportionally to score, then corrects
/// rounding drift by handing the entire discrepancy to the highest-scoring
/// item (first occurrence on ties). Items that round to zero units are
/// dropped.
pub fn allocate_units(
    scores: &[ContentScore],
    pool_yuan: f64,
    unit_yuan: f64,
) -> Result<Vec<ItemPayout>> {
    if unit_yuan <= 0.0 {
        return Err(PipelineError::Validation(format!(
            "allocation unit must be positive, got {unit_yuan}"
        )));
    }
    if pool_yuan < 0.0 {
        return Err(PipelineError::Validation(format!(
            "pool cannot be negative, got {pool_yuan}"
        )));
    }

    let allocatable_units = (pool_yuan / unit_yuan).floor() as i64;
    let earning: Vec<&ContentScore> = scores.iter().filter(|s| s.score > 0.0).collect();

    if allocatable_units == 0 || earning.is_empty() {
        debug!(
            allocatable_units,
            earning = earning.len(),
            "nothing to allocate"
        );
        return Ok(Vec::new());
    }

    let score_total: f64 = earning.iter().map(|s| s.score).sum();

    let mut payouts: Vec<ItemPayout> = earning
        .iter()
        .map(|s| {
            let units = (allocatable_units as f64 * s.score / score_total).round() as i64;
            ItemPayout {
                title: s.title.clone(),
                score: s.score,
                units,
                amount: 0.0,
            }
        })
        .collect();

    let assigned: i64 = payouts.iter().map(|p| p.units).sum();
    let discrepancy = allocatable_units - assigned;
    if discrepancy != 0 {
        // first occurrence wins on tied scores
        let mut top = 0usize;
        for (idx, payout) in payouts.iter().enumerate() {
            if payout.score > payouts[top].score {
                top = idx;
            }
        }
        payouts[top].units += discrepancy;
        debug!(discrepancy, title = %payouts[top].title, "rounding drift assigned to top scorer");
    }

    payouts.retain(|p| p.units > 0);
    for payout in &mut payouts {
        payout.amount = round_yuan(payout.units as f64 * unit_yuan);
    }

    Ok(payouts)
}

/// Percentage of an item's payout each role earns, keyed on whether the item
/// arrived as complete content. Combinations outside the table fall back to
/// `default_share`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RoleSplitTable {
    pub complete_full_content: f64,
    pub complete_publishing: f64,
    pub partial_semi_content: f64,
    pub partial_editing: f64,
    pub partial_publishing: f64,
    pub default_share: f64,
}

impl Default for RoleSplitTable {
    fn default() -> Self {
        Self {
            complete_full_content: 0.6,
            complete_publishing: 0.4,
            partial_semi_content: 0.4,
            partial_editing: 0.2,
            partial_publishing: 0.4,
            default_share: 0.2,
        }
    }
}

impl RoleSplitTable {
    pub fn share_for(&self, completeness: Completeness, role: ContributorRole) -> f64 {
        match (completeness, role) {
            (Completeness::Complete, ContributorRole::FullContent) => self.complete_full_content,
            (Completeness::Complete, ContributorRole::Publishing) => self.complete_publishing,
            (Completeness::Partial, ContributorRole::SemiContent) => self.partial_semi_content,
            (Completeness::Partial, ContributorRole::Editing) => self.partial_editing,
            (Completeness::Partial, ContributorRole::Publishing) => self.partial_publishing,
            _ => self.default_share,
        }
    }
}

/// One person's cut of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonShare {
    pub title: String,
    pub person: String,
    pub role: ContributorRole,
    pub amount: f64,
}

/// Splits each item payout across its credited contributors: the role's
/// slice divides evenly among same-role people, rounded to cents per person.
/// Items whose registry entry vanished are skipped with a warning.
pub fn split_by_role(
    payouts: &[ItemPayout],
    records: &[ContentRecord],
    table: &RoleSplitTable,
) -> Vec<PersonShare> {
    let by_title: HashMap<&str, &ContentRecord> = records
        .iter()
        .map(|record| (record.title.as_str(), record))
        .collect();

    let mut shares = Vec::new();
    for payout in payouts {
        let Some(record) = by_title.get(payout.title.as_str()) else {
            warn!(title = %payout.title, "payout for unknown registry title, skipping split");
            continue;
        };

        for role in ContributorRole::ALL {
            let people = record.contributors(role);
            if people.is_empty() {
                continue;
            }
            let ratio = table.share_for(record.completeness, role);
            let per_person = round_yuan(payout.amount * ratio / people.len() as f64);
            for person in people {
                shares.push(PersonShare {
                    title: payout.title.clone(),
                    person: person.clone(),
                    role,
                    amount: per_person,
                });
            }
        }
    }

    shares
}

/// A person's aggregated daily payout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonPayout {
    pub person: String,
    pub amount: f64,
}

/// How the per-person aggregation squared up against the item total.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub item_total: f64,
    pub person_total: f64,
    /// Cent drift folded into the top earner, zero when none was needed.
    pub correction: f64,
    /// What still separates the two totals after correction. Non-zero means
    /// a structural gap (e.g. an item with no credited roles for its split).
    pub residual: f64,
}

/// Aggregates shares per person (alphabetical order) and reconciles rounding
/// drift: a residue within the accumulated cent bound lands on the highest
/// earner; anything larger is left visible and logged. Zero-amount people are
/// dropped after reconciliation.
pub fn aggregate_by_person(
    shares: &[PersonShare],
    item_total: f64,
) -> (Vec<PersonPayout>, Reconciliation) {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for share in shares {
        *totals.entry(share.person.as_str()).or_insert(0.0) += share.amount;
    }

    let mut payouts: Vec<PersonPayout> = totals
        .into_iter()
        .map(|(person, amount)| PersonPayout {
            person: person.to_string(),
            amount: round_yuan(amount),
        })
        .collect();

    let person_total = round_yuan(payouts.iter().map(|p| p.amount).sum());
    let diff = round_yuan(item_total - person_total);

    // every rounded share can contribute at most half a cent of drift
    let drift_bound = 0.005 * shares.len() as f64 + CENT_TOLERANCE;

    let mut correction = 0.0;
    if diff.abs() > CENT_TOLERANCE {
        if diff.abs() <= drift_bound && !payouts.is_empty() {
            // first occurrence wins on tied amounts; order is alphabetical
            let mut top = 0usize;
            for (idx, payout) in payouts.iter().enumerate() {
                if payout.amount > payouts[top].amount {
                    top = idx;
                }
            }
            payouts[top].amount = round_yuan(payouts[top].amount + diff);
            correction = diff;
            debug!(
                correction = diff,
                person = %payouts[top].person,
                "cent drift assigned to top earner"
            );
        } else {
            warn!(
                residual = diff,
                drift_bound,
                "payout residual exceeds rounding drift, leaving unassigned"
            );
        }
    }

    payouts.retain(|p| p.amount > 0.0);

    let person_total = round_yuan(payouts.iter().map(|p| p.amount).sum());
    let reconciliation = Reconciliation {
        item_total: round_yuan(item_total),
        person_total,
        correction,
        residual: round_yuan(item_total - person_total),
    };

    (payouts, reconciliation)
}

/// The invariant the whole run answers for: per-person totals, per-item
/// totals, and the unit pool must agree. Violations are logged, never
/// swallowed.
#[derive(Debug, Clone, Serialize)]
pub struct ConservationReport {
    pub expected_total: f64,
    pub item_total: f64,
    pub person_total: f64,
    pub ok: bool,
}

pub fn check_conservation(
    expected_total: f64,
    items: &[ItemPayout],
    persons: &[PersonPayout],
) -> ConservationReport {
    let item_total = round_yuan(items.iter().map(|p| p.amount).sum());
    let person_total = round_yuan(persons.iter().map(|p| p.amount).sum());

    let ok = (item_total - expected_total).abs() <= CENT_TOLERANCE
        && (person_total - expected_total).abs() <= CENT_TOLERANCE;

    if !ok {
        warn!(
            expected_total,
            item_total, person_total, "payout conservation violated"
        );
    }

    ConservationReport {
        expected_total: round_yuan(expected_total),
        item_total,
        person_total,
        ok,
    }
}
