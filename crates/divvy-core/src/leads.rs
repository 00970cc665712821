use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::{PipelineError, Result};

/// One lead-count line from the CRM hand-off file. SQL connectivity stays on
/// the other side of this contract; whatever query produced the file already
/// scoped it to the report period.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadRecord {
    pub date: NaiveDate,
    pub source: String,
    pub leads: i64,
}

pub fn read_leads(path: &Path) -> Result<Vec<LeadRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: LeadRecord = result?;
        if record.leads < 0 {
            return Err(PipelineError::Validation(format!(
                "negative lead count {} for source '{}' on {}",
                record.leads, record.source, record.date
            )));
        }
        records.push(record);
    }

    Ok(records)
}

/// The dividend pool: every lead is worth a fixed price.
pub fn pool_from_leads(records: &[LeadRecord], lead_price_yuan: f64) -> f64 {
    let total_leads: i64 = records.iter().map(|record| record.leads).sum();
    let pool = total_leads as f64 * lead_price_yuan;
    info!(total_leads, pool_yuan = pool, "derived dividend pool");
    pool
}
