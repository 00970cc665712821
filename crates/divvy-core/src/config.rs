use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::allocation::RoleSplitTable;
use crate::daily::PublishCutoffs;
use crate::error::Result;
use crate::roster::RegistryFieldMap;
use crate::scoring::MetricWeights;
use crate::upload::FormRef;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DivvyConfig {
    pub paths: PathsConfig,
    pub filters: FilterConfig,
    pub weights: MetricWeights,
    pub pool: PoolConfig,
    pub split: RoleSplitTable,
    pub form: FormConfig,
}

impl DivvyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DivvyConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob over the raw platform export files dropped by the scraper runs.
    pub exports: String,
    pub today_snapshot: PathBuf,
    pub previous_snapshot: PathBuf,
    pub leads: PathBuf,
    /// Local registry JSON export; when unset the registry is fetched live.
    pub roster: Option<PathBuf>,
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            exports: "data/exports/*.csv".to_string(),
            today_snapshot: PathBuf::from("data/snapshot_today.csv"),
            previous_snapshot: PathBuf::from("data/snapshot_previous.csv"),
            leads: PathBuf::from("data/leads.csv"),
            roster: None,
            reports_dir: PathBuf::from("reports"),
        }
    }
}

/// Content published before the dividend scheme started never earns; the
/// two platforms onboarded on different dates.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub douyin_min_published: NaiveDate,
    pub xiaohongshu_min_published: NaiveDate,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            douyin_min_published: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap_or_default(),
            xiaohongshu_min_published: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap_or_default(),
        }
    }
}

impl FilterConfig {
    pub fn cutoffs(&self) -> PublishCutoffs {
        PublishCutoffs {
            douyin: self.douyin_min_published,
            xiaohongshu: self.xiaohongshu_min_published,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Smallest indivisible payout slice.
    pub unit_yuan: f64,
    /// What one CRM lead adds to the pool.
    pub lead_price_yuan: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            unit_yuan: 50.0,
            lead_price_yuan: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub base_url: String,
    /// Name of the environment variable carrying the API token.
    pub api_key_env: String,
    pub registry: FormRef,
    pub payouts: FormRef,
    pub daily_metrics: FormRef,
    pub registry_fields: RegistryFieldMap,
    /// label → widget id for the payout push; empty sends labels as-is.
    pub payout_fields: BTreeMap<String, String>,
    pub daily_fields: BTreeMap<String, String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        let app_id = "67c280b7c6387c4f4afd50ae".to_string();
        Self {
            base_url: "https://api.jiandaoyun.com".to_string(),
            api_key_env: "DIVVY_FORM_TOKEN".to_string(),
            registry: FormRef {
                app_id: app_id.clone(),
                entry_id: "67c2816ffa795e84a8fe45b9".to_string(),
            },
            payouts: FormRef {
                app_id: app_id.clone(),
                entry_id: "67d7097d08e5f607c4cfd028".to_string(),
            },
            daily_metrics: FormRef {
                app_id,
                entry_id: "67c69341ea7d25979a4d9e8b".to_string(),
            },
            registry_fields: RegistryFieldMap::default(),
            payout_fields: BTreeMap::new(),
            daily_fields: BTreeMap::new(),
        }
    }
}
