use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::{PipelineError, Result};

/// The service caps batch creation at 100 rows per request; listing pages the
/// same way.
pub const BATCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct FormRef {
    pub app_id: String,
    pub entry_id: String,
}

/// Thin client for the form/database service. Only the two calls the
/// pipeline needs: paged entry listing and batch creation.
pub struct FormService {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl FormService {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Fetches every document of a form entry, following the `data_id`
    /// cursor until a short page.
    pub async fn fetch_entries(&self, form: &FormRef) -> Result<Vec<Value>> {
        let url = format!("{}/api/v5/app/entry/data/list", self.base_url);
        let mut entries: Vec<Value> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut payload = json!({
                "app_id": form.app_id,
                "entry_id": form.entry_id,
                "limit": BATCH_LIMIT,
            });
            if let Some(data_id) = &cursor {
                payload["data_id"] = json!(data_id);
            }

            let body: Value = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&payload)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            let batch = body
                .get("data")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let page_len = batch.len();
            cursor = batch
                .last()
                .and_then(|doc| doc.get("_id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            entries.extend(batch);

            if page_len < BATCH_LIMIT || cursor.is_none() {
                break;
            }
        }

        info!(count = entries.len(), entry = %form.entry_id, "fetched form entries");
        Ok(entries)
    }

    /// Creates rows in chunks of [`BATCH_LIMIT`], all chunks in flight
    /// together. Returns the created-row count the service reported.
    pub async fn batch_create(&self, form: &FormRef, rows: &[Value]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/api/v5/app/entry/data/batch_create", self.base_url);
        let requests = rows.chunks(BATCH_LIMIT).map(|chunk| {
            let payload = json!({
                "app_id": form.app_id,
                "entry_id": form.entry_id,
                "data_list": chunk,
            });
            let fallback = chunk.len();
            let client = self.client.clone();
            let token = self.token.clone();
            let url = url.clone();
            async move {
                let body: Value = client
                    .post(&url)
                    .bearer_auth(&token)
                    .json(&payload)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                let created = body
                    .get("success_count")
                    .and_then(Value::as_u64)
                    .map(|count| count as usize)
                    .unwrap_or(fallback);
                Ok::<usize, PipelineError>(created)
            }
        });

        let counts = try_join_all(requests).await?;
        let total = counts.into_iter().sum();
        info!(created = total, entry = %form.entry_id, "batch create finished");
        Ok(total)
    }
}

/// Re-keys label-keyed rows to widget ids and wraps each value the way the
/// service expects (`{"value": ...}`). Labels without a mapping pass through
/// under their own name.
pub fn apply_field_map(rows: &[Value], map: &BTreeMap<String, String>) -> Vec<Value> {
    rows.iter()
        .map(|row| {
            let Some(object) = row.as_object() else {
                return row.clone();
            };
            let mut mapped = Map::new();
            for (label, value) in object {
                let key = map.get(label).cloned().unwrap_or_else(|| label.clone());
                mapped.insert(key, json!({ "value": value }));
            }
            Value::Object(mapped)
        })
        .collect()
}
