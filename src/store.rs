use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::error;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Thin client for the Supabase PostgREST interface. Every operation is a
/// single HTTP round-trip: no retries, no transaction scoping. Filters are
/// equality-only, mirroring what the API layer needs.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
}

/// One `col=eq.val` query pair per equality filter.
fn eq_filters(filters: &[(&str, &str)]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(column, value)| (column.to_string(), format!("eq.{}", value)))
        .collect()
}

/// Builds the query string for a select: `select=*`, the equality filters,
/// and an optional ascending `order` key.
fn select_query(filters: &[(&str, &str)], order: Option<&str>) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    query.extend(eq_filters(filters));
    if let Some(column) = order {
        query.push(("order".to_string(), format!("{}.asc", column)));
    }
    query
}

impl SupabaseStore {
    /// Creates a store client from the Supabase credentials in `config`.
    /// Panics on a malformed key, which only happens with broken env input
    /// and is caught at startup.
    pub fn new(config: &Config) -> Self {
        let mut headers = HeaderMap::new();
        let key =
            HeaderValue::from_str(&config.supabase_key).expect("SUPABASE_KEY is not a valid header");
        headers.insert("apikey", key);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.supabase_key))
            .expect("SUPABASE_KEY is not a valid header");
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("failed to build http client");

        Self {
            client,
            base_url: format!("{}/rest/v1", config.supabase_url.trim_end_matches('/')),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn rows(&self, response: reqwest::Response, op: &str) -> AppResult<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("supabase {} error: {} {}", op, status, body);
            return Err(AppError::StoreRejected(format!(
                "store {} failed: {} {}",
                op, status, body
            )));
        }
        Ok(response.json::<Vec<Value>>().await?)
    }

    /// Inserts a row and returns the inserted row(s).
    pub async fn insert(&self, table: &str, record: &Value) -> AppResult<Vec<Value>> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        self.rows(response, "insert").await
    }

    /// Inserts a row, replacing any existing row that collides on
    /// `conflict_column`. A single store call, so concurrent writers on the
    /// same key resolve to last-write-wins.
    pub async fn upsert(
        &self,
        table: &str,
        record: &Value,
        conflict_column: &str,
    ) -> AppResult<Vec<Value>> {
        let response = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", conflict_column)])
            .header("Prefer", "return=representation,resolution=merge-duplicates")
            .json(record)
            .send()
            .await?;
        self.rows(response, "upsert").await
    }

    /// Selects rows matching every equality filter, optionally ordered
    /// ascending by `order`.
    pub async fn select(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        order: Option<&str>,
    ) -> AppResult<Vec<Value>> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&select_query(filters, order))
            .send()
            .await?;
        self.rows(response, "select").await
    }

    /// Selects at most one row; `None` when nothing matches.
    pub async fn select_single(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> AppResult<Option<Value>> {
        let mut rows = self.select(table, filters, None).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Applies `patch` to every row matching the filters and returns the
    /// updated rows.
    pub async fn update(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        patch: &Value,
    ) -> AppResult<Vec<Value>> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&eq_filters(filters))
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        self.rows(response, "update").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_query_encodes_equality_filters() {
        let query = select_query(&[("tracking_id", "abc-123")], None);
        assert_eq!(
            query,
            vec![
                ("select".to_string(), "*".to_string()),
                ("tracking_id".to_string(), "eq.abc-123".to_string()),
            ]
        );
    }

    #[test]
    fn update_filters_use_the_same_encoding() {
        let query = eq_filters(&[("id", "42"), ("status", "busy")]);
        assert_eq!(
            query,
            vec![
                ("id".to_string(), "eq.42".to_string()),
                ("status".to_string(), "eq.busy".to_string()),
            ]
        );
    }

    #[test]
    fn select_query_appends_ascending_order() {
        let query = select_query(&[("order_id", "7")], Some("created_at"));
        assert_eq!(query.last().unwrap().1, "created_at.asc");
    }
}
