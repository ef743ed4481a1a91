//! HTTP catalog store
//!
//! Talks to a PostgREST-style table API (`/rest/v1`) and an object storage
//! API (`/storage/v1`) sharing one base URL and API key.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use super::{BlobStore, CatalogStore, StoreError, StoreResult, Table};
use crate::models::EntityId;

/// REST-backed catalog + blob store
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl RestStore {
    /// Create a store for `base_url` authenticated with the public API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            // No explicit timeout: remote calls use the transport default
            client: reqwest::Client::new(),
        }
    }

    /// Act on behalf of a signed-in user (required for writes under RLS)
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    /// Fail on non-success status, keeping the server's message
    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(StoreError::Unauthorized(message));
        }
        Err(StoreError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn json_rows(response: Response) -> StoreResult<Vec<Value>> {
        let body = Self::check(response).await?.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// First row of a `return=representation` response
    fn first_row(rows: Vec<Value>, table: Table) -> StoreResult<Value> {
        rows.into_iter().next().ok_or_else(|| {
            StoreError::InvalidResponse(format!("{} write returned no rows", table))
        })
    }
}

#[async_trait]
impl CatalogStore for RestStore {
    async fn select_all(&self, table: Table) -> StoreResult<Vec<Value>> {
        let url = format!("{}?select=*", self.table_url(table));
        let response = self.request(Method::GET, &url).send().await?;
        Self::json_rows(response).await
    }

    async fn select_ordered(&self, table: Table, column: &str) -> StoreResult<Vec<Value>> {
        let url = format!(
            "{}?select=*&order={}.asc",
            self.table_url(table),
            urlencoding::encode(column)
        );
        let response = self.request(Method::GET, &url).send().await?;
        Self::json_rows(response).await
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        let response = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![row]))
            .send()
            .await?;
        let rows = Self::json_rows(response).await?;
        Self::first_row(rows, table)
    }

    async fn update(&self, table: Table, id: &EntityId, patch: Value) -> StoreResult<()> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(&id.to_string())
        );
        let response = self.request(Method::PATCH, &url).json(&patch).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &EntityId) -> StoreResult<()> {
        let url = format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(&id.to_string())
        );
        let response = self.request(Method::DELETE, &url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, conflict_column: &str) -> StoreResult<Value> {
        let url = format!(
            "{}?on_conflict={}",
            self.table_url(table),
            urlencoding::encode(conflict_column)
        );
        let response = self
            .request(Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&Value::Array(vec![row]))
            .send()
            .await?;
        let rows = Self::json_rows(response).await?;
        Self::first_row(rows, table)
    }
}

#[async_trait]
impl BlobStore for RestStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<()> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);
        let response = self
            .request(Method::POST, &url)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }
}

/// Pull `message` (or `error`) out of a JSON error body, else return it raw
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
