//! In-process catalog store
//!
//! Keeps rows as JSON in memory with store-assigned integer ids. Used by the
//! CLI `--demo` mode and to exercise the cache without a network. Individual
//! tables can be switched to failing, and calls can be delayed, to drive the
//! failure and ordering paths of callers.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{BlobStore, CatalogStore, StoreError, StoreResult, Table};
use crate::models::EntityId;

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, Vec<Value>>,
    next_id: i64,
    failing: HashSet<Table>,
    latency: HashMap<Table, Duration>,
    uploads_failing: bool,
    blobs: HashMap<String, Vec<u8>>,
}

/// Catalog + blob store held entirely in memory
pub struct MemoryStore {
    inner: Mutex<Inner>,
    public_base: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Default::default()
            }),
            public_base: "memory://".to_string(),
        }
    }

    /// Store seeded with the bundled demo catalog
    pub fn demo() -> Self {
        let store = Self::new();
        for (table, rows) in demo_rows() {
            store.seed(table, rows);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace a table's rows; ids already present are honoured
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut inner = self.lock();
        let max_id = rows
            .iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        inner.next_id = inner.next_id.max(max_id + 1);
        inner.tables.insert(table, rows);
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Make every call touching `table` fail (or succeed again)
    pub fn set_failing(&self, table: Table, failing: bool) {
        let mut inner = self.lock();
        if failing {
            inner.failing.insert(table);
        } else {
            inner.failing.remove(&table);
        }
    }

    /// Delay calls on `table`; the delay is read when a call starts
    pub fn set_latency(&self, table: Table, latency: Duration) {
        self.lock().latency.insert(table, latency);
    }

    pub fn set_uploads_failing(&self, failing: bool) {
        self.lock().uploads_failing = failing;
    }

    /// Uploaded bytes for `bucket/path`
    pub fn blob(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.lock().blobs.get(&blob_key(bucket, path)).cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.lock().blobs.len()
    }

    /// Common call prologue: honour latency, then injected failure
    async fn enter(&self, table: Table, op: &str) -> StoreResult<()> {
        let latency = self.lock().latency.get(&table).copied();
        if let Some(latency) = latency.filter(|d| !d.is_zero()) {
            tokio::time::sleep(latency).await;
        }
        if self.lock().failing.contains(&table) {
            return Err(StoreError::Unavailable(format!("{} {} failed", table, op)));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn select_all(&self, table: Table) -> StoreResult<Vec<Value>> {
        self.enter(table, "select").await?;
        Ok(self.rows(table))
    }

    async fn select_ordered(&self, table: Table, column: &str) -> StoreResult<Vec<Value>> {
        self.enter(table, "select").await?;
        let mut rows = self.rows(table);
        rows.sort_by_key(|r| r.get(column).and_then(Value::as_i64).unwrap_or(i64::MAX));
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        self.enter(table, "insert").await?;
        let mut object = into_object(row)?;

        let mut inner = self.lock();
        if !object.contains_key("id") && table != Table::SiteSettings {
            let id = inner.next_id;
            inner.next_id += 1;
            object.insert("id".to_string(), Value::from(id));
        }
        let row = Value::Object(object);
        inner.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: &EntityId, patch: Value) -> StoreResult<()> {
        self.enter(table, "update").await?;
        let patch = into_object(patch)?;
        let id = id_value(id);

        let mut inner = self.lock();
        for row in inner.tables.entry(table).or_default().iter_mut() {
            if row.get("id") == Some(&id) {
                if let Value::Object(fields) = row {
                    for (k, v) in &patch {
                        fields.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &EntityId) -> StoreResult<()> {
        self.enter(table, "delete").await?;
        let id = id_value(id);
        self.lock()
            .tables
            .entry(table)
            .or_default()
            .retain(|row| row.get("id") != Some(&id));
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, conflict_column: &str) -> StoreResult<Value> {
        self.enter(table, "upsert").await?;
        let object = into_object(row)?;
        let key = object.get(conflict_column).cloned();

        let mut inner = self.lock();
        let rows = inner.tables.entry(table).or_default();
        let position = key
            .as_ref()
            .and_then(|k| rows.iter().position(|r| r.get(conflict_column) == Some(k)));
        match position {
            Some(i) => {
                if let Value::Object(fields) = &mut rows[i] {
                    for (k, v) in object {
                        fields.insert(k, v);
                    }
                }
                Ok(rows[i].clone())
            }
            None => {
                let row = Value::Object(object);
                rows.push(row.clone());
                Ok(row)
            }
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.uploads_failing {
            return Err(StoreError::Unavailable(format!(
                "upload to {} rejected",
                bucket
            )));
        }
        inner.blobs.insert(blob_key(bucket, path), bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}{}", self.public_base, blob_key(bucket, path))
    }
}

fn blob_key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path)
}

fn into_object(value: Value) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn id_value(id: &EntityId) -> Value {
    match id {
        EntityId::Int(n) => Value::from(*n),
        EntityId::Text(s) => Value::from(s.as_str()),
    }
}

/// Bundled demo catalog
fn demo_rows() -> Vec<(Table, Vec<Value>)> {
    vec![
        (
            Table::Categories,
            vec![
                json!({"id": 1, "name": "Talks", "icon": "./Categories/Talks.svg"}),
                json!({"id": 2, "name": "Meditation", "icon": "./Categories/meditation.svg"}),
                json!({"id": 3, "name": "Music", "icon": "./Categories/Music.svg"}),
                json!({"id": 4, "name": "Webcast", "icon": "./Categories/Webcast.svg"}),
                json!({"id": 5, "name": "Podcast", "icon": "./Categories/Podcast.svg"}),
            ],
        ),
        (
            Table::Collections,
            vec![
                json!({"id": 1, "title": "Morning Clarity", "sessions": 12, "image": "./Trending/morning.png"}),
                json!({"id": 2, "title": "Deep Sleep", "sessions": 8, "image": "./Trending/sleep.png"}),
                json!({"id": 3, "title": "Anxiety Release", "sessions": 5, "image": "./Trending/anxiety.png"}),
                json!({"id": 4, "title": "Focus Flow", "sessions": 10, "image": "./Trending/focus.png"}),
            ],
        ),
        (
            Table::Meditations,
            vec![
                json!({
                    "id": 1,
                    "title": "Chit Shakti for success",
                    "description": "Unlock essential qualities for success",
                    "image": "./Meditation/meditation-1.png",
                    "duration": "15 Mins"
                }),
                json!({
                    "id": 2,
                    "title": "Chit Shakti for abundance",
                    "description": "Open up to abundance in every area of life",
                    "image": "./Meditation/meditation-2.png",
                    "duration": "15 Mins"
                }),
            ],
        ),
        (
            Table::Episodes,
            vec![
                json!({
                    "id": 1,
                    "meditation_id": 1,
                    "title": "Guided introduction",
                    "description": "Settle in and begin",
                    "image": null,
                    "media_type": "video",
                    "media_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                    "duration": "12:04"
                }),
                json!({
                    "id": 2,
                    "meditation_id": 1,
                    "title": "Breath practice",
                    "description": "Audio-only session",
                    "image": null,
                    "media_type": "audio",
                    "media_url": "https://example.com/audio/breath.mp3",
                    "duration": "15:00"
                }),
            ],
        ),
        (
            Table::Miracles,
            vec![
                json!({
                    "id": 1,
                    "quote": "I noticed more understanding and calmness in our conversations.",
                    "image": "./Miracle/miracle-1.png",
                    "title": "A Story of Karthick",
                    "artist": "Sri Amma Bhagavan",
                    "audio": "",
                    "youtubelink": ""
                }),
                json!({
                    "id": 2,
                    "quote": "I noticed more understanding and calmness in our conversations.",
                    "image": "./Miracle/miracle-2.png",
                    "title": "Journey to Inner Peace",
                    "artist": "Priya S",
                    "audio": "",
                    "youtubelink": ""
                }),
            ],
        ),
        (Table::SiteSettings, vec![]),
        (Table::Banners, vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store
            .insert(Table::Categories, json!({"name": "A"}))
            .await
            .unwrap();
        let b = store
            .insert(Table::Categories, json!({"name": "B"}))
            .await
            .unwrap();
        assert_eq!(a["id"], json!(1));
        assert_eq!(b["id"], json!(2));
    }

    #[tokio::test]
    async fn test_seed_moves_id_counter_past_existing_rows() {
        let store = MemoryStore::new();
        store.seed(Table::Categories, vec![json!({"id": 41, "name": "Old"})]);
        let row = store
            .insert(Table::Categories, json!({"name": "New"}))
            .await
            .unwrap();
        assert_eq!(row["id"], json!(42));
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_key() {
        let store = MemoryStore::new();
        store
            .upsert(Table::SiteSettings, json!({"key": "site_logo", "value": "a"}), "key")
            .await
            .unwrap();
        store
            .upsert(Table::SiteSettings, json!({"key": "site_logo", "value": "b"}), "key")
            .await
            .unwrap();
        let rows = store.rows(Table::SiteSettings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["value"], json!("b"));
    }

    #[tokio::test]
    async fn test_failing_table() {
        let store = MemoryStore::new();
        store.set_failing(Table::Miracles, true);
        assert!(store.select_all(Table::Miracles).await.is_err());
        assert!(store.select_all(Table::Categories).await.is_ok());
    }

    #[tokio::test]
    async fn test_select_ordered() {
        let store = MemoryStore::new();
        store.seed(
            Table::Banners,
            vec![
                json!({"id": 1, "image_url": "b", "sort_order": 2}),
                json!({"id": 2, "image_url": "a", "sort_order": 1}),
            ],
        );
        let rows = store.select_ordered(Table::Banners, "sort_order").await.unwrap();
        assert_eq!(rows[0]["image_url"], json!("a"));
    }

    #[test]
    fn test_demo_seed_has_catalog() {
        let store = MemoryStore::demo();
        assert_eq!(store.rows(Table::Categories).len(), 5);
        assert_eq!(store.rows(Table::Collections).len(), 4);
        assert_eq!(store.rows(Table::Miracles).len(), 2);
    }
}
