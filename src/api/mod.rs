//! Catalog store boundary
//!
//! - `CatalogStore`: table-like read/insert/update/delete over JSON rows
//! - `BlobStore`: asset upload and public URL lookup
//! - `IdentityProvider`: signed-in user and role
//!
//! Implementations:
//! - `rest`: PostgREST-style HTTP backend
//! - `memory`: in-process store for demos and tests
//! - `auth`: session and role client

pub mod auth;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::models::EntityId;

pub use auth::{AuthClient, AuthError, Role, Session, User};
pub use memory::MemoryStore;
pub use rest::RestStore;

/// Remote tables backing the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Categories,
    Collections,
    Meditations,
    Episodes,
    Miracles,
    SiteSettings,
    Banners,
    Profiles,
}

impl Table {
    /// Remote table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::Categories => "categories",
            Table::Collections => "collections",
            Table::Meditations => "meditations",
            Table::Episodes => "episodes",
            Table::Miracles => "miracles",
            Table::SiteSettings => "site_settings",
            Table::Banners => "banners",
            Table::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors from the remote store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failure raised by a non-HTTP store (e.g. injected in the memory store)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Table-like access to the persisted catalog
///
/// Rows cross this boundary as JSON objects; typing happens in the cache.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Select every row of a table in store order
    async fn select_all(&self, table: Table) -> StoreResult<Vec<Value>>;

    /// Select every row ordered ascending by `column`
    async fn select_ordered(&self, table: Table, column: &str) -> StoreResult<Vec<Value>>;

    /// Insert one row and return its canonical representation
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value>;

    /// Apply a partial update to the row matching `id`
    async fn update(&self, table: Table, id: &EntityId, patch: Value) -> StoreResult<()>;

    /// Delete the row matching `id`
    async fn delete(&self, table: Table, id: &EntityId) -> StoreResult<()>;

    /// Insert or replace the row whose `conflict_column` matches
    async fn upsert(&self, table: Table, row: Value, conflict_column: &str) -> StoreResult<Value>;
}

/// Binary asset storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<()>;

    /// Public URL for an uploaded object (no network call)
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Session and role lookup
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<User>, AuthError>;

    /// Role attribute for a user; `None` when no profile row exists
    async fn fetch_role(&self, user_id: &str) -> Result<Option<Role>, AuthError>;
}

#[async_trait]
impl<T: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<T> {
    async fn select_all(&self, table: Table) -> StoreResult<Vec<Value>> {
        (**self).select_all(table).await
    }

    async fn select_ordered(&self, table: Table, column: &str) -> StoreResult<Vec<Value>> {
        (**self).select_ordered(table, column).await
    }

    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value> {
        (**self).insert(table, row).await
    }

    async fn update(&self, table: Table, id: &EntityId, patch: Value) -> StoreResult<()> {
        (**self).update(table, id, patch).await
    }

    async fn delete(&self, table: Table, id: &EntityId) -> StoreResult<()> {
        (**self).delete(table, id).await
    }

    async fn upsert(&self, table: Table, row: Value, conflict_column: &str) -> StoreResult<Value> {
        (**self).upsert(table, row, conflict_column).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<()> {
        (**self).upload(bucket, path, bytes, content_type).await
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        (**self).public_url(bucket, path)
    }
}
