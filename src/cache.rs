//! Content cache
//!
//! In-memory mirror of the remote catalog. Readers take cheap immutable
//! snapshots (`Arc<Catalog>`); every write goes through the mutation API,
//! which persists to the store first and only then mirrors the acknowledged
//! result into memory.
//!
//! Mutations run without locking, queuing or de-duplication: two writes to
//! the same record race and the last one to complete wins, as in the store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::{CatalogStore, StoreError, Table};
use crate::models::*;

// =============================================================================
// Errors
// =============================================================================

/// Cache operation kinds (for error reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Update,
    Delete,
    Upsert,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Load => write!(f, "load"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Upsert => write!(f, "upsert"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to {op} {table}: {source}")]
    Store {
        table: Table,
        op: Operation,
        source: StoreError,
    },

    #[error("Invalid {table} row: {source}")]
    Decode {
        table: Table,
        source: serde_json::Error,
    },

    #[error("Failed to encode {table} payload: {source}")]
    Encode {
        table: Table,
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn table(&self) -> Table {
        match self {
            CacheError::Store { table, .. }
            | CacheError::Decode { table, .. }
            | CacheError::Encode { table, .. } => *table,
        }
    }
}

// =============================================================================
// Entity plumbing
// =============================================================================

/// A catalog record type backed by one remote table
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const TABLE: Table;

    /// Column the store sorts by on load; `None` keeps arrival order
    const ORDER_BY: Option<&'static str> = None;

    type Patch: Serialize + Send + Sync;

    fn id(&self) -> &EntityId;

    /// Shallow field overwrite
    fn apply_patch(&mut self, patch: &Self::Patch);

    fn collection(catalog: &Catalog) -> &[Arc<Self>];

    fn collection_mut(catalog: &mut Catalog) -> &mut Vec<Arc<Self>>;
}

/// Create payload for an entity
pub trait Draft: Serialize + Send + Sync {
    type Entity: Entity;
}

/// Partial update for an entity
pub trait Patch: Serialize + Send + Sync {
    type Entity: Entity<Patch = Self>;
}

macro_rules! catalog_entity {
    ($entity:ty, $draft:ty, $patch:ty, $table:expr, $field:ident $(, order_by = $order:expr)?) => {
        impl Entity for $entity {
            const TABLE: Table = $table;
            $(const ORDER_BY: Option<&'static str> = Some($order);)?
            type Patch = $patch;

            fn id(&self) -> &EntityId {
                &self.id
            }

            fn apply_patch(&mut self, patch: &$patch) {
                self.apply(patch);
            }

            fn collection(catalog: &Catalog) -> &[Arc<Self>] {
                &catalog.$field
            }

            fn collection_mut(catalog: &mut Catalog) -> &mut Vec<Arc<Self>> {
                &mut catalog.$field
            }
        }

        impl Draft for $draft {
            type Entity = $entity;
        }

        impl Patch for $patch {
            type Entity = $entity;
        }
    };
}

catalog_entity!(Category, CategoryDraft, CategoryPatch, Table::Categories, categories);
catalog_entity!(Collection, CollectionDraft, CollectionPatch, Table::Collections, collections);
catalog_entity!(Meditation, MeditationDraft, MeditationPatch, Table::Meditations, meditations);
catalog_entity!(Episode, EpisodeDraft, EpisodePatch, Table::Episodes, episodes);
catalog_entity!(Miracle, MiracleDraft, MiraclePatch, Table::Miracles, miracles);
catalog_entity!(
    Banner,
    BannerDraft,
    BannerPatch,
    Table::Banners,
    banners,
    order_by = "sort_order"
);

// =============================================================================
// Catalog snapshot
// =============================================================================

/// Immutable view of every cached collection
///
/// Collections iterate in arrival order from the last full load, with
/// client-side creations appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    categories: Vec<Arc<Category>>,
    collections: Vec<Arc<Collection>>,
    meditations: Vec<Arc<Meditation>>,
    episodes: Vec<Arc<Episode>>,
    miracles: Vec<Arc<Miracle>>,
    banners: Vec<Arc<Banner>>,
    site_settings: SiteSettings,
}

/// Per-collection counts for the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub categories: usize,
    pub collections: usize,
    pub meditations: usize,
    pub miracles: usize,
}

impl Catalog {
    pub fn categories(&self) -> &[Arc<Category>] {
        &self.categories
    }

    pub fn collections(&self) -> &[Arc<Collection>] {
        &self.collections
    }

    pub fn meditations(&self) -> &[Arc<Meditation>] {
        &self.meditations
    }

    pub fn episodes(&self) -> &[Arc<Episode>] {
        &self.episodes
    }

    pub fn miracles(&self) -> &[Arc<Miracle>] {
        &self.miracles
    }

    /// Banners sorted by `sort_order` at load time
    pub fn banners(&self) -> &[Arc<Banner>] {
        &self.banners
    }

    pub fn site_settings(&self) -> &SiteSettings {
        &self.site_settings
    }

    /// Generic lookup by id
    pub fn get<E: Entity>(&self, id: &EntityId) -> Option<&Arc<E>> {
        E::collection(self).iter().find(|r| r.id() == id)
    }

    pub fn meditation(&self, id: &EntityId) -> Option<&Arc<Meditation>> {
        self.get::<Meditation>(id)
    }

    /// Episodes of one meditation, in arrival order
    ///
    /// Episodes pointing at a missing meditation are never listed.
    pub fn episodes_for(&self, meditation_id: &EntityId) -> Vec<Arc<Episode>> {
        if self.meditation(meditation_id).is_none() {
            return Vec::new();
        }
        self.episodes
            .iter()
            .filter(|e| &e.meditation_id == meditation_id)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            categories: self.categories.len(),
            collections: self.collections.len(),
            meditations: self.meditations.len(),
            miracles: self.miracles.len(),
        }
    }
}

// =============================================================================
// Load report
// =============================================================================

/// Outcome of an initial load: which collections degraded to empty
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub failures: Vec<LoadFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFailure {
    pub table: String,
    pub error: String,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, table: Table) -> bool {
        self.failures.iter().any(|f| f.table == table.name())
    }

    /// Unwrap one collection's result, recording a failure as empty
    fn take<T>(&mut self, table: Table, result: Result<Vec<T>, CacheError>) -> Vec<T> {
        match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!(table = %table, error = %e, "Collection failed to load, using empty");
                self.failures.push(LoadFailure {
                    table: table.name().to_string(),
                    error: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}

// =============================================================================
// Content cache
// =============================================================================

/// Single owned mirror of the remote catalog
pub struct ContentCache<S> {
    store: S,
    snapshot: RwLock<Arc<Catalog>>,
}

impl<S: CatalogStore> ContentCache<S> {
    /// Create an empty cache; call [`ContentCache::load`] to populate it
    pub fn new(store: S) -> Self {
        Self {
            store,
            snapshot: RwLock::new(Arc::new(Catalog::default())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current read-only snapshot
    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arc<Catalog>> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy-on-write edit: readers holding the old snapshot are unaffected
    fn mirror<R>(&self, edit: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut guard = self.write();
        edit(Arc::make_mut(&mut *guard))
    }

    /// Fetch every collection concurrently and replace the snapshot
    ///
    /// A failed read degrades only its own collection to empty.
    pub async fn load(&self) -> LoadReport {
        let (categories, collections, meditations, episodes, miracles, banners, settings) = tokio::join!(
            self.fetch::<Category>(),
            self.fetch::<Collection>(),
            self.fetch::<Meditation>(),
            self.fetch::<Episode>(),
            self.fetch::<Miracle>(),
            self.fetch::<Banner>(),
            self.fetch_settings(),
        );

        let mut report = LoadReport::default();
        let catalog = Catalog {
            categories: report.take(Table::Categories, categories),
            collections: report.take(Table::Collections, collections),
            meditations: report.take(Table::Meditations, meditations),
            episodes: report.take(Table::Episodes, episodes),
            miracles: report.take(Table::Miracles, miracles),
            banners: report.take(Table::Banners, banners),
            site_settings: SiteSettings::from_rows(report.take(Table::SiteSettings, settings)),
        };

        *self.write() = Arc::new(catalog);
        debug!(failures = report.failures.len(), "Catalog loaded");
        report
    }

    async fn fetch<E: Entity>(&self) -> Result<Vec<Arc<E>>, CacheError> {
        let rows = match E::ORDER_BY {
            Some(column) => self.store.select_ordered(E::TABLE, column).await,
            None => self.store.select_all(E::TABLE).await,
        }
        .map_err(|source| CacheError::Store {
            table: E::TABLE,
            op: Operation::Load,
            source,
        })?;

        rows.into_iter()
            .map(|row| decode::<E>(row).map(Arc::new))
            .collect()
    }

    async fn fetch_settings(&self) -> Result<Vec<SiteSetting>, CacheError> {
        let table = Table::SiteSettings;
        let rows = self
            .store
            .select_all(table)
            .await
            .map_err(|source| CacheError::Store {
                table,
                op: Operation::Load,
                source,
            })?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|source| CacheError::Decode { table, source })
            })
            .collect()
    }

    /// Persist a new record, then append the store's canonical row
    pub async fn create<D: Draft>(&self, draft: &D) -> Result<Arc<D::Entity>, CacheError> {
        let table = <D::Entity as Entity>::TABLE;
        let payload = serde_json::to_value(draft)
            .map_err(|source| CacheError::Encode { table, source })?;

        let row = self
            .store
            .insert(table, payload)
            .await
            .map_err(|source| store_failure(table, Operation::Create, source))?;

        let record = Arc::new(decode::<D::Entity>(row)?);
        self.mirror(|catalog| <D::Entity as Entity>::collection_mut(catalog).push(Arc::clone(&record)));
        debug!(table = %table, id = %record.id(), "Created");
        Ok(record)
    }

    /// Persist a partial update, then merge it into the matching record
    ///
    /// Returns the merged record, or `None` when the record left the cache
    /// while the call was pending (the result is dropped).
    pub async fn update<P: Patch>(
        &self,
        id: &EntityId,
        patch: &P,
    ) -> Result<Option<Arc<P::Entity>>, CacheError> {
        let table = <P::Entity as Entity>::TABLE;
        let payload = serde_json::to_value(patch)
            .map_err(|source| CacheError::Encode { table, source })?;

        self.store
            .update(table, id, payload)
            .await
            .map_err(|source| store_failure(table, Operation::Update, source))?;

        let merged = self.mirror(|catalog| {
            let slot = <P::Entity as Entity>::collection_mut(catalog)
                .iter_mut()
                .find(|r| r.id() == id)?;
            let mut next = (**slot).clone();
            next.apply_patch(patch);
            *slot = Arc::new(next);
            Some(Arc::clone(slot))
        });

        match &merged {
            Some(_) => debug!(table = %table, id = %id, "Updated"),
            None => debug!(table = %table, id = %id, "Update acknowledged for uncached record"),
        }
        Ok(merged)
    }

    /// Persist a delete, then drop the record from memory
    pub async fn delete<E: Entity>(&self, id: &EntityId) -> Result<(), CacheError> {
        let table = E::TABLE;
        self.store
            .delete(table, id)
            .await
            .map_err(|source| store_failure(table, Operation::Delete, source))?;

        self.mirror(|catalog| E::collection_mut(catalog).retain(|r| r.id() != id));
        debug!(table = %table, id = %id, "Deleted");
        Ok(())
    }

    /// Upsert a site setting by key and mirror it into the settings map
    pub async fn set_site_setting(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let table = Table::SiteSettings;
        self.store
            .upsert(table, json!({ "key": key, "value": value }), "key")
            .await
            .map_err(|source| store_failure(table, Operation::Upsert, source))?;

        self.mirror(|catalog| catalog.site_settings.set(key, value));
        debug!(key, "Site setting saved");
        Ok(())
    }
}

fn decode<E: Entity>(row: Value) -> Result<E, CacheError> {
    serde_json::from_value(row).map_err(|source| CacheError::Decode {
        table: E::TABLE,
        source,
    })
}

fn store_failure(table: Table, op: Operation, source: StoreError) -> CacheError {
    error!(table = %table, op = %op, error = %source, "Store write failed");
    CacheError::Store { table, op, source }
}
