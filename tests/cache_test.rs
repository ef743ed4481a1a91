//! Content cache tests
//!
//! Drives the cache against the in-memory store with failure and latency
//! injection: failed writes leave the snapshot untouched, successful writes
//! mirror the store's canonical rows, and unaffected records keep identity.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use stillpoint::api::{MemoryStore, Table};
use stillpoint::cache::{CacheError, ContentCache};
use stillpoint::models::{
    Banner, BannerDraft, BannerPatch, Category, CategoryDraft, CategoryPatch, Collection,
    CollectionPatch, EntityId, Episode, MiracleDraft, MiraclePatch, Miracle, SITE_LOGO_KEY,
};

async fn demo_cache() -> ContentCache<MemoryStore> {
    let cache = ContentCache::new(MemoryStore::demo());
    let report = cache.load().await;
    assert!(report.is_complete());
    cache
}

// =============================================================================
// Load
// =============================================================================

#[tokio::test]
async fn test_load_populates_every_collection() {
    let cache = demo_cache().await;
    let catalog = cache.snapshot();

    assert_eq!(catalog.categories().len(), 5);
    assert_eq!(catalog.collections().len(), 4);
    assert_eq!(catalog.meditations().len(), 2);
    assert_eq!(catalog.episodes().len(), 2);
    assert_eq!(catalog.miracles().len(), 2);
    assert!(catalog.banners().is_empty());

    let stats = catalog.stats();
    assert_eq!(stats.categories, 5);
    assert_eq!(stats.miracles, 2);
}

#[tokio::test]
async fn test_failed_read_degrades_only_that_collection() {
    let store = MemoryStore::demo();
    store.set_failing(Table::Episodes, true);
    let cache = ContentCache::new(store);

    let report = cache.load().await;

    assert!(!report.is_complete());
    assert!(report.failed(Table::Episodes));
    assert!(!report.failed(Table::Miracles));
    assert_eq!(report.failures.len(), 1);

    let catalog = cache.snapshot();
    assert!(catalog.episodes().is_empty());
    assert_eq!(catalog.miracles().len(), 2);
    assert_eq!(catalog.collections().len(), 4);
}

#[tokio::test]
async fn test_banners_load_in_sort_order() {
    let store = MemoryStore::demo();
    store.seed(
        Table::Banners,
        vec![
            json!({"id": 10, "image_url": "c.png", "sort_order": 3, "is_active": true}),
            json!({"id": 11, "image_url": "a.png", "sort_order": 1, "is_active": true}),
            json!({"id": 12, "image_url": "b.png", "sort_order": 2, "is_active": false}),
        ],
    );
    let cache = ContentCache::new(store);
    cache.load().await;

    let orders: Vec<i32> = cache.snapshot().banners().iter().map(|b| b.sort_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_episodes_for_skips_dangling_parent() {
    let store = MemoryStore::demo();
    let mut episodes = store.rows(Table::Episodes);
    episodes.push(json!({
        "id": 99,
        "meditation_id": 404,
        "title": "Orphan",
        "media_type": "audio",
        "media_url": "https://example.com/o.mp3"
    }));
    store.seed(Table::Episodes, episodes);
    let cache = ContentCache::new(store);
    cache.load().await;

    let catalog = cache.snapshot();
    assert_eq!(catalog.episodes().len(), 3);
    assert!(catalog.episodes_for(&EntityId::Int(404)).is_empty());

    let titles: Vec<_> = catalog
        .episodes_for(&EntityId::Int(1))
        .iter()
        .map(|e| e.title.clone())
        .collect();
    assert_eq!(titles, vec!["Guided introduction", "Breath practice"]);
}

#[tokio::test]
async fn test_rows_with_null_columns_still_load() {
    let store = MemoryStore::demo();
    store.seed(
        Table::Collections,
        vec![
            json!({"id": 1, "title": "Deep Sleep", "sessions": 8, "image": "a.png"}),
            json!({"id": 2, "title": "Untitled", "sessions": null, "image": null}),
        ],
    );
    store.seed(
        Table::Miracles,
        vec![
            json!({"id": 1, "title": "Healing", "artist": "Priya", "quote": "Calm", "image": "m.png"}),
            json!({"id": 2, "title": null, "artist": null, "quote": null, "image": "n.png", "audio": null}),
        ],
    );
    let cache = ContentCache::new(store);

    let report = cache.load().await;
    assert!(report.is_complete());

    let catalog = cache.snapshot();
    assert_eq!(catalog.collections().len(), 2);
    assert_eq!(catalog.collections()[1].session_count, 0);
    assert_eq!(catalog.miracles().len(), 2);
    assert_eq!(catalog.miracles()[1].quote, "");
}

// =============================================================================
// Failed writes leave the snapshot unchanged
// =============================================================================

#[tokio::test]
async fn test_failed_create_leaves_snapshot_unchanged() {
    let cache = demo_cache().await;
    let before = cache.snapshot();
    cache.store().set_failing(Table::Miracles, true);

    let draft = MiracleDraft {
        title: "New".into(),
        artist: "Someone".into(),
        quote: "".into(),
        image: "".into(),
        audio: None,
        youtube_link: None,
    };
    let err = cache.create(&draft).await.unwrap_err();

    assert!(matches!(err, CacheError::Store { table: Table::Miracles, .. }));
    assert_eq!(*cache.snapshot(), *before);
    assert!(Arc::ptr_eq(&cache.snapshot(), &before));
}

#[tokio::test]
async fn test_failed_update_leaves_snapshot_unchanged() {
    let cache = demo_cache().await;
    let before = cache.snapshot();
    cache.store().set_failing(Table::Collections, true);

    let patch = CollectionPatch {
        title: Some("Renamed".into()),
        ..Default::default()
    };
    assert!(cache.update(&EntityId::Int(1), &patch).await.is_err());

    assert_eq!(*cache.snapshot(), *before);
    assert_eq!(cache.snapshot().collections()[0].title, "Morning Clarity");
}

#[tokio::test]
async fn test_failed_delete_leaves_snapshot_unchanged() {
    let cache = demo_cache().await;
    let before = cache.snapshot();
    cache.store().set_failing(Table::Categories, true);

    let err = cache.delete::<Category>(&EntityId::Int(2)).await.unwrap_err();

    assert_eq!(err.table(), Table::Categories);
    assert_eq!(*cache.snapshot(), *before);
    assert_eq!(cache.snapshot().categories().len(), 5);
}

#[tokio::test]
async fn test_failed_setting_leaves_settings_unchanged() {
    let cache = demo_cache().await;
    cache.store().set_failing(Table::SiteSettings, true);

    assert!(cache.set_site_setting(SITE_LOGO_KEY, "logo.png").await.is_err());
    assert!(cache.snapshot().site_settings().site_logo().is_none());
}

// =============================================================================
// Successful writes
// =============================================================================

#[tokio::test]
async fn test_create_appends_store_assigned_record() {
    let cache = demo_cache().await;
    let before = cache.snapshot().categories().len();

    let created = cache
        .create(&CategoryDraft {
            name: "Sleep".into(),
            icon: "moon.svg".into(),
        })
        .await
        .unwrap();

    let catalog = cache.snapshot();
    assert_eq!(catalog.categories().len(), before + 1);
    let last = catalog.categories().last().unwrap();
    assert_eq!(last.id, created.id);
    assert_eq!(last.name, "Sleep");

    let stored = cache.store().rows(Table::Categories);
    let stored_id = stored.last().unwrap().get("id").cloned().unwrap();
    assert_eq!(serde_json::to_value(&created.id).unwrap(), stored_id);
}

#[tokio::test]
async fn test_update_replaces_only_the_target_record() {
    let cache = demo_cache().await;
    let before = cache.snapshot();

    let patch = MiraclePatch {
        artist: Some("Karthick".into()),
        ..Default::default()
    };
    let merged = cache
        .update(&EntityId::Int(1), &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged.artist, "Karthick");
    assert_eq!(merged.title, "A Story of Karthick");

    let after = cache.snapshot();
    assert!(!Arc::ptr_eq(&before.miracles()[0], &after.miracles()[0]));
    assert!(Arc::ptr_eq(&before.miracles()[1], &after.miracles()[1]));
    assert!(Arc::ptr_eq(&before.collections()[0], &after.collections()[0]));

    // Readers holding the old snapshot keep seeing the old record
    assert_eq!(before.miracles()[0].artist, "Sri Amma Bhagavan");
}

#[tokio::test]
async fn test_delete_removes_record() {
    let cache = demo_cache().await;
    cache.delete::<Miracle>(&EntityId::Int(2)).await.unwrap();

    let catalog = cache.snapshot();
    assert_eq!(catalog.miracles().len(), 1);
    assert!(catalog.get::<Miracle>(&EntityId::Int(2)).is_none());
    assert_eq!(cache.store().rows(Table::Miracles).len(), 1);
}

#[tokio::test]
async fn test_delete_missing_id_is_noop() {
    let cache = demo_cache().await;
    let before = cache.snapshot();
    cache.delete::<Episode>(&EntityId::Int(777)).await.unwrap();
    assert_eq!(*cache.snapshot(), *before);
}

#[tokio::test]
async fn test_banner_crud() {
    let cache = demo_cache().await;

    let banner = cache
        .create(&BannerDraft {
            image_url: "https://cdn.example.com/b.png".into(),
            title: Some("Spring".into()),
            sort_order: 1,
            is_active: true,
        })
        .await
        .unwrap();

    let patch = BannerPatch {
        is_active: Some(false),
        ..Default::default()
    };
    let updated = cache.update(&banner.id, &patch).await.unwrap().unwrap();
    assert!(!updated.is_active);

    cache.delete::<Banner>(&banner.id).await.unwrap();
    assert!(cache.snapshot().banners().is_empty());
}

#[tokio::test]
async fn test_site_setting_upsert_mirrors_value() {
    let cache = demo_cache().await;

    cache.set_site_setting(SITE_LOGO_KEY, "one.png").await.unwrap();
    cache.set_site_setting(SITE_LOGO_KEY, "two.png").await.unwrap();

    assert_eq!(cache.snapshot().site_settings().site_logo(), Some("two.png"));
    assert_eq!(cache.store().rows(Table::SiteSettings).len(), 1);
}

// =============================================================================
// Concurrent writes
// =============================================================================

#[tokio::test]
async fn test_update_for_record_deleted_meanwhile_is_dropped() {
    let cache = demo_cache().await;
    cache
        .store()
        .set_latency(Table::Categories, Duration::from_millis(50));

    let patch = CategoryPatch {
        name: Some("Late".into()),
        ..Default::default()
    };
    let id = EntityId::Int(3);

    let (updated, deleted) = futures::future::join(cache.update(&id, &patch), async {
        cache.store().set_latency(Table::Categories, Duration::ZERO);
        cache.delete::<Category>(&id).await
    })
    .await;

    deleted.unwrap();
    assert!(updated.unwrap().is_none());
    assert!(cache.snapshot().get::<Category>(&id).is_none());
}

#[tokio::test]
async fn test_last_writer_wins() {
    let cache = demo_cache().await;
    cache
        .store()
        .set_latency(Table::Miracles, Duration::from_millis(50));

    let slow = MiraclePatch {
        artist: Some("slow".into()),
        ..Default::default()
    };
    let fast = MiraclePatch {
        artist: Some("fast".into()),
        ..Default::default()
    };
    let id = EntityId::Int(2);

    let (a, b) = futures::future::join(cache.update(&id, &slow), async {
        cache.store().set_latency(Table::Miracles, Duration::ZERO);
        cache.update(&id, &fast).await
    })
    .await;
    a.unwrap();
    b.unwrap();

    let record = cache.snapshot().get::<Miracle>(&id).cloned().unwrap();
    assert_eq!(record.artist, "slow");

    let stored = cache.store().rows(Table::Miracles);
    let row = stored.iter().find(|r| r["id"] == json!(2)).unwrap();
    assert_eq!(row["artist"], json!("slow"));
}

#[tokio::test]
async fn test_snapshot_shared_by_readers() {
    let cache = demo_cache().await;
    let a = cache.snapshot();
    let b = cache.snapshot();
    assert!(Arc::ptr_eq(&a, &b));

    let first: &Arc<Collection> = &a.collections()[0];
    assert_eq!(first.title, "Morning Clarity");
}
