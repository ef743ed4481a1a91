//! stillpoint - catalog mirror and media playback for a meditation library
//!
//! An in-memory mirror of a remote catalog (categories, collections,
//! meditations, episodes, miracles, banners, site settings) that persists
//! every change to the store before applying it locally, plus an adaptive
//! player that handles audio, embedded video and artwork-only items.
//!
//! # Modules
//!
//! - `models` - Catalog records, drafts and patches
//! - `api` - Store boundary (REST, in-memory) and auth
//! - `cache` - Content cache with persist-then-mirror mutations
//! - `search` - Free-text filtering of the cached catalog
//! - `playback` - Link resolver, player state machine, local players
//! - `banner` - Home page banner rotation
//! - `upload` - Asset uploads and the logo/banner workflows
//! - `config`, `cli`, `commands` - Command line front end

pub mod api;
pub mod banner;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod playback;
pub mod search;
pub mod upload;

// Re-export commonly used types
pub use models::{
    Banner, Category, Collection, EntityId, Episode, MediaType, Meditation, Miracle, SiteSetting,
    SiteSettings,
};

pub use api::{AuthClient, CatalogStore, MemoryStore, RestStore, StoreError, Table};
pub use banner::BannerCarousel;
pub use cache::{CacheError, Catalog, ContentCache, LoadReport};
pub use config::Config;
pub use playback::{MediaElement, PlayableItem, PlaybackController, PlayerState};
pub use search::{SearchQuery, SearchResults};
pub use upload::{AssetKind, AssetUploader, UploadError};
