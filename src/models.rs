//! Data structures and types for Stillpoint
//!
//! Contains the catalog entities mirrored from the remote store, organized as:
//! - **Identity**: opaque store-assigned keys
//! - **Entities**: categories, collections, meditations, episodes, miracles, banners
//! - **Drafts**: create payloads (everything but the server-assigned fields)
//! - **Patches**: partial updates, merged field by field into cached records
//! - **Settings**: flat key/value rows folded into a lookup map

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Identity
// =============================================================================

/// Opaque, stable key assigned by the store when a row is created.
///
/// Stores hand back either integer or text keys; both are kept verbatim so
/// that comparisons and filters round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{}", n),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => EntityId::Int(n),
            Err(_) => EntityId::Text(s.to_string()),
        })
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

// =============================================================================
// Entities
// =============================================================================

/// Nullable columns come back as `null`; read those as the type's default
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Top-level browse category (flat, no relations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub icon: String,
}

/// Curated collection shown in the trending strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(
        default,
        rename = "sessions",
        alias = "session_count",
        deserialize_with = "null_default"
    )]
    pub session_count: i64,
    #[serde(default, deserialize_with = "null_default")]
    pub image: String,
}

/// A meditation series; parent of [`Episode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meditation {
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub image: String,
    /// Display string, e.g. "15 Mins"
    #[serde(default, deserialize_with = "null_default")]
    pub duration: String,
}

/// Media type tag carried by episodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Video,
    Audio,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Video => write!(f, "Video"),
            MediaType::Audio => write!(f, "Audio"),
        }
    }
}

/// Single playable episode belonging to a meditation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EntityId,
    pub meditation_id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub media_type: MediaType,
    #[serde(default, deserialize_with = "null_default")]
    pub media_url: String,
    #[serde(default, deserialize_with = "null_default")]
    pub duration: String,
}

/// Playable testimonial with artwork and optional audio or video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Miracle {
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub artist: String,
    #[serde(default, deserialize_with = "null_default")]
    pub quote: String,
    /// Plain URL or cloud-share link
    #[serde(default, deserialize_with = "null_default")]
    pub image: String,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default, rename = "youtubelink", alias = "youtube_link", alias = "youtubeLink")]
    pub youtube_link: Option<String>,
}

/// Rotating hero banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: EntityId,
    #[serde(default, deserialize_with = "null_default")]
    pub image_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub sort_order: i32,
    #[serde(default, deserialize_with = "null_default")]
    pub is_active: bool,
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_active { "active" } else { "inactive" };
        match &self.title {
            Some(title) => write!(f, "#{} {} ({})", self.sort_order, title, state),
            None => write!(f, "#{} {} ({})", self.sort_order, self.image_url, state),
        }
    }
}

/// Flat settings row as persisted: `(key, value, updated_at)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSetting {
    pub key: String,
    #[serde(default, deserialize_with = "null_default")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

// =============================================================================
// Site Settings
// =============================================================================

/// Key of the site logo URL setting
pub const SITE_LOGO_KEY: &str = "site_logo";

/// Folded key → value view of the settings rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteSettings(BTreeMap<String, String>);

impl SiteSettings {
    /// Fold rows into a map; later rows with the same key replace earlier ones
    pub fn from_rows<I: IntoIterator<Item = SiteSetting>>(rows: I) -> Self {
        Self(rows.into_iter().map(|r| (r.key, r.value)).collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Upsert: an existing key has its value replaced
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn site_logo(&self) -> Option<&str> {
        self.get(SITE_LOGO_KEY).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Drafts (create payloads)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDraft {
    pub title: String,
    #[serde(default, rename = "sessions", alias = "session_count")]
    pub session_count: i64,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeditationDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDraft {
    pub meditation_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiracleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(
        default,
        rename = "youtubelink",
        alias = "youtube_link",
        skip_serializing_if = "Option::is_none"
    )]
    pub youtube_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerDraft {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Patches (partial updates)
// =============================================================================

/// Overwrite `target` with `value` when the patch carries one
fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

/// Same as [`merge`] for optional entity fields
fn merge_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if let Some(v) = value {
        *target = Some(v.clone());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Category {
    pub fn apply(&mut self, patch: &CategoryPatch) {
        merge(&mut self.name, &patch.name);
        merge(&mut self.icon, &patch.icon);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        rename = "sessions",
        alias = "session_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Collection {
    pub fn apply(&mut self, patch: &CollectionPatch) {
        merge(&mut self.title, &patch.title);
        merge(&mut self.session_count, &patch.session_count);
        merge(&mut self.image, &patch.image);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeditationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Meditation {
    pub fn apply(&mut self, patch: &MeditationPatch) {
        merge(&mut self.title, &patch.title);
        merge(&mut self.description, &patch.description);
        merge(&mut self.image, &patch.image);
        merge(&mut self.duration, &patch.duration);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meditation_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Episode {
    pub fn apply(&mut self, patch: &EpisodePatch) {
        merge(&mut self.meditation_id, &patch.meditation_id);
        merge(&mut self.title, &patch.title);
        merge(&mut self.description, &patch.description);
        merge_opt(&mut self.image, &patch.image);
        merge(&mut self.media_type, &patch.media_type);
        merge(&mut self.media_url, &patch.media_url);
        merge(&mut self.duration, &patch.duration);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiraclePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(
        default,
        rename = "youtubelink",
        alias = "youtube_link",
        skip_serializing_if = "Option::is_none"
    )]
    pub youtube_link: Option<String>,
}

impl Miracle {
    pub fn apply(&mut self, patch: &MiraclePatch) {
        merge(&mut self.title, &patch.title);
        merge(&mut self.artist, &patch.artist);
        merge(&mut self.quote, &patch.quote);
        merge(&mut self.image, &patch.image);
        merge_opt(&mut self.audio, &patch.audio);
        merge_opt(&mut self.youtube_link, &patch.youtube_link);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BannerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Banner {
    pub fn apply(&mut self, patch: &BannerPatch) {
        merge(&mut self.image_url, &patch.image_url);
        merge_opt(&mut self.title, &patch.title);
        merge(&mut self.sort_order, &patch.sort_order);
        merge(&mut self.is_active, &patch.is_active);
    }
}

// =============================================================================
// Tests
// =============================================================================
