//! Media source resolver
//!
//! Pure functions turning arbitrary external links into fetchable URLs and
//! classifying playable entities into a [`PlayableItem`]. Unrecognized link
//! shapes never fail: normalization returns the input, id extraction
//! returns `None`.

use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use crate::models::{EntityId, Episode, MediaType, Meditation, Miracle};

/// Host fragment identifying cloud-drive share links
const DRIVE_HOST: &str = "drive.google.com";

/// Direct-download endpoint for cloud-drive files
const DRIVE_DOWNLOAD_URL: &str = "https://docs.google.com/uc?export=download&id=";

/// Length of a YouTube video id
const YOUTUBE_ID_LEN: usize = 11;

// =============================================================================
// Link normalization
// =============================================================================

/// Extract the file id (25+ URL-safe characters) from a cloud-drive share link
pub fn drive_file_id(url: &str) -> Option<&str> {
    if !url.contains(DRIVE_HOST) {
        return None;
    }
    let re = Regex::new(r"[-A-Za-z0-9_]{25,}").ok()?;
    re.find(url).map(|m| m.as_str())
}

/// Rewrite cloud-drive share links to direct downloads; anything else is
/// returned unchanged
///
/// Used for both artwork and audio links.
pub fn normalize_link(url: &str) -> Cow<'_, str> {
    match drive_file_id(url) {
        Some(id) => Cow::Owned(format!("{}{}", DRIVE_DOWNLOAD_URL, id)),
        None => Cow::Borrowed(url),
    }
}

/// Extract an 11-character video id from watch, short-link or embed URLs
pub fn youtube_id(url: &str) -> Option<&str> {
    let re = Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").ok()?;
    let caps = re.captures(url)?;
    let id = caps.get(2)?.as_str();
    (id.len() == YOUTUBE_ID_LEN).then_some(id)
}

/// Embedded player URL (autoplaying)
pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", video_id)
}

/// Canonical watch URL (for handing to external players)
pub fn youtube_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

// =============================================================================
// Classification
// =============================================================================

/// Playback kind of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Embedded video player
    Video,
    /// Audio stream with transport controls
    Audio,
    /// Nothing playable; artwork and text only
    Artwork,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Artwork => write!(f, "artwork"),
        }
    }
}

/// Media-relevant fields of a playable entity
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaSource<'a> {
    pub audio: Option<&'a str>,
    pub video_link: Option<&'a str>,
    pub media_type: Option<MediaType>,
    pub media_url: Option<&'a str>,
}

/// Empty strings count as absent
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl<'a> MediaSource<'a> {
    pub fn from_miracle(miracle: &'a Miracle) -> Self {
        Self {
            audio: present(miracle.audio.as_deref()),
            video_link: present(miracle.youtube_link.as_deref()),
            media_type: None,
            media_url: None,
        }
    }

    pub fn from_episode(episode: &'a Episode) -> Self {
        Self {
            audio: None,
            video_link: None,
            media_type: Some(episode.media_type),
            media_url: present(Some(episode.media_url.as_str())),
        }
    }

    /// Video id from the video link, falling back to the media URL
    pub fn video_id(&self) -> Option<&'a str> {
        present(self.video_link)
            .or(present(self.media_url))
            .and_then(youtube_id)
    }

    /// Audio source: explicit audio field, else the media URL
    fn audio_link(&self) -> Option<&'a str> {
        present(self.audio).or(present(self.media_url))
    }

    /// Video wins over audio when both signals are present
    pub fn classify(&self) -> MediaKind {
        if self.video_id().is_some() || self.media_type == Some(MediaType::Video) {
            return MediaKind::Video;
        }

        let has_audio = present(self.audio).is_some()
            || (self.media_type == Some(MediaType::Audio) && present(self.media_url).is_some());
        let linked_video = present(self.media_url)
            .or(present(self.video_link))
            .and_then(youtube_id);

        if has_audio && linked_video.is_none() {
            MediaKind::Audio
        } else {
            MediaKind::Artwork
        }
    }
}

// =============================================================================
// Playable items
// =============================================================================

/// Display data shared by every playable item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemInfo {
    pub id: EntityId,
    pub title: String,
    /// Normalized artwork URL (may be empty)
    pub artwork: String,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
}

impl ItemInfo {
    /// Line under the title in the player: artist, else description
    pub fn subtitle(&self) -> &str {
        self.artist
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or_default()
    }

    /// Line under the title in the playlist: artist, else duration
    pub fn caption(&self) -> &str {
        self.artist
            .as_deref()
            .or(self.duration.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioItem {
    pub info: ItemInfo,
    /// Directly fetchable stream URL
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoItem {
    pub info: ItemInfo,
    /// `None` when the item is tagged video but no id could be extracted
    pub video_id: Option<String>,
}

impl VideoItem {
    pub fn embed_url(&self) -> Option<String> {
        self.video_id.as_deref().map(youtube_embed_url)
    }
}

/// Anything the playback controller can open
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlayableItem {
    Audio(AudioItem),
    Video(VideoItem),
    Artwork(ItemInfo),
}

impl PlayableItem {
    fn resolve(info: ItemInfo, source: MediaSource<'_>) -> Self {
        match source.classify() {
            MediaKind::Video => PlayableItem::Video(VideoItem {
                info,
                video_id: source.video_id().map(str::to_string),
            }),
            MediaKind::Audio => match source.audio_link() {
                Some(link) => PlayableItem::Audio(AudioItem {
                    info,
                    src: normalize_link(link).into_owned(),
                }),
                None => PlayableItem::Artwork(info),
            },
            MediaKind::Artwork => PlayableItem::Artwork(info),
        }
    }

    pub fn from_miracle(miracle: &Miracle) -> Self {
        let info = ItemInfo {
            id: miracle.id.clone(),
            title: miracle.title.clone(),
            artwork: normalize_link(&miracle.image).into_owned(),
            artist: present(Some(miracle.artist.as_str())).map(str::to_string),
            description: present(Some(miracle.quote.as_str())).map(str::to_string),
            duration: None,
        };
        Self::resolve(info, MediaSource::from_miracle(miracle))
    }

    /// Episode artwork falls back to the parent meditation's image
    pub fn from_episode(episode: &Episode, parent: Option<&Meditation>) -> Self {
        let image = present(episode.image.as_deref())
            .or_else(|| parent.map(|m| m.image.as_str()))
            .unwrap_or_default();
        let info = ItemInfo {
            id: episode.id.clone(),
            title: episode.title.clone(),
            artwork: normalize_link(image).into_owned(),
            artist: None,
            description: present(Some(episode.description.as_str())).map(str::to_string),
            duration: present(Some(episode.duration.as_str())).map(str::to_string),
        };
        Self::resolve(info, MediaSource::from_episode(episode))
    }

    pub fn info(&self) -> &ItemInfo {
        match self {
            PlayableItem::Audio(item) => &item.info,
            PlayableItem::Video(item) => &item.info,
            PlayableItem::Artwork(info) => info,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.info().id
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            PlayableItem::Audio(_) => MediaKind::Audio,
            PlayableItem::Video(_) => MediaKind::Video,
            PlayableItem::Artwork(_) => MediaKind::Artwork,
        }
    }

    /// URL an external player can open, if any
    pub fn media_url(&self) -> Option<String> {
        match self {
            PlayableItem::Audio(item) => Some(item.src.clone()),
            PlayableItem::Video(item) => item.video_id.as_deref().map(youtube_watch_url),
            PlayableItem::Artwork(_) => None,
        }
    }
}
