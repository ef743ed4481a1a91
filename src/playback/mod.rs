//! Playback - link resolution, the player state machine and local players

pub mod controller;
pub mod local;
pub mod resolver;

pub use controller::{
    format_time, MediaElement, MediaEvent, PlaybackController, PlaybackError, PlayerState,
    PlaylistRow, Progress, SessionId,
};
pub use local::{LocalPlayer, PlayerError, PlayerType};
pub use resolver::{
    normalize_link, youtube_embed_url, youtube_id, AudioItem, ItemInfo, MediaKind, MediaSource,
    PlayableItem, VideoItem,
};
