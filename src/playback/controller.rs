//! Playback controller
//!
//! Drives a single "now playing" item plus its candidate playlist. Audio
//! items play through a [`MediaElement`]; video items are handed to an
//! embedded player that owns its own transport, so the controller only
//! tracks that one is showing.
//!
//! State machine:
//! - `Closed` -> `Opening` when an item is selected
//! - `Opening` -> `Playing` / `Paused` (audio, depending on autoplay)
//! - `Opening` -> `Embedded` (video) or `Paused` (artwork only)
//! - any open state -> `Opening` when a playlist entry is selected
//! - any open state -> `Closed` on close or backdrop click

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use super::resolver::{MediaKind, PlayableItem};
use crate::models::EntityId;

/// Media element failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Platform refused to start playback (e.g. autoplay policy)
    #[error("Playback rejected: {0}")]
    Rejected(String),

    #[error("No media source loaded")]
    NoSource,
}

/// Audio output the controller drives
pub trait MediaElement {
    /// Replace the current source; does not start playback
    fn load(&mut self, src: &str);

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Move the playhead to `seconds`
    fn seek(&mut self, seconds: f64);

    /// Playhead position in seconds
    fn current_time(&self) -> f64;

    /// Total length in seconds; NaN while unknown
    fn duration(&self) -> f64;
}

/// Player overlay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    #[default]
    Closed,
    Opening,
    Playing,
    Paused,
    /// Video embed showing; transport is managed by the embed
    Embedded,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerState::Closed => write!(f, "closed"),
            PlayerState::Opening => write!(f, "opening"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Embedded => write!(f, "embedded"),
        }
    }
}

/// Identifies one open-item session; events from older sessions are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// Signals raised by the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    TimeUpdate,
    Ended,
}

/// Format seconds as zero-padded `MM:SS`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Transient progress of the open item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Progress {
    /// Elapsed seconds
    pub elapsed: f64,
    /// 0.0 ..= 100.0
    pub percent: f64,
}

impl Progress {
    fn measure(elapsed: f64, duration: f64) -> Self {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        let percent = if duration.is_finite() && duration > 0.0 {
            (elapsed / duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self { elapsed, percent }
    }

    pub fn elapsed_text(&self) -> String {
        format_time(self.elapsed)
    }
}

/// One row of the playlist panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistRow {
    pub id: EntityId,
    pub title: String,
    pub caption: String,
    pub artwork: String,
    pub active: bool,
}

/// Playback controller over a media element
pub struct PlaybackController<M: MediaElement> {
    element: M,
    state: PlayerState,
    current: Option<PlayableItem>,
    playlist: Vec<PlayableItem>,
    progress: Progress,
    scroll_locked: bool,
    session: u64,
}

impl<M: MediaElement> PlaybackController<M> {
    pub fn new(element: M) -> Self {
        Self {
            element,
            state: PlayerState::Closed,
            current: None,
            playlist: Vec::new(),
            progress: Progress::default(),
            scroll_locked: false,
            session: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn current(&self) -> Option<&PlayableItem> {
        self.current.as_ref()
    }

    pub fn playlist(&self) -> &[PlayableItem] {
        &self.playlist
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn is_open(&self) -> bool {
        self.state != PlayerState::Closed
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    /// Page scrolling is suspended while the overlay is open
    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn session(&self) -> SessionId {
        SessionId(self.session)
    }

    pub fn element(&self) -> &M {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut M {
        &mut self.element
    }

    /// Transport controls (play/pause, progress track) exist only for audio
    pub fn controls_visible(&self) -> bool {
        self.is_open() && matches!(self.current, Some(PlayableItem::Audio(_)))
    }

    pub fn header_label(&self) -> &'static str {
        match self.current.as_ref().map(PlayableItem::kind) {
            Some(MediaKind::Video) => "Watching",
            _ => "Now Playing",
        }
    }

    /// Embed URL of the open video item
    pub fn embed_url(&self) -> Option<String> {
        match &self.current {
            Some(PlayableItem::Video(video)) => video.embed_url(),
            _ => None,
        }
    }

    pub fn playlist_rows(&self) -> Vec<PlaylistRow> {
        let active = self.current.as_ref().map(PlayableItem::id);
        self.playlist
            .iter()
            .map(|item| {
                let info = item.info();
                PlaylistRow {
                    id: info.id.clone(),
                    title: info.title.clone(),
                    caption: info.caption().to_string(),
                    artwork: info.artwork.clone(),
                    active: active == Some(&info.id),
                }
            })
            .collect()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Open `item` with its candidate playlist
    pub fn open(&mut self, item: PlayableItem, playlist: Vec<PlayableItem>) -> SessionId {
        self.playlist = playlist;
        self.enter(item)
    }

    /// Swap to playlist entry `index` without closing the overlay
    pub fn select(&mut self, index: usize) -> Option<SessionId> {
        if !self.is_open() {
            return None;
        }
        let item = self.playlist.get(index)?.clone();
        Some(self.enter(item))
    }

    /// Swap to the playlist entry with `id`
    pub fn select_id(&mut self, id: &EntityId) -> Option<SessionId> {
        let index = self.playlist.iter().position(|item| item.id() == id)?;
        self.select(index)
    }

    fn enter(&mut self, item: PlayableItem) -> SessionId {
        self.session += 1;
        self.progress = Progress::default();
        self.state = PlayerState::Opening;
        self.scroll_locked = true;

        match &item {
            PlayableItem::Audio(audio) => {
                self.element.load(&audio.src);
                self.state = match self.element.play() {
                    Ok(()) => PlayerState::Playing,
                    Err(e) => {
                        debug!(error = %e, "Autoplay rejected");
                        PlayerState::Paused
                    }
                };
            }
            PlayableItem::Video(_) => {
                self.element.pause();
                self.state = PlayerState::Embedded;
            }
            PlayableItem::Artwork(_) => {
                self.element.pause();
                self.state = PlayerState::Paused;
            }
        }

        self.current = Some(item);
        SessionId(self.session)
    }

    /// Play/pause button (audio only)
    pub fn toggle(&mut self) {
        if !self.controls_visible() {
            return;
        }
        match self.state {
            PlayerState::Playing => {
                self.element.pause();
                self.state = PlayerState::Paused;
            }
            PlayerState::Paused => {
                self.state = match self.element.play() {
                    Ok(()) => PlayerState::Playing,
                    Err(e) => {
                        debug!(error = %e, "Play rejected");
                        PlayerState::Paused
                    }
                };
            }
            _ => {}
        }
    }

    /// Click on the progress track at `fraction` (0.0 = start, 1.0 = end)
    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if !self.controls_visible() {
            return;
        }
        let duration = self.element.duration();
        if !duration.is_finite() || duration <= 0.0 || !fraction.is_finite() {
            return;
        }
        self.element.seek(fraction.clamp(0.0, 1.0) * duration);
        self.refresh_progress();
    }

    /// Deliver a media element signal raised during `session`
    ///
    /// Returns false when the signal belongs to an earlier session.
    pub fn handle(&mut self, session: SessionId, event: MediaEvent) -> bool {
        if session.0 != self.session || !self.is_open() {
            return false;
        }
        match event {
            MediaEvent::TimeUpdate => self.refresh_progress(),
            MediaEvent::Ended => {
                if self.state == PlayerState::Playing {
                    self.state = PlayerState::Paused;
                }
            }
        }
        true
    }

    fn refresh_progress(&mut self) {
        self.progress = Progress::measure(self.element.current_time(), self.element.duration());
    }

    /// Full stop: rewind, clear playing, release scroll
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.element.pause();
        self.element.seek(0.0);
        self.session += 1;
        self.state = PlayerState::Closed;
        self.current = None;
        self.progress = Progress::default();
        self.scroll_locked = false;
    }

    /// Clicks outside the content panel close the overlay
    pub fn backdrop_click(&mut self, inside_content: bool) {
        if !inside_content {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Silent {
        time: f64,
    }

    impl MediaElement for Silent {
        fn load(&mut self, _src: &str) {
            self.time = 0.0;
        }
        fn play(&mut self) -> Result<(), PlaybackError> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek(&mut self, seconds: f64) {
            self.time = seconds;
        }
        fn current_time(&self) -> f64 {
            self.time
        }
        fn duration(&self) -> f64 {
            200.0
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(5.9), "00:05");
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(600.0), "10:00");
    }

    #[test]
    fn test_progress_unknown_duration() {
        let p = Progress::measure(30.0, f64::NAN);
        assert_eq!(p.percent, 0.0);
        assert_eq!(p.elapsed_text(), "00:30");
    }

    #[test]
    fn test_progress_percent() {
        let p = Progress::measure(50.0, 200.0);
        assert_eq!(p.percent, 25.0);
    }

    #[test]
    fn test_closed_controller_ignores_controls() {
        let mut c = PlaybackController::new(Silent::default());
        c.toggle();
        c.seek_to_fraction(0.5);
        assert_eq!(c.state(), PlayerState::Closed);
        assert_eq!(c.element().time, 0.0);
        assert!(c.select(0).is_none());
    }

    #[test]
    fn test_stale_session_event_ignored() {
        let mut c = PlaybackController::new(Silent::default());
        let stale = c.session();
        assert!(!c.handle(stale, MediaEvent::TimeUpdate));
    }
}
