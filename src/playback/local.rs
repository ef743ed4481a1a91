//! Local player - VLC/mpv playback for resolved items
//!
//! Backs the [`MediaElement`] the controller drives with an external player
//! process, so the CLI can open catalog items on the desktop.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::controller::{MediaElement, PlaybackError};
use super::resolver::MediaKind;

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    /// VLC media player (default)
    #[default]
    Vlc,
    /// mpv media player
    Mpv,
}

impl PlayerType {
    /// Command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Arguments for opening `url`
    pub fn args(&self, url: &str, kind: MediaKind) -> Vec<String> {
        let mut args = vec![url.to_string()];
        match (self, kind) {
            (PlayerType::Vlc, MediaKind::Audio) => {
                args.push("--play-and-exit".into());
            }
            (PlayerType::Vlc, _) => {
                args.push("--no-video-title-show".into());
            }
            (PlayerType::Mpv, MediaKind::Audio) => {
                args.push("--no-video".into());
            }
            (PlayerType::Mpv, _) => {
                args.push("--force-window=immediate".into());
            }
        }
        args
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
    #[error("Item has nothing to play")]
    NothingToPlay,
}

/// External player process acting as a media element
pub struct LocalPlayer {
    player_type: PlayerType,
    source: Option<String>,
    child: Option<Child>,
}

impl LocalPlayer {
    pub fn new(player_type: PlayerType) -> Self {
        Self {
            player_type,
            source: None,
            child: None,
        }
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Loaded source URL
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Start the player on `url`, replacing any running process
    pub fn spawn(&mut self, url: &str, kind: MediaKind) -> Result<(), PlayerError> {
        if kind == MediaKind::Artwork {
            return Err(PlayerError::NothingToPlay);
        }
        self.stop();

        let mut cmd = Command::new(self.player_type.command());
        cmd.args(self.player_type.args(url, kind));
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })?;

        debug!(player = %self.player_type, url, "Player started");
        self.child = Some(child);
        Ok(())
    }

    /// Wait for the player window to close
    pub async fn wait(&mut self) -> Result<(), PlayerError> {
        if let Some(mut child) = self.child.take() {
            child.wait().await?;
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!(error = %e, "Failed to stop player");
            }
        }
    }
}

impl MediaElement for LocalPlayer {
    fn load(&mut self, src: &str) {
        self.stop();
        self.source = Some(src.to_string());
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let src = self.source.clone().ok_or(PlaybackError::NoSource)?;
        self.spawn(&src, MediaKind::Audio)
            .map_err(|e| PlaybackError::Rejected(e.to_string()))
    }

    fn pause(&mut self) {
        self.stop();
    }

    /// The external process owns its playhead
    fn seek(&mut self, _seconds: f64) {}

    fn current_time(&self) -> f64 {
        0.0
    }

    fn duration(&self) -> f64 {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_type_command() {
        let vlc_cmd = PlayerType::Vlc.command();
        assert!(vlc_cmd == "vlc" || vlc_cmd == "/Applications/VLC.app/Contents/MacOS/VLC");
        assert_eq!(PlayerType::Mpv.command(), "mpv");
    }

    #[test]
    fn test_player_args_by_kind() {
        let url = "https://cdn.example.com/a.mp3";
        assert_eq!(
            PlayerType::Mpv.args(url, MediaKind::Audio),
            vec![url.to_string(), "--no-video".to_string()]
        );
        assert_eq!(
            PlayerType::Vlc.args(url, MediaKind::Video)[1],
            "--no-video-title-show"
        );
    }

    #[test]
    fn test_play_without_source() {
        let mut player = LocalPlayer::new(PlayerType::Mpv);
        assert_eq!(player.play(), Err(PlaybackError::NoSource));
    }

    #[test]
    fn test_artwork_is_not_spawned() {
        let mut player = LocalPlayer::new(PlayerType::Vlc);
        let err = player.spawn("x", MediaKind::Artwork).unwrap_err();
        assert!(matches!(err, PlayerError::NothingToPlay));
        assert!(!player.is_running());
    }

    #[test]
    fn test_player_type_serde() {
        let t: PlayerType = serde_json::from_str("\"mpv\"").unwrap();
        assert_eq!(t, PlayerType::Mpv);
        assert_eq!(PlayerType::default(), PlayerType::Vlc);
    }
}
