//! CLI - Command Line Interface for stillpoint
//!
//! Scriptable access to the catalog, search, uploads and playback.
//! All output is JSON-parseable with `--json` (the default for non-TTY).
//!
//! # Examples
//!
//! ```bash
//! # Load the catalog and show what failed
//! stillpoint load --json
//!
//! # Search across collections, meditations and miracles
//! stillpoint search anxiety
//!
//! # Edit records
//! stillpoint create category '{"name":"Sleep","icon":"moon"}'
//! stillpoint update miracle 4 '{"artist":"Priya S"}'
//!
//! # Play an episode locally
//! stillpoint play episode 12 --player mpv
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::api::{Role, Table};
use crate::playback::PlayerType;
use crate::upload::AssetKind;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Store unreachable or returned an error
    NetworkError = 3,
    /// Record not found
    NotFound = 4,
    /// Not signed in or not permitted
    Unauthorized = 5,
    /// Local player failed
    PlayerFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// stillpoint - meditation catalog client
#[derive(Parser, Debug)]
#[command(
    name = "stillpoint",
    version,
    about = "Browse, search, edit and play a meditation catalog",
    after_help = "EXAMPLES:\n\
                  stillpoint --demo search sleep      Search the built-in demo catalog\n\
                  stillpoint list banners --json      List banners as JSON\n\
                  stillpoint resolve <url>            Show how a media link resolves\n\
                  stillpoint play miracle 3           Play a miracle in VLC"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Use the built-in demo catalog instead of the remote store
    #[arg(long, global = true)]
    pub demo: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the whole catalog and report per-collection failures
    Load,

    /// List one collection
    #[command(visible_alias = "ls")]
    List(ListCmd),

    /// Search collections, meditations and miracles
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List the episodes of a meditation
    Episodes(EpisodesCmd),

    /// Show the banners the home page would rotate through
    Banners,

    /// Create a record from a JSON object
    Create(CreateCmd),

    /// Apply a partial JSON update to a record
    Update(UpdateCmd),

    /// Delete a record
    #[command(visible_alias = "rm")]
    Delete(DeleteCmd),

    /// Set a site setting (e.g. site_logo)
    Setting(SettingCmd),

    /// Upload a file and print its public URL
    Upload(UploadCmd),

    /// Show how a media link is normalized and classified
    Resolve(ResolveCmd),

    /// Play a miracle or episode in VLC or mpv
    #[command(visible_alias = "pl")]
    Play(PlayCmd),

    /// Sign in and cache the session token
    Login(LoginCmd),

    /// Sign out and forget the cached session
    Logout,

    /// Show the signed-in user and role
    Whoami,

    /// Create another administrator (super_admin only)
    AddAdmin(AddAdminCmd),
}

// =============================================================================
// Catalog Commands
// =============================================================================

/// Catalog record kinds
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    #[value(alias = "categories")]
    Category,
    #[value(alias = "collections")]
    Collection,
    #[value(alias = "meditations")]
    Meditation,
    #[value(alias = "episodes")]
    Episode,
    #[value(alias = "miracles")]
    Miracle,
    #[value(alias = "banners")]
    Banner,
    #[value(alias = "settings")]
    Setting,
}

impl EntityKind {
    pub fn table(&self) -> Table {
        match self {
            EntityKind::Category => Table::Categories,
            EntityKind::Collection => Table::Collections,
            EntityKind::Meditation => Table::Meditations,
            EntityKind::Episode => Table::Episodes,
            EntityKind::Miracle => Table::Miracles,
            EntityKind::Banner => Table::Banners,
            EntityKind::Setting => Table::SiteSettings,
        }
    }
}

/// List every record of a kind
#[derive(Args, Debug)]
pub struct ListCmd {
    #[arg(value_enum)]
    pub kind: EntityKind,
}

/// Free-text search
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search text (case-insensitive substring)
    #[arg(default_value = "")]
    pub query: String,
}

/// Episodes of one meditation
#[derive(Args, Debug)]
pub struct EpisodesCmd {
    /// Meditation id
    pub meditation_id: String,
}

/// Create a record
#[derive(Args, Debug)]
pub struct CreateCmd {
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Record fields as a JSON object
    #[arg(id = "json_body", value_name = "JSON")]
    pub json: String,
}

/// Update a record
#[derive(Args, Debug)]
pub struct UpdateCmd {
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Record id
    pub id: String,

    /// Changed fields as a JSON object
    #[arg(id = "json_body", value_name = "JSON")]
    pub json: String,
}

/// Delete a record
#[derive(Args, Debug)]
pub struct DeleteCmd {
    #[arg(value_enum)]
    pub kind: EntityKind,

    /// Record id
    pub id: String,
}

/// Upsert a site setting
#[derive(Args, Debug)]
pub struct SettingCmd {
    pub key: String,
    pub value: String,
}

// =============================================================================
// Upload Command
// =============================================================================

/// What an uploaded file is for
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetChoice {
    CategoryIcon,
    CollectionImage,
    MeditationImage,
    EpisodeMedia,
    MiracleImage,
    MiracleAudio,
    /// Replaces the site logo setting
    Logo,
    /// Adds an active banner after the existing ones
    Banner,
}

impl From<AssetChoice> for AssetKind {
    fn from(choice: AssetChoice) -> Self {
        match choice {
            AssetChoice::CategoryIcon => AssetKind::CategoryIcon,
            AssetChoice::CollectionImage => AssetKind::CollectionImage,
            AssetChoice::MeditationImage => AssetKind::MeditationImage,
            AssetChoice::EpisodeMedia => AssetKind::EpisodeMedia,
            AssetChoice::MiracleImage => AssetKind::MiracleImage,
            AssetChoice::MiracleAudio => AssetKind::MiracleAudio,
            AssetChoice::Logo => AssetKind::Logo,
            AssetChoice::Banner => AssetKind::Banner,
        }
    }
}

/// Upload a file
#[derive(Args, Debug)]
pub struct UploadCmd {
    #[arg(value_enum)]
    pub kind: AssetChoice,

    /// File to upload
    pub file: PathBuf,

    /// Banner title (banner uploads only)
    #[arg(long, short = 't')]
    pub title: Option<String>,
}

// =============================================================================
// Playback Commands
// =============================================================================

/// Resolve a media link
#[derive(Args, Debug)]
pub struct ResolveCmd {
    pub url: String,
}

/// Kinds of playable records
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayableKind {
    Miracle,
    Episode,
}

/// Local player selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerChoice {
    /// VLC media player (default)
    #[default]
    Vlc,
    /// mpv media player
    Mpv,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Vlc => PlayerType::Vlc,
            PlayerChoice::Mpv => PlayerType::Mpv,
        }
    }
}

/// Play a record locally
#[derive(Args, Debug)]
pub struct PlayCmd {
    #[arg(value_enum)]
    pub kind: PlayableKind,

    /// Record id
    pub id: String,

    /// Player to use (defaults to the config's preferred player)
    #[arg(long, short = 'p', value_enum)]
    pub player: Option<PlayerChoice>,

    /// Return immediately instead of waiting for the player to exit
    #[arg(long)]
    pub no_wait: bool,
}

// =============================================================================
// Auth Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct LoginCmd {
    pub email: String,
    pub password: String,
}

/// Administrator roles
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleChoice {
    #[default]
    Admin,
    SuperAdmin,
}

impl From<RoleChoice> for Role {
    fn from(choice: RoleChoice) -> Self {
        match choice {
            RoleChoice::Admin => Role::Admin,
            RoleChoice::SuperAdmin => Role::SuperAdmin,
        }
    }
}

#[derive(Args, Debug)]
pub struct AddAdminCmd {
    pub email: String,
    pub password: String,

    #[arg(long, short = 'r', value_enum, default_value = "admin")]
    pub role: RoleChoice,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Status OK response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print plain lines (JSON mode prints `data` instead)
    pub fn print_lines<T: Serialize>(&self, data: T, lines: &[String]) -> anyhow::Result<()> {
        if self.json {
            return self.print(data);
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_command() {
        let cli = Cli::parse_from(["stillpoint", "search", "anxiety"]);
        if let Command::Search(cmd) = cli.command {
            assert_eq!(cmd.query, "anxiety");
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["stillpoint", "--json", "--demo", "-q", "load"]);
        assert!(cli.json);
        assert!(cli.demo);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Load));
    }

    #[test]
    fn test_plural_kind_alias() {
        let cli = Cli::parse_from(["stillpoint", "list", "banners"]);
        if let Command::List(cmd) = cli.command {
            assert_eq!(cmd.kind, EntityKind::Banner);
            assert_eq!(cmd.kind.table(), Table::Banners);
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn test_update_command() {
        let cli = Cli::parse_from(["stillpoint", "update", "miracle", "4", r#"{"artist":"A"}"#]);
        if let Command::Update(cmd) = cli.command {
            assert_eq!(cmd.kind, EntityKind::Miracle);
            assert_eq!(cmd.id, "4");
            assert_eq!(cmd.json, r#"{"artist":"A"}"#);
        } else {
            panic!("Expected Update command");
        }
    }

    #[test]
    fn test_play_with_player() {
        let cli = Cli::parse_from(["stillpoint", "play", "episode", "12", "--player", "mpv"]);
        if let Command::Play(cmd) = cli.command {
            assert_eq!(cmd.kind, PlayableKind::Episode);
            assert_eq!(cmd.player, Some(PlayerChoice::Mpv));
            assert_eq!(PlayerType::from(PlayerChoice::Mpv), PlayerType::Mpv);
        } else {
            panic!("Expected Play command");
        }
    }

    #[test]
    fn test_upload_banner_with_title() {
        let cli = Cli::parse_from(["stillpoint", "upload", "banner", "hero.png", "-t", "Spring"]);
        if let Command::Upload(cmd) = cli.command {
            assert_eq!(AssetKind::from(cmd.kind), AssetKind::Banner);
            assert_eq!(cmd.title.as_deref(), Some("Spring"));
        } else {
            panic!("Expected Upload command");
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
        assert_eq!(i32::from(ExitCode::Unauthorized), 5);
        assert_eq!(i32::from(ExitCode::PlayerFailed), 6);
    }
}
