//! CLI Command Handlers
//!
//! Implements all CLI commands on top of the content cache, uploader,
//! resolver and playback controller. Each handler takes CLI args, the run
//! context and Output, and returns an ExitCode.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{
    AuthClient, AuthError, BlobStore, CatalogStore, IdentityProvider, MemoryStore, RestStore,
    Role, StoreError, User,
};
use crate::banner::BannerCarousel;
use crate::cache::{
    CacheError, Catalog, CatalogStats, ContentCache, Draft, Entity, LoadReport, Patch,
};
use crate::cli::{
    AddAdminCmd, CreateCmd, DeleteCmd, EntityKind, EpisodesCmd, ExitCode, ListCmd, LoginCmd,
    Output, PlayCmd, PlayableKind, ResolveCmd, SearchCmd, SettingCmd, StatusOk, UpdateCmd,
    UploadCmd,
};
use crate::config::Config;
use crate::models::{
    Banner, BannerDraft, BannerPatch, Category, CategoryDraft, CategoryPatch, Collection,
    CollectionDraft, CollectionPatch, EntityId, Episode, EpisodeDraft, EpisodePatch, Meditation,
    MeditationDraft, MeditationPatch, Miracle, MiracleDraft, MiraclePatch,
};
use crate::playback::{
    normalize_link, resolver, youtube_id, LocalPlayer, MediaKind, PlayableItem,
    PlaybackController, PlayerState, PlayerType,
};
use crate::search::{SearchQuery, SearchResults};
use crate::upload::{
    add_banner_from_upload, replace_site_logo, AssetKind, AssetUploader, UploadError,
};

// =============================================================================
// Context
// =============================================================================

/// Settings shared by every command in one run
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub demo: bool,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, demo: bool) -> Self {
        let config = match &config_path {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };
        Self {
            config,
            config_path,
            demo,
        }
    }

    fn save_config(&self) -> anyhow::Result<()> {
        match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => self.config.save(),
        }
    }

    fn endpoint(&self) -> Result<(String, String), String> {
        let url = self.config.store_url().ok_or_else(|| {
            "No store configured: set STILLPOINT_STORE_URL or store_url in the config file (or use --demo)"
                .to_string()
        })?;
        let key = self.config.anon_key().ok_or_else(|| {
            "No API key configured: set STILLPOINT_ANON_KEY or anon_key in the config file".to_string()
        })?;
        Ok((url, key))
    }

    fn auth_client(&self) -> Result<AuthClient, String> {
        if self.demo {
            return Err("Accounts are not available in demo mode".to_string());
        }
        let (url, key) = self.endpoint()?;
        let client = AuthClient::new(url, key);
        Ok(match &self.config.access_token {
            Some(token) => client.with_access_token(token),
            None => client,
        })
    }
}

/// Cache and uploader over one store
pub struct Backend {
    pub cache: ContentCache<Arc<dyn CatalogStore>>,
    pub uploader: AssetUploader<Arc<dyn BlobStore>>,
}

impl Backend {
    pub fn connect(ctx: &Context) -> Result<Self, String> {
        let (catalog, blobs): (Arc<dyn CatalogStore>, Arc<dyn BlobStore>) = if ctx.demo {
            let store = Arc::new(MemoryStore::demo());
            (store.clone(), store)
        } else {
            let (url, key) = ctx.endpoint()?;
            let mut store = RestStore::new(url, key);
            if let Some(token) = &ctx.config.access_token {
                store = store.with_access_token(token);
            }
            let store = Arc::new(store);
            (store.clone(), store)
        };

        Ok(Self {
            cache: ContentCache::new(catalog),
            uploader: AssetUploader::with_buckets(
                blobs,
                ctx.config.asset_bucket(),
                ctx.config.site_bucket(),
            ),
        })
    }
}

/// Connect and load the catalog; degraded collections are reported, not fatal
async fn open_catalog(ctx: &Context, output: &Output) -> Result<(Backend, LoadReport), ExitCode> {
    let backend = Backend::connect(ctx).map_err(|e| output.error(e, ExitCode::InvalidArgs))?;
    let report = backend.cache.load().await;
    for failure in &report.failures {
        output.info(format!(
            "Warning: {} failed to load ({}), showing none",
            failure.table, failure.error
        ));
    }
    Ok((backend, report))
}

fn store_exit(e: &StoreError) -> ExitCode {
    match e {
        StoreError::Unauthorized(_) => ExitCode::Unauthorized,
        _ => ExitCode::NetworkError,
    }
}

fn cache_exit(e: &CacheError) -> ExitCode {
    match e {
        CacheError::Store { source, .. } => store_exit(source),
        _ => ExitCode::Error,
    }
}

fn upload_exit(e: &UploadError) -> ExitCode {
    match e {
        UploadError::EmptyFile(_) => ExitCode::InvalidArgs,
        UploadError::Store(e) => store_exit(e),
        UploadError::Link(e) => cache_exit(e),
    }
}

fn auth_exit(e: &AuthError) -> ExitCode {
    match e {
        AuthError::InvalidCredentials(_) | AuthError::Forbidden | AuthError::NotSignedIn => {
            ExitCode::Unauthorized
        }
        AuthError::Store(e) => store_exit(e),
        _ => ExitCode::NetworkError,
    }
}

fn print<T: Serialize>(output: &Output, data: T) -> ExitCode {
    match output.print(data) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

fn parse_id(raw: &str) -> EntityId {
    raw.parse::<EntityId>().unwrap_or_else(|never| match never {})
}

// =============================================================================
// Load / List / Search
// =============================================================================

#[derive(Serialize)]
struct LoadSummary {
    stats: CatalogStats,
    episodes: usize,
    banners: usize,
    settings: usize,
    #[serde(flatten)]
    report: LoadReport,
}

pub async fn load_cmd(ctx: &Context, output: &Output) -> ExitCode {
    let (backend, report) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let catalog = backend.cache.snapshot();

    let summary = LoadSummary {
        stats: catalog.stats(),
        episodes: catalog.episodes().len(),
        banners: catalog.banners().len(),
        settings: catalog.site_settings().len(),
        report,
    };

    let mut lines = vec![
        format!("Categories:  {}", summary.stats.categories),
        format!("Collections: {}", summary.stats.collections),
        format!("Meditations: {}", summary.stats.meditations),
        format!("Episodes:    {}", summary.episodes),
        format!("Miracles:    {}", summary.stats.miracles),
        format!("Banners:     {}", summary.banners),
        format!("Settings:    {}", summary.settings),
    ];
    for failure in &summary.report.failures {
        lines.push(format!("Failed: {} ({})", failure.table, failure.error));
    }

    match output.print_lines(&summary, &lines) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

pub async fn list_cmd(cmd: ListCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, report) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    if report.failed(cmd.kind.table()) {
        return output.error(
            format!("Could not load {}", cmd.kind.table()),
            ExitCode::NetworkError,
        );
    }

    let catalog = backend.cache.snapshot();
    match cmd.kind {
        EntityKind::Category => print(output, catalog.categories()),
        EntityKind::Collection => print(output, catalog.collections()),
        EntityKind::Meditation => print(output, catalog.meditations()),
        EntityKind::Episode => print(output, catalog.episodes()),
        EntityKind::Miracle => print(output, catalog.miracles()),
        EntityKind::Banner => print(output, catalog.banners()),
        EntityKind::Setting => print(output, catalog.site_settings()),
    }
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    collections: Vec<Arc<Collection>>,
    meditations: Vec<Arc<Meditation>>,
    miracles: Vec<Arc<Miracle>>,
    no_results: bool,
}

pub async fn search_cmd(cmd: SearchCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let results = SearchResults::evaluate(&backend.cache.snapshot(), SearchQuery::new(cmd.query));

    if let Some(message) = results.no_results_message() {
        if !output.json {
            println!("{}", message);
            return ExitCode::NotFound;
        }
    }

    let no_results = results.no_results();
    let response = SearchResponse {
        query: results.query.as_str().to_string(),
        collections: results.collections,
        meditations: results.meditations,
        miracles: results.miracles,
        no_results,
    };
    match print(output, &response) {
        ExitCode::Success if no_results => ExitCode::NotFound,
        code => code,
    }
}

pub async fn episodes_cmd(cmd: EpisodesCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let catalog = backend.cache.snapshot();
    let id = parse_id(&cmd.meditation_id);

    if catalog.meditation(&id).is_none() {
        return output.error(format!("Meditation not found: {}", id), ExitCode::NotFound);
    }
    print(output, catalog.episodes_for(&id))
}

pub async fn banners_cmd(ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let carousel = BannerCarousel::new(backend.cache.snapshot().banners());

    #[derive(Serialize)]
    struct BannerView<'a> {
        banners: &'a [Arc<Banner>],
        fallback: bool,
        rotation_secs: Option<u64>,
    }

    let view = BannerView {
        banners: carousel.banners(),
        fallback: carousel.is_fallback(),
        rotation_secs: carousel.rotation_interval().map(|d| d.as_secs()),
    };
    let lines: Vec<String> = carousel.banners().iter().map(|b| b.to_string()).collect();
    match output.print_lines(&view, &lines) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Create / Update / Delete / Setting
// =============================================================================

const SETTING_HINT: &str = "Site settings are changed with `stillpoint setting <key> <value>`";

async fn create_as<D>(backend: &Backend, json: &str, output: &Output) -> ExitCode
where
    D: Draft + DeserializeOwned,
{
    let draft: D = match serde_json::from_str(json) {
        Ok(draft) => draft,
        Err(e) => return output.error(format!("Invalid record JSON: {}", e), ExitCode::InvalidArgs),
    };
    match backend.cache.create(&draft).await {
        Ok(record) => print(output, record),
        Err(e) => output.error(format!("Create failed: {}", e), cache_exit(&e)),
    }
}

pub async fn create_cmd(cmd: CreateCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    match cmd.kind {
        EntityKind::Category => create_as::<CategoryDraft>(&backend, &cmd.json, output).await,
        EntityKind::Collection => create_as::<CollectionDraft>(&backend, &cmd.json, output).await,
        EntityKind::Meditation => create_as::<MeditationDraft>(&backend, &cmd.json, output).await,
        EntityKind::Episode => create_as::<EpisodeDraft>(&backend, &cmd.json, output).await,
        EntityKind::Miracle => create_as::<MiracleDraft>(&backend, &cmd.json, output).await,
        EntityKind::Banner => create_as::<BannerDraft>(&backend, &cmd.json, output).await,
        EntityKind::Setting => output.error(SETTING_HINT, ExitCode::InvalidArgs),
    }
}

async fn update_as<P>(backend: &Backend, id: &EntityId, json: &str, output: &Output) -> ExitCode
where
    P: Patch + DeserializeOwned,
{
    let patch: P = match serde_json::from_str(json) {
        Ok(patch) => patch,
        Err(e) => return output.error(format!("Invalid patch JSON: {}", e), ExitCode::InvalidArgs),
    };
    match backend.cache.update(id, &patch).await {
        Ok(Some(record)) => print(output, record),
        Ok(None) => output.error(
            format!("No {} with id {}", <P::Entity as Entity>::TABLE, id),
            ExitCode::NotFound,
        ),
        Err(e) => output.error(format!("Update failed: {}", e), cache_exit(&e)),
    }
}

pub async fn update_cmd(cmd: UpdateCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let id = parse_id(&cmd.id);
    match cmd.kind {
        EntityKind::Category => update_as::<CategoryPatch>(&backend, &id, &cmd.json, output).await,
        EntityKind::Collection => {
            update_as::<CollectionPatch>(&backend, &id, &cmd.json, output).await
        }
        EntityKind::Meditation => {
            update_as::<MeditationPatch>(&backend, &id, &cmd.json, output).await
        }
        EntityKind::Episode => update_as::<EpisodePatch>(&backend, &id, &cmd.json, output).await,
        EntityKind::Miracle => update_as::<MiraclePatch>(&backend, &id, &cmd.json, output).await,
        EntityKind::Banner => update_as::<BannerPatch>(&backend, &id, &cmd.json, output).await,
        EntityKind::Setting => output.error(SETTING_HINT, ExitCode::InvalidArgs),
    }
}

async fn delete_as<E: Entity>(backend: &Backend, id: &EntityId, output: &Output) -> ExitCode {
    let existed = backend.cache.snapshot().get::<E>(id).is_some();
    match backend.cache.delete::<E>(id).await {
        Ok(()) if existed => print(output, StatusOk::default()),
        Ok(()) => output.error(format!("No {} with id {}", E::TABLE, id), ExitCode::NotFound),
        Err(e) => output.error(format!("Delete failed: {}", e), cache_exit(&e)),
    }
}

pub async fn delete_cmd(cmd: DeleteCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let id = parse_id(&cmd.id);
    match cmd.kind {
        EntityKind::Category => delete_as::<Category>(&backend, &id, output).await,
        EntityKind::Collection => delete_as::<Collection>(&backend, &id, output).await,
        EntityKind::Meditation => delete_as::<Meditation>(&backend, &id, output).await,
        EntityKind::Episode => delete_as::<Episode>(&backend, &id, output).await,
        EntityKind::Miracle => delete_as::<Miracle>(&backend, &id, output).await,
        EntityKind::Banner => delete_as::<Banner>(&backend, &id, output).await,
        EntityKind::Setting => output.error(SETTING_HINT, ExitCode::InvalidArgs),
    }
}

pub async fn setting_cmd(cmd: SettingCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    match backend.cache.set_site_setting(&cmd.key, &cmd.value).await {
        Ok(()) => print(output, backend.cache.snapshot().site_settings()),
        Err(e) => output.error(format!("Saving setting failed: {}", e), cache_exit(&e)),
    }
}

// =============================================================================
// Upload
// =============================================================================

pub async fn upload_cmd(cmd: UploadCmd, ctx: &Context, output: &Output) -> ExitCode {
    let bytes = match tokio::fs::read(&cmd.file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return output.error(
                format!("Cannot read {}: {}", cmd.file.display(), e),
                ExitCode::InvalidArgs,
            )
        }
    };
    let file_name = cmd
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    output.info(format!("Uploading {}...", cmd.file.display()));

    #[derive(Serialize)]
    struct Uploaded {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        banner: Option<Arc<Banner>>,
    }

    let result = match AssetKind::from(cmd.kind) {
        AssetKind::Logo => replace_site_logo(&backend.uploader, &backend.cache, &file_name, bytes)
            .await
            .map(|url| Uploaded { url, banner: None }),
        AssetKind::Banner => add_banner_from_upload(
            &backend.uploader,
            &backend.cache,
            &file_name,
            bytes,
            cmd.title,
        )
        .await
        .map(|banner| Uploaded {
            url: banner.image_url.clone(),
            banner: Some(banner),
        }),
        kind => backend
            .uploader
            .upload(kind, &file_name, bytes)
            .await
            .map(|url| Uploaded { url, banner: None }),
    };

    match result {
        Ok(uploaded) => print(output, uploaded),
        Err(e) => output.error(e.to_string(), upload_exit(&e)),
    }
}

// =============================================================================
// Resolve
// =============================================================================

#[derive(Serialize)]
struct Resolved {
    input: String,
    normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    drive_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    youtube_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embed_url: Option<String>,
}

pub fn resolve_cmd(cmd: ResolveCmd, output: &Output) -> ExitCode {
    let video = youtube_id(&cmd.url);
    let resolved = Resolved {
        normalized: normalize_link(&cmd.url).into_owned(),
        drive_file_id: resolver::drive_file_id(&cmd.url).map(str::to_string),
        youtube_id: video.map(str::to_string),
        embed_url: video.map(resolver::youtube_embed_url),
        input: cmd.url,
    };
    print(output, resolved)
}

// =============================================================================
// Play
// =============================================================================

/// Item plus playlist for a record, or `None` if the record is unknown
fn playable(catalog: &Catalog, kind: PlayableKind, id: &EntityId) -> Option<(PlayableItem, Vec<PlayableItem>)> {
    match kind {
        PlayableKind::Miracle => {
            let miracle = catalog.get::<Miracle>(id)?;
            let playlist = catalog
                .miracles()
                .iter()
                .map(|m| PlayableItem::from_miracle(m))
                .collect();
            Some((PlayableItem::from_miracle(miracle), playlist))
        }
        PlayableKind::Episode => {
            let episode = catalog.get::<Episode>(id)?;
            let parent = catalog.meditation(&episode.meditation_id).map(|m| m.as_ref());
            let playlist = catalog
                .episodes_for(&episode.meditation_id)
                .iter()
                .map(|e| PlayableItem::from_episode(e, parent))
                .collect();
            Some((PlayableItem::from_episode(episode, parent), playlist))
        }
    }
}

#[derive(Serialize)]
struct Playing {
    state: PlayerState,
    kind: MediaKind,
    header: &'static str,
    title: String,
    subtitle: String,
    player: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    playlist: usize,
}

pub async fn play_cmd(cmd: PlayCmd, ctx: &Context, output: &Output) -> ExitCode {
    let (backend, _) = match open_catalog(ctx, output).await {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let id = parse_id(&cmd.id);
    let Some((item, playlist)) = playable(&backend.cache.snapshot(), cmd.kind, &id) else {
        return output.error(format!("Not found: {}", id), ExitCode::NotFound);
    };

    let Some(url) = item.media_url() else {
        return output.error(
            format!("\"{}\" has no playable media", item.info().title),
            ExitCode::PlayerFailed,
        );
    };

    let player_type: PlayerType = cmd.player.map(Into::into).unwrap_or(ctx.config.player());
    let player = LocalPlayer::new(player_type);
    if !player.is_available().await {
        return output.error(
            format!("{} not found. Install it first.", player_type.display_name()),
            ExitCode::PlayerFailed,
        );
    }

    output.info(format!("Opening in {}...", player_type.display_name()));

    let mut controller = PlaybackController::new(player);
    controller.open(item, playlist);

    let is_video = matches!(controller.current(), Some(PlayableItem::Video(_)));
    if is_video {
        if let Err(e) = controller.element_mut().spawn(&url, MediaKind::Video) {
            controller.close();
            return output.error(e.to_string(), ExitCode::PlayerFailed);
        }
    } else if !controller.is_playing() {
        controller.close();
        return output.error(
            format!("{} did not start", player_type.display_name()),
            ExitCode::PlayerFailed,
        );
    }

    let Some(current) = controller.current() else {
        return ExitCode::Error;
    };
    let info = current.info();
    let status = Playing {
        state: controller.state(),
        kind: current.kind(),
        header: controller.header_label(),
        title: info.title.clone(),
        subtitle: info.subtitle().to_string(),
        player: player_type.display_name().to_string(),
        url: Some(url),
        playlist: controller.playlist().len(),
    };
    let code = print(output, status);

    if !cmd.no_wait {
        if let Err(e) = controller.element_mut().wait().await {
            output.info(format!("Player exited with error: {}", e));
        }
        controller.close();
    }
    code
}

// =============================================================================
// Accounts
// =============================================================================

pub async fn login_cmd(cmd: LoginCmd, ctx: &mut Context, output: &Output) -> ExitCode {
    let client = match ctx.auth_client() {
        Ok(client) => client,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };

    let session = match client.sign_in(&cmd.email, &cmd.password).await {
        Ok(session) => session,
        Err(e) => return output.error(format!("Sign-in failed: {}", e), auth_exit(&e)),
    };

    let role = AuthClient::new(
        ctx.config.store_url().unwrap_or_default(),
        ctx.config.anon_key().unwrap_or_default(),
    )
    .with_access_token(&session.access_token)
    .role_or_default(&session.user.id)
    .await;

    ctx.config.access_token = Some(session.access_token);
    if let Err(e) = ctx.save_config() {
        return output.error(format!("Signed in, but saving the session failed: {}", e), ExitCode::Error);
    }

    print(output, Whoami { user: session.user, role })
}

pub async fn logout_cmd(ctx: &mut Context, output: &Output) -> ExitCode {
    let client = match ctx.auth_client() {
        Ok(client) => client,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };

    match client.sign_out().await {
        Ok(()) => {}
        Err(AuthError::NotSignedIn) => {
            return output.error("Not signed in", ExitCode::Unauthorized);
        }
        Err(e) => output.info(format!("Remote sign-out failed ({}), forgetting session anyway", e)),
    }

    ctx.config.access_token = None;
    if let Err(e) = ctx.save_config() {
        return output.error(format!("Saving config failed: {}", e), ExitCode::Error);
    }
    print(output, StatusOk::default())
}

#[derive(Serialize)]
struct Whoami {
    user: User,
    role: Role,
}

async fn signed_in(client: &AuthClient, output: &Output) -> Result<Whoami, ExitCode> {
    match client.current_user().await {
        Ok(Some(user)) => {
            let role = client.role_or_default(&user.id).await;
            Ok(Whoami { user, role })
        }
        Ok(None) => Err(output.error("Not signed in", ExitCode::Unauthorized)),
        Err(e) => Err(output.error(format!("Session lookup failed: {}", e), auth_exit(&e))),
    }
}

pub async fn whoami_cmd(ctx: &Context, output: &Output) -> ExitCode {
    let client = match ctx.auth_client() {
        Ok(client) => client,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    match signed_in(&client, output).await {
        Ok(me) => print(output, me),
        Err(code) => code,
    }
}

pub async fn add_admin_cmd(cmd: AddAdminCmd, ctx: &Context, output: &Output) -> ExitCode {
    let client = match ctx.auth_client() {
        Ok(client) => client,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let me = match signed_in(&client, output).await {
        Ok(me) => me,
        Err(code) => return code,
    };

    match client
        .create_sub_admin(me.role, &cmd.email, &cmd.password, cmd.role.into())
        .await
    {
        Ok(user) => print(output, user),
        Err(e) => output.error(format!("Creating administrator failed: {}", e), auth_exit(&e)),
    }
}
