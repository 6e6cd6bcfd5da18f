use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    blob::{self, BlobStorage},
    bytestream::ByteStream,
    channel::{self, AuthUpdate, Channel, ChannelCreate, FeedToken},
    db::Db,
    episode::{self, Episode},
    external::{self, RemoteVideoService},
    feed, migrations,
    refresh::{self, RefreshLock},
    ChannelId, EpisodeId, Error, ErrorKind, Result, VideoId,
};

mod refresh_process;

pub const DEFAULT_MAX_VIDEOS_PER_REFRESH: u32 = 10;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Default, Clone)]
pub enum StorageBackend {
    #[default]
    Memory,
    Filesystem {
        path: PathBuf,
    },
}

pub struct Config {
    database_url: String,
    storage_backend: StorageBackend,
    base_url: String,
    max_videos_per_refresh: u32,
    refresh_interval: Duration,
    service: Arc<dyn RemoteVideoService>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("storage_backend", &self.storage_backend)
            .field("base_url", &self.base_url)
            .field("max_videos_per_refresh", &self.max_videos_per_refresh)
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}

impl Config {
    pub fn new(
        database_url: impl Into<String>,
        storage_backend: StorageBackend,
        service: Arc<dyn RemoteVideoService>,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            storage_backend,
            base_url: "http://localhost:3000".to_string(),
            max_videos_per_refresh: DEFAULT_MAX_VIDEOS_PER_REFRESH,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            service,
        }
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
    }

    pub fn set_max_videos_per_refresh(&mut self, max_videos: u32) {
        self.max_videos_per_refresh = max_videos;
    }

    pub fn set_refresh_interval(&mut self, interval: Duration) {
        self.refresh_interval = interval;
    }
}

#[derive(Clone)]
pub struct Context {
    db: Db,
    storage: Arc<dyn BlobStorage>,
    service: Arc<dyn RemoteVideoService>,
    refresh_lock: RefreshLock,
    base_url: Arc<str>,
    max_videos_per_refresh: u32,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("storage", &self.storage)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub async fn new(config: Config) -> Result<Context> {
    let opts: sqlx::sqlite::SqliteConnectOptions = config.database_url.parse()?;
    let opts = opts
        .create_if_missing(true)
        .read_only(false)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
    // a pooled in-memory database must stay on a single connection: every
    // additional connection would open a fresh empty database
    let max_connections = if config.database_url.contains(":memory:") {
        1
    } else {
        16
    };
    let db = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .map_err(|e| Error::with_source(ErrorKind::Internal, "failed to connect to database", e))?;
    migrations::run(&db).await?;

    let storage = match config.storage_backend {
        StorageBackend::Memory => {
            Arc::new(blob::MemoryBlobStorage::default()) as Arc<dyn BlobStorage>
        }
        StorageBackend::Filesystem { ref path } => {
            Arc::new(blob::FilesystemBlobStorage::new(path.clone())) as Arc<dyn BlobStorage>
        }
    };

    let context = Context {
        db,
        storage,
        service: config.service,
        refresh_lock: RefreshLock::default(),
        base_url: Arc::from(config.base_url.trim_end_matches('/')),
        max_videos_per_refresh: config.max_videos_per_refresh,
    };

    tokio::spawn(refresh_process::run(
        context.clone(),
        config.refresh_interval,
    ));

    Ok(context)
}

/// Register a channel from whatever the user typed: a channel URL, an
/// `@handle`, or a raw channel id. The channel is resolved remotely, stored,
/// and given an initial refresh before this returns.
#[tracing::instrument(skip(context))]
pub async fn channel_add(context: &Context, input: &str) -> Result<Channel> {
    let remote = context.service.resolve_channel(input).await?;
    let create = ChannelCreate {
        url: external::channel_url(&remote.youtube_id),
        youtube_id: remote.youtube_id,
        name: remote.name,
    };
    let channel = channel_create(context, create).await?;
    if let Err(err) = refresh_channel(context, channel.id).await {
        tracing::error!("initial refresh of channel {} failed: {}", channel.name, err);
    }
    channel_get(context, channel.id).await
}

#[tracing::instrument(skip(context))]
pub async fn channel_create(context: &Context, create: ChannelCreate) -> Result<Channel> {
    let mut tx = context.db.begin().await?;
    let result = channel::create(&mut tx, create).await?;
    tx.commit().await?;
    Ok(result)
}

#[tracing::instrument(skip(context))]
pub async fn channel_get(context: &Context, channel_id: ChannelId) -> Result<Channel> {
    let mut conn = context.db.acquire().await?;
    channel::get(&mut conn, channel_id).await
}

#[tracing::instrument(skip(context))]
pub async fn channel_get_by_youtube_id(context: &Context, youtube_id: &str) -> Result<Channel> {
    let mut conn = context.db.acquire().await?;
    channel::get_by_youtube_id(&mut conn, youtube_id).await
}

#[tracing::instrument(skip(context, token))]
pub async fn channel_get_by_token(context: &Context, token: &FeedToken) -> Result<Channel> {
    let mut conn = context.db.acquire().await?;
    channel::get_by_token(&mut conn, token).await
}

#[tracing::instrument(skip(context))]
pub async fn channel_list(context: &Context) -> Result<Vec<Channel>> {
    let mut conn = context.db.acquire().await?;
    channel::list(&mut conn).await
}

/// Delete a channel, its episodes and their audio artifacts.
#[tracing::instrument(skip(context))]
pub async fn channel_delete(context: &Context, channel_id: ChannelId) -> Result<()> {
    let mut tx = context.db.begin().await?;
    let audio_keys = episode::delete_by_channel(&mut tx, channel_id).await?;
    channel::delete(&mut tx, channel_id).await?;
    tx.commit().await?;

    for key in audio_keys {
        if let Err(err) = context.storage.delete(&key).await {
            tracing::warn!("failed to delete audio artifact {}: {}", key, err);
        }
    }
    Ok(())
}

/// Switch a channel's auth policy. On a switch to token mode the returned
/// channel carries the freshly generated token.
#[tracing::instrument(skip(context))]
pub async fn channel_update_auth(
    context: &Context,
    channel_id: ChannelId,
    update: AuthUpdate,
) -> Result<Channel> {
    let mut tx = context.db.begin().await?;
    let result = channel::update_auth(&mut tx, channel_id, update).await?;
    tx.commit().await?;
    Ok(result)
}

#[tracing::instrument(skip(context))]
pub async fn episode_get(context: &Context, episode_id: EpisodeId) -> Result<Episode> {
    let mut conn = context.db.acquire().await?;
    episode::get(&mut conn, episode_id).await
}

#[tracing::instrument(skip(context))]
pub async fn episode_get_by_video_id(context: &Context, video_id: &VideoId) -> Result<Episode> {
    let mut conn = context.db.acquire().await?;
    episode::get_by_video_id(&mut conn, video_id).await
}

#[tracing::instrument(skip(context))]
pub async fn episode_list_ready(context: &Context, channel_id: ChannelId) -> Result<Vec<Episode>> {
    let mut conn = context.db.acquire().await?;
    episode::list_ready(&mut conn, channel_id).await
}

#[tracing::instrument(skip(context))]
pub async fn episode_list_by_channel(
    context: &Context,
    channel_id: ChannelId,
) -> Result<Vec<Episode>> {
    let mut conn = context.db.acquire().await?;
    episode::list_by_channel(&mut conn, channel_id).await
}

/// Refresh a single channel now. Shares the per-channel single-flight guard
/// with the background scheduler; an overlapping request is a no-op.
#[tracing::instrument(skip(context))]
pub async fn refresh_channel(context: &Context, channel_id: ChannelId) -> Result<()> {
    let channel = channel_get(context, channel_id).await?;
    refresh::refresh_channel(
        &context.db,
        &*context.storage,
        &*context.service,
        &context.refresh_lock,
        context.max_videos_per_refresh,
        &channel,
    )
    .await
}

/// Refresh every registered channel.
#[tracing::instrument(skip(context))]
pub async fn refresh_all(context: &Context) -> Result<()> {
    refresh::refresh_all(
        &context.db,
        &*context.storage,
        &*context.service,
        &context.refresh_lock,
        context.max_videos_per_refresh,
    )
    .await
}

/// Render a channel's feed document.
#[tracing::instrument(skip(context))]
pub async fn feed_rss(context: &Context, channel_id: ChannelId) -> Result<String> {
    let channel = channel_get(context, channel_id).await?;
    let episodes = episode_list_ready(context, channel_id).await?;
    Ok(feed::render(&context.base_url, &channel, &episodes))
}

/// Render the feed of the channel carrying this token.
#[tracing::instrument(skip(context, token))]
pub async fn feed_rss_by_token(context: &Context, token: &FeedToken) -> Result<String> {
    let channel = channel_get_by_token(context, token).await?;
    let episodes = episode_list_ready(context, channel.id).await?;
    Ok(feed::render(&context.base_url, &channel, &episodes))
}

pub struct AudioDownload {
    pub mime_type: String,
    pub size: u64,
    pub stream: ByteStream,
}

impl std::fmt::Debug for AudioDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDownload")
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish()
    }
}

/// Open an episode's audio artifact for streaming.
#[tracing::instrument(skip(context))]
pub async fn audio_download(context: &Context, episode_id: EpisodeId) -> Result<AudioDownload> {
    let episode = episode_get(context, episode_id).await?;
    let audio = episode
        .audio
        .ok_or_else(|| Error::new(ErrorKind::NotFound, "audio not available"))?;
    let stream = context.storage.read(&audio.key).await?;
    Ok(AudioDownload {
        mime_type: "audio/mpeg".to_string(),
        size: audio.size,
        stream,
    })
}
