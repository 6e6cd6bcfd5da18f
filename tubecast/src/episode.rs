use chrono::{DateTime, Utc};

use crate::{
    db::{self, DbC},
    ChannelId, EpisodeId, Error, ErrorKind, Result, VideoId,
};

/// Local record for one remote video. An episode without an audio artifact
/// is pending and excluded from feed rendering.
#[derive(Debug, Clone)]
pub struct Episode {
    pub id: EpisodeId,
    pub channel: ChannelId,
    pub video_id: VideoId,
    pub title: String,
    pub description: String,
    pub duration_secs: u32,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub audio: Option<EpisodeAudio>,
}

impl Episode {
    pub fn is_ready(&self) -> bool {
        self.audio.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeAudio {
    pub key: String,
    pub size: u64,
    pub sha256: Option<String>,
    pub downloaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct EpisodeCreate {
    pub channel: ChannelId,
    pub video_id: VideoId,
    pub title: String,
    pub description: String,
    pub duration_secs: u32,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
}

/// Public filename of a video's audio artifact. Must map uniquely back to
/// the video id; see `video_id_from_audio_filename`.
pub fn audio_filename(video_id: &VideoId) -> String {
    format!("{}.mp3", video_id)
}

/// Blob-storage key under which a video's audio artifact is stored.
pub fn audio_key(video_id: &VideoId) -> String {
    format!("audio/{}", audio_filename(video_id))
}

/// Inverse of `audio_filename`. `None` when the name carries the wrong
/// extension or path separators (nothing to serve).
pub fn video_id_from_audio_filename(filename: &str) -> Option<VideoId> {
    let stem = filename.strip_suffix(".mp3")?;
    if stem.is_empty() || stem.contains('/') || stem.contains('\\') || stem.contains("..") {
        return None;
    }
    Some(VideoId::from(stem))
}

#[derive(Debug, sqlx::FromRow)]
struct EpisodeView {
    id: i64,
    channel: i64,
    video_id: String,
    title: String,
    description: String,
    duration_secs: i64,
    published_at: Option<String>,
    thumbnail_url: Option<String>,
    audio_key: Option<String>,
    audio_size: Option<i64>,
    audio_sha256: Option<String>,
    downloaded_at: Option<String>,
}

impl From<EpisodeView> for Episode {
    fn from(view: EpisodeView) -> Episode {
        let audio = view.audio_key.map(|key| EpisodeAudio {
            key,
            size: view.audio_size.unwrap_or(0) as u64,
            sha256: view.audio_sha256,
            downloaded_at: view
                .downloaded_at
                .as_deref()
                .and_then(db::decode_datetime),
        });
        Episode {
            id: EpisodeId::from_db(view.id),
            channel: ChannelId::from_db(view.channel),
            video_id: VideoId::from(view.video_id),
            title: view.title,
            description: view.description,
            duration_secs: view.duration_secs as u32,
            published_at: view.published_at.as_deref().and_then(db::decode_datetime),
            thumbnail_url: view.thumbnail_url,
            audio,
        }
    }
}

/// Record a discovered video. Creates the episode if the video id is unseen;
/// otherwise refreshes the metadata columns and leaves the audio state
/// untouched, so re-listing never clobbers a completed download.
#[tracing::instrument(skip(db))]
pub async fn upsert_discovered(db: &mut DbC, create: EpisodeCreate) -> Result<Episode> {
    let published_at = create.published_at.map(db::encode_datetime);
    sqlx::query(
        r#"
INSERT INTO episode (channel, video_id, title, description, duration_secs, published_at, thumbnail_url)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (video_id) DO UPDATE SET
    title = excluded.title,
    description = excluded.description,
    duration_secs = excluded.duration_secs,
    published_at = excluded.published_at,
    thumbnail_url = excluded.thumbnail_url
"#,
    )
    .bind(create.channel)
    .bind(create.video_id.as_str())
    .bind(&create.title)
    .bind(&create.description)
    .bind(create.duration_secs as i64)
    .bind(&published_at)
    .bind(&create.thumbnail_url)
    .execute(&mut *db)
    .await?;
    get_by_video_id(db, &create.video_id).await
}

/// Transition an episode from pending to downloaded. Idempotent: repeating
/// the call leaves the original download timestamp in place.
#[tracing::instrument(skip(db))]
pub async fn mark_downloaded(
    db: &mut DbC,
    episode_id: EpisodeId,
    audio_key: &str,
    audio_size: u64,
    audio_sha256: &str,
) -> Result<Episode> {
    let downloaded_at = db::encode_datetime(Utc::now());
    let result = sqlx::query(
        r#"
UPDATE episode
SET audio_key = ?,
    audio_size = ?,
    audio_sha256 = ?,
    downloaded_at = COALESCE(downloaded_at, ?)
WHERE id = ?
"#,
    )
    .bind(audio_key)
    .bind(audio_size as i64)
    .bind(audio_sha256)
    .bind(&downloaded_at)
    .bind(episode_id)
    .execute(&mut *db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(Error::new(ErrorKind::NotFound, "episode not found"));
    }
    get(db, episode_id).await
}

#[tracing::instrument(skip(db))]
pub async fn get(db: &mut DbC, episode_id: EpisodeId) -> Result<Episode> {
    let view = sqlx::query_as::<_, EpisodeView>("SELECT * FROM episode WHERE id = ?")
        .bind(episode_id)
        .fetch_optional(&mut *db)
        .await?;
    match view {
        Some(view) => Ok(Episode::from(view)),
        None => Err(Error::new(ErrorKind::NotFound, "episode not found")),
    }
}

#[tracing::instrument(skip(db))]
pub async fn get_by_video_id(db: &mut DbC, video_id: &VideoId) -> Result<Episode> {
    match lookup(db, video_id).await? {
        Some(episode) => Ok(episode),
        None => Err(Error::new(ErrorKind::NotFound, "episode not found")),
    }
}

#[tracing::instrument(skip(db))]
pub async fn lookup(db: &mut DbC, video_id: &VideoId) -> Result<Option<Episode>> {
    let view = sqlx::query_as::<_, EpisodeView>("SELECT * FROM episode WHERE video_id = ?")
        .bind(video_id.as_str())
        .fetch_optional(&mut *db)
        .await?;
    Ok(view.map(Episode::from))
}

/// Episodes with a downloaded artifact, newest publish date first.
#[tracing::instrument(skip(db))]
pub async fn list_ready(db: &mut DbC, channel_id: ChannelId) -> Result<Vec<Episode>> {
    let views = sqlx::query_as::<_, EpisodeView>(
        "SELECT * FROM episode WHERE channel = ? AND audio_key IS NOT NULL ORDER BY published_at DESC",
    )
    .bind(channel_id)
    .fetch_all(&mut *db)
    .await?;
    Ok(views.into_iter().map(Episode::from).collect())
}

#[tracing::instrument(skip(db))]
pub async fn list_by_channel(db: &mut DbC, channel_id: ChannelId) -> Result<Vec<Episode>> {
    let views = sqlx::query_as::<_, EpisodeView>(
        "SELECT * FROM episode WHERE channel = ? ORDER BY published_at DESC",
    )
    .bind(channel_id)
    .fetch_all(&mut *db)
    .await?;
    Ok(views.into_iter().map(Episode::from).collect())
}

/// Delete all of a channel's episodes, returning the audio keys of the
/// removed artifacts so the caller can clean up blob storage.
#[tracing::instrument(skip(db))]
pub async fn delete_by_channel(db: &mut DbC, channel_id: ChannelId) -> Result<Vec<String>> {
    let keys: Vec<String> = sqlx::query_scalar(
        "SELECT audio_key FROM episode WHERE channel = ? AND audio_key IS NOT NULL",
    )
    .bind(channel_id)
    .fetch_all(&mut *db)
    .await?;
    sqlx::query("DELETE FROM episode WHERE channel = ?")
        .bind(channel_id)
        .execute(&mut *db)
        .await?;
    Ok(keys)
}
