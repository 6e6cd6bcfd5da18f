use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use crate::{
    blob::BlobStorage,
    bytestream,
    channel::{self, Channel},
    db::Db,
    episode::{self, EpisodeCreate},
    external::{RemoteVideoService, VideoListEntry},
    ks, ChannelId, Result,
};

/// Single-flight guard: at most one in-flight refresh per channel.
///
/// Both the background scheduler and on-demand triggers funnel through this
/// set; a refresh finding its channel already present is a logged no-op.
/// Refreshes of different channels run in parallel freely.
#[derive(Debug, Default, Clone)]
pub(crate) struct RefreshLock {
    refreshing: Arc<Mutex<HashSet<ChannelId>>>,
}

impl RefreshLock {
    fn acquire(&self, channel_id: ChannelId) -> Option<RefreshPermit> {
        let mut refreshing = self.refreshing.lock().unwrap();
        if !refreshing.insert(channel_id) {
            return None;
        }
        Some(RefreshPermit {
            refreshing: self.refreshing.clone(),
            channel_id,
        })
    }
}

struct RefreshPermit {
    refreshing: Arc<Mutex<HashSet<ChannelId>>>,
    channel_id: ChannelId,
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.refreshing.lock().unwrap().remove(&self.channel_id);
    }
}

/// Bring a channel's local episode set up to date with its remote uploads.
///
/// Videos are processed in the order the remote listing returns them. A
/// failure on one video is logged and does not abort the rest of the batch;
/// a failure to list videos at all aborts this channel's cycle.
pub(crate) async fn refresh_channel(
    db: &Db,
    storage: &dyn BlobStorage,
    service: &dyn RemoteVideoService,
    lock: &RefreshLock,
    max_videos: u32,
    channel: &Channel,
) -> Result<()> {
    let _permit = match lock.acquire(channel.id) {
        Some(permit) => permit,
        None => {
            tracing::info!(
                "refresh already in progress for channel {}, skipping",
                channel.id
            );
            return Ok(());
        }
    };

    tracing::info!("refreshing channel: {}", channel.name);
    let videos = service.list_videos(&channel.youtube_id, max_videos).await?;

    for video in videos {
        // an episode that already has audio is satisfied; skip it before
        // any remote metadata call
        let existing = {
            let mut conn = db.acquire().await?;
            episode::lookup(&mut conn, &video.video_id).await?
        };
        if existing.as_ref().is_some_and(|episode| episode.is_ready()) {
            continue;
        }

        tracing::info!("processing new video: {}", video.title);
        if let Err(err) = process_video(db, storage, service, channel, &video).await {
            tracing::error!("failed to process video {}: {}", video.video_id, err);
        }
    }

    Ok(())
}

/// Refresh every registered channel. One channel's failure never blocks the
/// channels after it.
pub(crate) async fn refresh_all(
    db: &Db,
    storage: &dyn BlobStorage,
    service: &dyn RemoteVideoService,
    lock: &RefreshLock,
    max_videos: u32,
) -> Result<()> {
    let channels = {
        let mut conn = db.acquire().await?;
        channel::list(&mut conn).await?
    };

    for channel in channels {
        if let Err(err) =
            refresh_channel(db, storage, service, lock, max_videos, &channel).await
        {
            tracing::error!("failed to refresh channel {}: {}", channel.name, err);
        }
    }

    Ok(())
}

async fn process_video(
    db: &Db,
    storage: &dyn BlobStorage,
    service: &dyn RemoteVideoService,
    channel: &Channel,
    video: &VideoListEntry,
) -> Result<()> {
    let metadata = service.fetch_metadata(&video.video_id).await?;
    let stream = service.download_audio(&video.video_id).await?;

    // spool the audio to disk first: gives us the byte size and checksum,
    // and no database connection is held during the transfer
    let temp_dir = tempfile::tempdir()?;
    let temp_path = temp_dir.path().join("audio.mp3");
    let size = bytestream::to_file(stream, &temp_path).await?;
    let sha256 = ks::sha256_file(&temp_path).await?;

    let key = episode::audio_key(&video.video_id);
    storage
        .write(&key, bytestream::from_file(&temp_path).await?)
        .await?;

    let mut tx = db.begin().await?;
    let episode = episode::upsert_discovered(
        &mut tx,
        EpisodeCreate {
            channel: channel.id,
            video_id: video.video_id.clone(),
            title: metadata.title,
            description: metadata.description,
            duration_secs: metadata.duration_secs,
            published_at: metadata.published_at,
            thumbnail_url: metadata.thumbnail_url,
        },
    )
    .await?;
    episode::mark_downloaded(&mut tx, episode.id, &key, size, &sha256).await?;
    tx.commit().await?;

    tracing::info!("downloaded: {} ({})", episode.title, episode.video_id);
    Ok(())
}
