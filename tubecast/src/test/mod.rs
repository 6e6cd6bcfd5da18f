use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    async_trait,
    bytestream::{self, ByteStream},
    Channel, ChannelCreate, Context, Error, ErrorKind, RemoteChannel, RemoteVideoService, Result,
    VideoId, VideoListEntry, VideoMetadata,
};

/// In-memory stand-in for the remote video service. Channels and videos are
/// registered up front; listings come back newest first, like the real
/// service. Individual videos and whole channels can be made to fail.
#[derive(Debug, Default)]
pub struct StaticRemoteVideoService {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    channels: HashMap<String, RemoteChannel>,
    videos: HashMap<String, Vec<VideoListEntry>>,
    metadata: HashMap<VideoId, VideoMetadata>,
    audio: HashMap<VideoId, Bytes>,
    failing_audio: HashSet<VideoId>,
    failing_listings: HashSet<String>,
    download_counts: HashMap<VideoId, u32>,
}

impl StaticRemoteVideoService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_channel(&self, youtube_id: &str, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.channels.insert(
            youtube_id.to_string(),
            RemoteChannel {
                youtube_id: youtube_id.to_string(),
                name: name.to_string(),
            },
        );
        inner.videos.entry(youtube_id.to_string()).or_default();
    }

    /// Register a video as the channel's newest upload. Listing order is
    /// reverse-chronological, so the most recently added video comes first.
    pub fn add_video(&self, youtube_id: &str, video_id: &str, title: &str) {
        let video_id = VideoId::from(video_id);
        let mut inner = self.inner.lock().unwrap();
        let position = inner.videos.get(youtube_id).map(|v| v.len()).unwrap_or(0);
        let published_at = base_publish_time() + Duration::hours(position as i64);
        inner.metadata.insert(
            video_id.clone(),
            VideoMetadata {
                title: title.to_string(),
                description: format!("Description of {}", title),
                duration_secs: 60,
                published_at: Some(published_at),
                thumbnail_url: None,
            },
        );
        inner.audio.insert(
            video_id.clone(),
            Bytes::from(format!("audio bytes of {}", video_id)),
        );
        let entry = VideoListEntry {
            url: crate::video_watch_url(&video_id),
            video_id,
            title: title.to_string(),
        };
        inner
            .videos
            .entry(youtube_id.to_string())
            .or_default()
            .insert(0, entry);
    }

    pub fn fail_audio(&self, video_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_audio.insert(VideoId::from(video_id));
    }

    pub fn fail_listing(&self, youtube_id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.failing_listings.insert(youtube_id.to_string());
    }

    /// How many times a video's audio was downloaded. Used to assert that
    /// repeated refreshes never re-download a satisfied episode.
    pub fn download_count(&self, video_id: &str) -> u32 {
        let inner = self.inner.lock().unwrap();
        inner
            .download_counts
            .get(&VideoId::from(video_id))
            .copied()
            .unwrap_or(0)
    }
}

fn base_publish_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

#[async_trait]
impl RemoteVideoService for StaticRemoteVideoService {
    async fn resolve_channel(&self, input: &str) -> Result<RemoteChannel> {
        let key = input
            .trim()
            .trim_start_matches("https://www.youtube.com/channel/")
            .trim_start_matches('@');
        let inner = self.inner.lock().unwrap();
        inner
            .channels
            .get(key)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, "channel not found"))
    }

    async fn list_videos(&self, youtube_id: &str, max_count: u32) -> Result<Vec<VideoListEntry>> {
        let inner = self.inner.lock().unwrap();
        if inner.failing_listings.contains(youtube_id) {
            return Err(Error::internal("listing failed"));
        }
        let videos = inner
            .videos
            .get(youtube_id)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, "channel not found"))?;
        Ok(videos.iter().take(max_count as usize).cloned().collect())
    }

    async fn fetch_metadata(&self, video_id: &VideoId) -> Result<VideoMetadata> {
        let inner = self.inner.lock().unwrap();
        inner
            .metadata
            .get(video_id)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, "video not found"))
    }

    async fn download_audio(&self, video_id: &VideoId) -> Result<ByteStream> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_audio.contains(video_id) {
            return Err(Error::internal("audio extraction failed"));
        }
        let bytes = inner
            .audio
            .get(video_id)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, "video not found"))?;
        *inner.download_counts.entry(video_id.clone()).or_insert(0) += 1;
        Ok(bytestream::from_bytes(bytes))
    }
}

pub fn create_config_memory(service: Arc<StaticRemoteVideoService>) -> crate::Config {
    crate::Config::new(":memory:", crate::StorageBackend::Memory, service)
}

pub async fn create_context_memory() -> (Context, Arc<StaticRemoteVideoService>) {
    let service = StaticRemoteVideoService::new();
    let context = crate::new(create_config_memory(service.clone())).await.unwrap();
    (context, service)
}

pub async fn create_context(config: crate::Config) -> Context {
    crate::new(config).await.unwrap()
}

pub async fn create_channel(ctx: &Context, youtube_id: &str, name: &str) -> Channel {
    crate::channel_create(
        ctx,
        ChannelCreate {
            youtube_id: youtube_id.to_string(),
            name: name.to_string(),
            url: crate::channel_url(youtube_id),
        },
    )
    .await
    .unwrap()
}
