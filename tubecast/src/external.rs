use chrono::{DateTime, Utc};

use crate::{async_trait, bytestream::ByteStream, Result};

// The remote video service is everything this crate knows about YouTube:
// - resolve whatever the user typed (URL, @handle, raw channel id) to a
//   canonical channel id and display name
// - list a channel's most recent uploads, newest first
// - fetch the full metadata for one video
// - extract a video's audio as a byte stream

/// Identifier of a video on the remote service. Globally unique: one video
/// maps to at most one local episode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct RemoteChannel {
    pub youtube_id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct VideoListEntry {
    pub video_id: VideoId,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub duration_secs: u32,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
}

#[async_trait]
pub trait RemoteVideoService: Send + Sync + 'static {
    async fn resolve_channel(&self, input: &str) -> Result<RemoteChannel>;
    async fn list_videos(&self, youtube_id: &str, max_count: u32) -> Result<Vec<VideoListEntry>>;
    async fn fetch_metadata(&self, video_id: &VideoId) -> Result<VideoMetadata>;
    async fn download_audio(&self, video_id: &VideoId) -> Result<ByteStream>;
}

pub fn video_watch_url(video_id: &VideoId) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

pub fn channel_url(youtube_id: &str) -> String {
    format!("https://www.youtube.com/channel/{}", youtube_id)
}

pub fn channel_videos_url(youtube_id: &str) -> String {
    format!("https://www.youtube.com/channel/{}/videos", youtube_id)
}
