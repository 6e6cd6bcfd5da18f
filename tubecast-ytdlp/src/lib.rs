//! `RemoteVideoService` backed by the `yt-dlp` binary.
//!
//! Every operation shells out to yt-dlp with `-J` (single JSON document on
//! stdout) and parses the fields we need. Audio extraction downloads into a
//! temporary directory and hands back a stream over the finished file.

use std::process::Stdio;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio::process::Command;

use tubecast::{
    async_trait,
    bytestream::{self, ByteStream},
    Error, ErrorKind, RemoteChannel, RemoteVideoService, Result, VideoId, VideoListEntry,
    VideoMetadata,
};

const DEFAULT_BINARY: &str = "yt-dlp";
const AUDIO_FORMAT: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";

pub struct YtDlpService {
    binary: String,
}

impl Default for YtDlpService {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl std::fmt::Debug for YtDlpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YtDlpService")
            .field("binary", &self.binary)
            .finish()
    }
}

impl YtDlpService {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run_json<T: serde::de::DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::with_source(ErrorKind::Internal, "failed to run yt-dlp", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().last().unwrap_or("").trim();
            return Err(Error::internal(format!("yt-dlp failed: {}", line)));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::with_source(ErrorKind::Internal, "failed to parse yt-dlp output", e))
    }
}

/// Normalize whatever the user typed into a URL yt-dlp understands: a raw
/// `UC…` channel id, an `@handle`, a bare handle, or a full URL.
fn channel_input_url(input: &str) -> String {
    let input = input.trim();
    if is_channel_id(input) {
        tubecast::channel_url(input)
    } else if input.starts_with('@') {
        format!("https://www.youtube.com/{}", input)
    } else if !input.starts_with("http") {
        format!("https://www.youtube.com/@{}", input)
    } else {
        input.to_string()
    }
}

fn is_channel_id(input: &str) -> bool {
    input.len() == 24
        && input.starts_with("UC")
        && input[2..]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y%m%d").ok()?;
    let datetime = date.and_hms_opt(0, 0, 0)?;
    Some(DateTime::from_naive_utc_and_offset(datetime, Utc))
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    channel_id: Option<String>,
    id: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistInfo {
    #[serde(default)]
    entries: Vec<Option<PlaylistEntry>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
}

#[async_trait]
impl RemoteVideoService for YtDlpService {
    async fn resolve_channel(&self, input: &str) -> Result<RemoteChannel> {
        let url = channel_input_url(input);
        tracing::debug!("resolving channel from {}", url);
        let info: ChannelInfo = self
            .run_json(&[
                "-J",
                "--flat-playlist",
                "--playlist-items",
                "0",
                "--no-warnings",
                &url,
            ])
            .await?;

        let youtube_id = info
            .channel_id
            .or(info.id)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, "could not resolve channel id"))?;
        let name = info
            .channel
            .or(info.uploader)
            .or(info.title)
            .unwrap_or_else(|| "Unknown Channel".to_string());

        Ok(RemoteChannel { youtube_id, name })
    }

    async fn list_videos(&self, youtube_id: &str, max_count: u32) -> Result<Vec<VideoListEntry>> {
        let url = tubecast::channel_videos_url(youtube_id);
        let playlist_end = max_count.to_string();
        let info: PlaylistInfo = self
            .run_json(&[
                "-J",
                "--flat-playlist",
                "--playlist-end",
                &playlist_end,
                "--no-warnings",
                &url,
            ])
            .await?;

        let mut videos = Vec::new();
        for entry in info.entries.into_iter().flatten() {
            let Some(id) = entry.id else { continue };
            let video_id = VideoId::from(id);
            videos.push(VideoListEntry {
                url: entry
                    .url
                    .unwrap_or_else(|| tubecast::video_watch_url(&video_id)),
                title: entry.title.unwrap_or_default(),
                video_id,
            });
            if videos.len() as u32 == max_count {
                break;
            }
        }
        Ok(videos)
    }

    async fn fetch_metadata(&self, video_id: &VideoId) -> Result<VideoMetadata> {
        let url = tubecast::video_watch_url(video_id);
        let info: VideoInfo = self.run_json(&["-J", "--no-warnings", &url]).await?;

        Ok(VideoMetadata {
            title: info.title.unwrap_or_else(|| "Untitled".to_string()),
            description: info.description.unwrap_or_default(),
            duration_secs: info.duration.unwrap_or(0.0) as u32,
            published_at: info.upload_date.as_deref().and_then(parse_upload_date),
            thumbnail_url: info.thumbnail,
        })
    }

    async fn download_audio(&self, video_id: &VideoId) -> Result<ByteStream> {
        let url = tubecast::video_watch_url(video_id);
        let temp_dir = tempfile::tempdir()?;
        let output_template = temp_dir.path().join("%(id)s.%(ext)s");
        let final_path = temp_dir
            .path()
            .join(format!("{}.{}", video_id, AUDIO_FORMAT));

        let output = Command::new(&self.binary)
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(AUDIO_FORMAT)
            .arg("--audio-quality")
            .arg(AUDIO_QUALITY)
            .arg("--no-warnings")
            .arg("-o")
            .arg(&output_template)
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::with_source(ErrorKind::Internal, "failed to run yt-dlp", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().last().unwrap_or("").trim();
            return Err(Error::internal(format!(
                "audio extraction failed for {}: {}",
                video_id, line
            )));
        }

        // the file handle stays valid after the temporary directory is
        // cleaned up, so the stream can outlive `temp_dir`
        let stream = bytestream::from_file(&final_path).await.map_err(|_| {
            Error::internal(format!("extracted audio file not found for {}", video_id))
        })?;
        Ok(stream)
    }
}
