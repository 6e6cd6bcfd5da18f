mod error;
pub use error::*;

mod id;
pub use id::*;

mod context;
pub use context::*;

pub mod bytestream;
pub mod vault;

#[doc(hidden)]
#[cfg(feature = "test-utilities")]
pub mod test;

pub(crate) mod blob;
pub(crate) mod channel;
pub(crate) mod db;
pub(crate) mod episode;
pub(crate) mod external;
pub(crate) mod feed;
pub(crate) mod ks;
pub(crate) mod migrations;
pub(crate) mod refresh;

pub use channel::{
    AuthPolicy, AuthUpdate, Channel, ChannelCreate, FeedToken, InvalidFeedTokenError,
};
pub use episode::{
    audio_filename, audio_key, video_id_from_audio_filename, Episode, EpisodeAudio, EpisodeCreate,
};
pub use external::{
    channel_url, channel_videos_url, video_watch_url, RemoteChannel, RemoteVideoService, VideoId,
    VideoListEntry, VideoMetadata,
};

pub use async_trait::async_trait;
pub use bytes;
pub use chrono;
