use rss::extension::itunes::{
    ITunesCategoryBuilder, ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder,
    ITunesOwnerBuilder,
};
use rss::{ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};

use crate::{
    channel::{AuthPolicy, Channel},
    episode::{self, Episode},
    external,
};

const GENERATOR: &str = "tubecast";
const AUDIO_MIME_TYPE: &str = "audio/mpeg";
const MAX_DESCRIPTION_CHARS: usize = 4000;

/// Render a channel's podcast feed as RSS 2.0 with iTunes extensions.
///
/// Only episodes with a downloaded artifact are expected here (the caller
/// iterates `list_ready`); anything still pending is skipped regardless.
/// Feed and enclosure URLs use the token path variant when the channel's
/// policy is `Token`, so the links a client follows carry its own grant.
pub fn render(base_url: &str, channel: &Channel, episodes: &[Episode]) -> String {
    let feed_url = match &channel.auth {
        AuthPolicy::Token { token } => format!("{}/feed/t/{}", base_url, token),
        _ => format!("{}/feed/{}", base_url, channel.id),
    };

    let itunes = ITunesChannelExtensionBuilder::default()
        .author(Some(channel.name.clone()))
        .categories(vec![ITunesCategoryBuilder::default()
            .text("Technology")
            .build()])
        .explicit(Some("no".to_string()))
        .owner(Some(
            ITunesOwnerBuilder::default()
                .name(Some(channel.name.clone()))
                .email(Some("noreply@example.com".to_string()))
                .build(),
        ))
        .summary(Some(format!(
            "Audio from YouTube channel: {}",
            channel.name
        )))
        .build();

    let items = episodes
        .iter()
        .filter(|episode| episode.is_ready())
        .map(|episode| render_item(base_url, channel, episode))
        .collect::<Vec<_>>();

    let feed = ChannelBuilder::default()
        .title(channel.name.clone())
        .link(channel.url.clone())
        .description(format!("Podcast feed for YouTube channel: {}", channel.name))
        .language(Some("en".to_string()))
        .generator(Some(GENERATOR.to_string()))
        .itunes_ext(itunes)
        .items(items)
        .build();

    // `Channel` serializes the <rss> element only; prepend the declaration.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", feed)
}

fn render_item(base_url: &str, channel: &Channel, episode: &Episode) -> Item {
    let filename = episode::audio_filename(&episode.video_id);
    let audio_url = match &channel.auth {
        AuthPolicy::Token { token } => format!("{}/audio/t/{}/{}", base_url, token, filename),
        _ => format!("{}/audio/{}", base_url, filename),
    };
    let size = episode.audio.as_ref().map(|audio| audio.size).unwrap_or(0);

    let description = if episode.description.is_empty() {
        episode.title.clone()
    } else {
        episode.description.chars().take(MAX_DESCRIPTION_CHARS).collect()
    };

    let enclosure = EnclosureBuilder::default()
        .url(audio_url)
        .length(size.to_string())
        .mime_type(AUDIO_MIME_TYPE.to_string())
        .build();

    let guid = GuidBuilder::default()
        .value(episode.video_id.as_str().to_string())
        .permalink(false)
        .build();

    let itunes = ITunesItemExtensionBuilder::default()
        .duration(Some(episode.duration_secs.to_string()))
        .image(episode.thumbnail_url.clone())
        .build();

    ItemBuilder::default()
        .title(Some(episode.title.clone()))
        .link(Some(external::video_watch_url(&episode.video_id)))
        .description(Some(description))
        .guid(Some(guid))
        .pub_date(episode.published_at.map(|dt| dt.to_rfc2822()))
        .enclosure(Some(enclosure))
        .itunes_ext(Some(itunes))
        .build()
}
