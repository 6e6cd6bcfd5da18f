use tubecast::{AuthPolicy, AuthUpdate, ErrorKind};

async fn downloaded_channel() -> (
    tubecast::Context,
    std::sync::Arc<tubecast::test::StaticRemoteVideoService>,
    tubecast::Channel,
) {
    let (ctx, service) = tubecast::test::create_context_memory().await;
    service.add_channel("UCchannel1", "Channel One");
    service.add_video("UCchannel1", "video1", "First Video");
    service.add_video("UCchannel1", "video2", "Second Video");
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    tubecast::refresh_channel(&ctx, channel.id).await.unwrap();
    (ctx, service, channel)
}

#[tokio::test]
async fn feed_contains_ready_episodes() {
    let (ctx, _service, channel) = downloaded_channel().await;

    let xml = tubecast::feed_rss(&ctx, channel.id).await.unwrap();
    let feed = rss::Channel::read_from(xml.as_bytes()).unwrap();

    assert_eq!(feed.title(), "Channel One");
    assert_eq!(feed.items().len(), 2);
    let enclosures: Vec<&str> = feed
        .items()
        .iter()
        .map(|item| item.enclosure().unwrap().url())
        .collect();
    assert_eq!(
        enclosures,
        vec![
            "http://localhost:3000/audio/video2.mp3",
            "http://localhost:3000/audio/video1.mp3",
        ]
    );
    for item in feed.items() {
        assert_eq!(item.enclosure().unwrap().mime_type(), "audio/mpeg");
        assert!(item.guid().is_some());
        assert!(item.pub_date().is_some());
    }
}

#[tokio::test]
async fn feed_excludes_pending_episodes() {
    let (ctx, service) = tubecast::test::create_context_memory().await;
    service.add_channel("UCchannel1", "Channel One");
    service.add_video("UCchannel1", "video1", "First Video");
    service.add_video("UCchannel1", "video2", "Second Video");
    service.fail_audio("video2");

    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    tubecast::refresh_channel(&ctx, channel.id).await.unwrap();

    let xml = tubecast::feed_rss(&ctx, channel.id).await.unwrap();
    let feed = rss::Channel::read_from(xml.as_bytes()).unwrap();
    assert_eq!(feed.items().len(), 1);
    assert_eq!(
        feed.items()[0].enclosure().unwrap().url(),
        "http://localhost:3000/audio/video1.mp3"
    );
}

#[tokio::test]
async fn token_channel_uses_token_urls() {
    let (ctx, _service, channel) = downloaded_channel().await;
    let channel = tubecast::channel_update_auth(&ctx, channel.id, AuthUpdate::Token)
        .await
        .unwrap();
    let token = match &channel.auth {
        AuthPolicy::Token { token } => token.clone(),
        other => panic!("expected token auth, got {:?}", other),
    };

    let xml = tubecast::feed_rss_by_token(&ctx, &token).await.unwrap();
    let feed = rss::Channel::read_from(xml.as_bytes()).unwrap();
    assert_eq!(feed.items().len(), 2);
    for item in feed.items() {
        let url = item.enclosure().unwrap().url();
        assert!(
            url.starts_with(&format!("http://localhost:3000/audio/t/{}/", token)),
            "unexpected enclosure url: {}",
            url
        );
    }
}

#[tokio::test]
async fn feed_for_unknown_channel_is_not_found() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let err = tubecast::feed_rss(&ctx, "9".parse().unwrap()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn feed_item_metadata_matches_episode() {
    let (ctx, _service, channel) = downloaded_channel().await;

    let xml = tubecast::feed_rss(&ctx, channel.id).await.unwrap();
    let feed = rss::Channel::read_from(xml.as_bytes()).unwrap();

    let item = &feed.items()[0];
    assert_eq!(item.title(), Some("Second Video"));
    assert_eq!(
        item.link(),
        Some("https://www.youtube.com/watch?v=video2")
    );
    assert_eq!(item.guid().unwrap().value(), "video2");
    assert_eq!(item.description(), Some("Description of Second Video"));
}
