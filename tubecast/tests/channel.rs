use tubecast::{AuthPolicy, AuthUpdate, ErrorKind, FeedToken};

#[tokio::test]
async fn list_channels_empty() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channels = tubecast::channel_list(&ctx).await.unwrap();
    assert_eq!(channels.len(), 0);
}

#[tokio::test]
async fn create_channel_one() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    assert_eq!(channel.youtube_id, "UCchannel1");
    assert_eq!(channel.name, "Channel One");
    assert_eq!(channel.auth, AuthPolicy::None);
}

#[tokio::test]
async fn create_duplicate_is_conflict() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    let err = tubecast::channel_create(
        &ctx,
        tubecast::ChannelCreate {
            youtube_id: "UCchannel1".to_string(),
            name: "Channel One Again".to_string(),
            url: tubecast::channel_url("UCchannel1"),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn list_channels_most_recent_first() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let first = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    let second = tubecast::test::create_channel(&ctx, "UCchannel2", "Channel Two").await;
    let channels = tubecast::channel_list(&ctx).await.unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].id, second.id);
    assert_eq!(channels[1].id, first.id);
}

#[tokio::test]
async fn get_unknown_channel_is_not_found() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let err = tubecast::channel_get(&ctx, "123".parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_channel() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    tubecast::channel_delete(&ctx, channel.id).await.unwrap();
    let err = tubecast::channel_get(&ctx, channel.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_unknown_channel_is_not_found() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let err = tubecast::channel_delete(&ctx, "7".parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn basic_auth_stores_hash_not_password() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;
    let channel = tubecast::channel_update_auth(
        &ctx,
        channel.id,
        AuthUpdate::Basic {
            username: "alice".to_string(),
            password: "secret".to_string(),
        },
    )
    .await
    .unwrap();
    match &channel.auth {
        AuthPolicy::Basic {
            username,
            password_hash,
        } => {
            assert_eq!(username, "alice");
            assert_ne!(password_hash, "secret");
            tubecast::vault::verify_password("secret", password_hash).unwrap();
            assert!(tubecast::vault::verify_password("wrong", password_hash).is_err());
        }
        other => panic!("expected basic auth, got {:?}", other),
    }
}

#[tokio::test]
async fn auth_modes_are_exclusive() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;

    tubecast::channel_update_auth(
        &ctx,
        channel.id,
        AuthUpdate::Basic {
            username: "alice".to_string(),
            password: "secret".to_string(),
        },
    )
    .await
    .unwrap();

    let channel = tubecast::channel_update_auth(&ctx, channel.id, AuthUpdate::Token)
        .await
        .unwrap();
    assert!(matches!(channel.auth, AuthPolicy::Token { .. }));

    let channel = tubecast::channel_update_auth(
        &ctx,
        channel.id,
        AuthUpdate::Basic {
            username: "bob".to_string(),
            password: "hunter22".to_string(),
        },
    )
    .await
    .unwrap();
    match &channel.auth {
        AuthPolicy::Basic { username, .. } => assert_eq!(username, "bob"),
        other => panic!("expected basic auth, got {:?}", other),
    }

    let channel = tubecast::channel_update_auth(&ctx, channel.id, AuthUpdate::None)
        .await
        .unwrap();
    assert_eq!(channel.auth, AuthPolicy::None);
}

#[tokio::test]
async fn token_rotation_invalidates_old_token() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;

    let first = tubecast::channel_update_auth(&ctx, channel.id, AuthUpdate::Token)
        .await
        .unwrap();
    let first_token = match &first.auth {
        AuthPolicy::Token { token } => token.clone(),
        other => panic!("expected token auth, got {:?}", other),
    };

    let second = tubecast::channel_update_auth(&ctx, channel.id, AuthUpdate::Token)
        .await
        .unwrap();
    let second_token = match &second.auth {
        AuthPolicy::Token { token } => token.clone(),
        other => panic!("expected token auth, got {:?}", other),
    };

    assert_ne!(first_token, second_token);
    let err = tubecast::channel_get_by_token(&ctx, &first_token)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let resolved = tubecast::channel_get_by_token(&ctx, &second_token)
        .await
        .unwrap();
    assert_eq!(resolved.id, channel.id);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let err = tubecast::channel_get_by_token(&ctx, &FeedToken::random())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn basic_auth_requires_username_and_password() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let channel = tubecast::test::create_channel(&ctx, "UCchannel1", "Channel One").await;

    let err = tubecast::channel_update_auth(
        &ctx,
        channel.id,
        AuthUpdate::Basic {
            username: String::new(),
            password: "secret".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    let err = tubecast::channel_update_auth(
        &ctx,
        channel.id,
        AuthUpdate::Basic {
            username: "alice".to_string(),
            password: String::new(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    // policy is unchanged on validation failure
    let channel = tubecast::channel_get(&ctx, channel.id).await.unwrap();
    assert_eq!(channel.auth, AuthPolicy::None);
}

#[tokio::test]
async fn update_auth_on_unknown_channel_is_not_found() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let err = tubecast::channel_update_auth(&ctx, "99".parse().unwrap(), AuthUpdate::Token)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn add_channel_resolves_and_downloads() {
    let (ctx, service) = tubecast::test::create_context_memory().await;
    service.add_channel("UCchannel1", "Channel One");
    service.add_video("UCchannel1", "video1", "First Video");

    let channel = tubecast::channel_add(&ctx, "@UCchannel1").await.unwrap();
    assert_eq!(channel.youtube_id, "UCchannel1");
    assert_eq!(channel.url, "https://www.youtube.com/channel/UCchannel1");

    let episodes = tubecast::episode_list_ready(&ctx, channel.id).await.unwrap();
    assert_eq!(episodes.len(), 1);
}

#[tokio::test]
async fn add_unknown_channel_is_not_found() {
    let (ctx, _service) = tubecast::test::create_context_memory().await;
    let err = tubecast::channel_add(&ctx, "@nosuchchannel").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
