use std::str::FromStr;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use tubecast::{AuthPolicy, AuthUpdate, Channel, ChannelId, Context, Episode, FeedToken};

use crate::{
    auth::{self, AdminCredentials},
    error::ApiError,
};

#[derive(Clone)]
pub struct AppState {
    pub context: Context,
    pub admin: AdminCredentials,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/channels", get(list_channels).post(add_channel))
        .route("/channels/:id", delete(delete_channel))
        .route("/channels/:id/auth", put(update_channel_auth))
        .route("/refresh", post(refresh_all))
        .route("/refresh/:id", post(refresh_channel))
        .route("/feed/:id", get(get_feed))
        .route("/feed/t/:token", get(get_feed_by_token))
        .route("/audio/:filename", get(get_audio))
        .route("/audio/t/:token/:filename", get(get_audio_by_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ChannelSummary {
    id: i64,
    youtube_id: String,
    name: String,
    url: String,
    created_at: String,
    auth_mode: &'static str,
}

impl From<Channel> for ChannelSummary {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id.into(),
            auth_mode: channel.auth.mode(),
            youtube_id: channel.youtube_id,
            name: channel.name,
            url: channel.url,
            created_at: channel.created_at.to_rfc3339(),
        }
    }
}

fn parse_channel_id(raw: &str) -> Result<ChannelId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found("channel not found"))
}

fn parse_token(raw: &str) -> Result<FeedToken, ApiError> {
    FeedToken::from_str(raw).map_err(|_| ApiError::not_found("channel not found"))
}

async fn list_channels(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ChannelSummary>>, ApiError> {
    auth::require_admin(&state.admin, &headers)?;
    let channels = tubecast::channel_list(&state.context).await?;
    Ok(Json(
        channels.into_iter().map(ChannelSummary::from).collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct AddChannelRequest {
    url: String,
}

async fn add_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddChannelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth::require_admin(&state.admin, &headers)?;
    let input = request.url.trim();
    if input.is_empty() {
        return Err(ApiError::bad_request("url is required"));
    }
    let channel = tubecast::channel_add(&state.context, input).await?;
    Ok((StatusCode::CREATED, Json(ChannelSummary::from(channel))))
}

async fn delete_channel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&state.admin, &headers)?;
    let channel_id = parse_channel_id(&id)?;
    tubecast::channel_delete(&state.context, channel_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct AuthUpdateRequest {
    auth_type: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthUpdateResponse {
    auth_mode: &'static str,
    /// Present only after a switch into token mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

async fn update_channel_auth(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AuthUpdateRequest>,
) -> Result<Json<AuthUpdateResponse>, ApiError> {
    auth::require_admin(&state.admin, &headers)?;
    let channel_id = parse_channel_id(&id)?;
    let update = match request.auth_type.as_str() {
        "none" => AuthUpdate::None,
        "basic" => AuthUpdate::Basic {
            username: request.username.unwrap_or_default(),
            password: request.password.unwrap_or_default(),
        },
        "token" => AuthUpdate::Token,
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown auth type: {}",
                other
            )))
        }
    };
    let channel = tubecast::channel_update_auth(&state.context, channel_id, update).await?;
    let token = match &channel.auth {
        AuthPolicy::Token { token } => Some(token.to_string()),
        _ => None,
    };
    Ok(Json(AuthUpdateResponse {
        auth_mode: channel.auth.mode(),
        token,
    }))
}

async fn refresh_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&state.admin, &headers)?;
    tubecast::refresh_all(&state.context).await?;
    Ok(Json(json!({ "success": true })))
}

async fn refresh_channel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth::require_admin(&state.admin, &headers)?;
    let channel_id = parse_channel_id(&id)?;
    tubecast::refresh_channel(&state.context, channel_id).await?;
    Ok(Json(json!({ "success": true })))
}

fn rss_response(xml: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        xml,
    )
        .into_response()
}

async fn get_feed(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let channel_id = parse_channel_id(&id)?;
    let channel = tubecast::channel_get(&state.context, channel_id).await?;
    auth::authorize_channel(&channel, &headers)?;
    let xml = tubecast::feed_rss(&state.context, channel_id).await?;
    Ok(rss_response(xml))
}

async fn get_feed_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let token = parse_token(&token)?;
    let xml = tubecast::feed_rss_by_token(&state.context, &token).await?;
    Ok(rss_response(xml))
}

async fn resolve_episode(state: &AppState, filename: &str) -> Result<Episode, ApiError> {
    let video_id = tubecast::video_id_from_audio_filename(filename)
        .ok_or_else(|| ApiError::not_found("audio not found"))?;
    Ok(tubecast::episode_get_by_video_id(&state.context, &video_id).await?)
}

async fn audio_response(state: &AppState, episode: &Episode) -> Result<Response, ApiError> {
    let download = tubecast::audio_download(&state.context, episode.id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, download.mime_type),
            (header::CONTENT_LENGTH, download.size.to_string()),
        ],
        Body::from_stream(download.stream),
    )
        .into_response())
}

async fn get_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let episode = resolve_episode(&state, &filename).await?;
    let channel = tubecast::channel_get(&state.context, episode.channel).await?;
    auth::authorize_channel(&channel, &headers)?;
    audio_response(&state, &episode).await
}

async fn get_audio_by_token(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let token = parse_token(&token)?;
    let channel = tubecast::channel_get_by_token(&state.context, &token).await?;
    let episode = resolve_episode(&state, &filename).await?;
    // the artifact must belong to the channel the token authorizes
    if episode.channel != channel.id {
        return Err(ApiError::not_found("audio not found"));
    }
    audio_response(&state, &episode).await
}
