use chrono::{DateTime, Utc};

use crate::{
    db::{self, DbC},
    vault, ChannelId, Error, ErrorKind, Result,
};

mod token;
pub use token::*;

const AUTH_MODE_NONE: &str = "none";
const AUTH_MODE_BASIC: &str = "basic";
const AUTH_MODE_TOKEN: &str = "token";

/// A tracked YouTube channel mapped to a generated podcast feed.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub youtube_id: String,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub auth: AuthPolicy,
}

/// Per-channel access rule. Exactly one variant is active at a time;
/// switching variants clears the credentials of the previous one.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthPolicy {
    #[default]
    None,
    Basic {
        username: String,
        password_hash: String,
    },
    Token {
        token: FeedToken,
    },
}

impl std::fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password_hash", &"****")
                .finish(),
            Self::Token { .. } => f.debug_struct("Token").field("token", &"****").finish(),
        }
    }
}

impl AuthPolicy {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::None => AUTH_MODE_NONE,
            Self::Basic { .. } => AUTH_MODE_BASIC,
            Self::Token { .. } => AUTH_MODE_TOKEN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelCreate {
    pub youtube_id: String,
    pub name: String,
    pub url: String,
}

/// Requested auth-policy change. `Basic` carries the plaintext password;
/// it is hashed before anything reaches the database.
#[derive(Clone)]
pub enum AuthUpdate {
    None,
    Basic { username: String, password: String },
    Token,
}

impl std::fmt::Debug for AuthUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"****")
                .finish(),
            Self::Token => f.write_str("Token"),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChannelView {
    id: i64,
    youtube_id: String,
    name: String,
    url: String,
    created_at: String,
    auth_mode: String,
    auth_username: Option<String>,
    auth_password_hash: Option<String>,
    auth_token: Option<String>,
}

impl ChannelView {
    fn into_channel(self) -> Result<Channel> {
        let auth = match self.auth_mode.as_str() {
            AUTH_MODE_NONE => AuthPolicy::None,
            AUTH_MODE_BASIC => AuthPolicy::Basic {
                username: self
                    .auth_username
                    .ok_or_else(|| Error::internal("basic auth channel without username"))?,
                password_hash: self
                    .auth_password_hash
                    .ok_or_else(|| Error::internal("basic auth channel without password hash"))?,
            },
            AUTH_MODE_TOKEN => AuthPolicy::Token {
                token: self
                    .auth_token
                    .ok_or_else(|| Error::internal("token auth channel without token"))?
                    .try_into()
                    .map_err(|e| Error::with_source(ErrorKind::Internal, "invalid stored token", e))?,
            },
            other => {
                return Err(Error::internal(format!("unknown auth mode: {}", other)));
            }
        };
        Ok(Channel {
            id: ChannelId::from_db(self.id),
            youtube_id: self.youtube_id,
            name: self.name,
            url: self.url,
            created_at: db::decode_datetime(&self.created_at)
                .ok_or_else(|| Error::internal("invalid channel timestamp"))?,
            auth,
        })
    }
}

#[tracing::instrument(skip(db))]
pub async fn create(db: &mut DbC, create: ChannelCreate) -> Result<Channel> {
    if lookup(db, &create.youtube_id).await?.is_some() {
        return Err(Error::new(
            ErrorKind::Conflict,
            format!("channel {} is already registered", create.youtube_id),
        ));
    }

    let created_at = db::encode_datetime(Utc::now());
    let channel_id: i64 = sqlx::query_scalar(
        "INSERT INTO channel (youtube_id, name, url, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&create.youtube_id)
    .bind(&create.name)
    .bind(&create.url)
    .bind(&created_at)
    .fetch_one(&mut *db)
    .await?;
    get(db, ChannelId::from_db(channel_id)).await
}

#[tracing::instrument(skip(db))]
pub async fn get(db: &mut DbC, channel_id: ChannelId) -> Result<Channel> {
    let view = sqlx::query_as::<_, ChannelView>("SELECT * FROM channel WHERE id = ?")
        .bind(channel_id)
        .fetch_optional(&mut *db)
        .await?;
    match view {
        Some(view) => view.into_channel(),
        None => Err(Error::new(ErrorKind::NotFound, "channel not found")),
    }
}

#[tracing::instrument(skip(db))]
pub async fn lookup(db: &mut DbC, youtube_id: &str) -> Result<Option<ChannelId>> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM channel WHERE youtube_id = ?")
        .bind(youtube_id)
        .fetch_optional(&mut *db)
        .await?;
    Ok(id.map(ChannelId::from_db))
}

#[tracing::instrument(skip(db))]
pub async fn get_by_youtube_id(db: &mut DbC, youtube_id: &str) -> Result<Channel> {
    let view = sqlx::query_as::<_, ChannelView>("SELECT * FROM channel WHERE youtube_id = ?")
        .bind(youtube_id)
        .fetch_optional(&mut *db)
        .await?;
    match view {
        Some(view) => view.into_channel(),
        None => Err(Error::new(ErrorKind::NotFound, "channel not found")),
    }
}

#[tracing::instrument(skip(db, token))]
pub async fn get_by_token(db: &mut DbC, token: &FeedToken) -> Result<Channel> {
    let view =
        sqlx::query_as::<_, ChannelView>("SELECT * FROM channel WHERE auth_mode = ? AND auth_token = ?")
            .bind(AUTH_MODE_TOKEN)
            .bind(token.as_str())
            .fetch_optional(&mut *db)
            .await?;
    match view {
        Some(view) => view.into_channel(),
        None => Err(Error::new(ErrorKind::NotFound, "channel not found")),
    }
}

#[tracing::instrument(skip(db))]
pub async fn list(db: &mut DbC) -> Result<Vec<Channel>> {
    let views =
        sqlx::query_as::<_, ChannelView>("SELECT * FROM channel ORDER BY created_at DESC, id DESC")
            .fetch_all(&mut *db)
            .await?;
    views.into_iter().map(ChannelView::into_channel).collect()
}

#[tracing::instrument(skip(db))]
pub async fn delete(db: &mut DbC, channel_id: ChannelId) -> Result<()> {
    let result = sqlx::query("DELETE FROM channel WHERE id = ?")
        .bind(channel_id)
        .execute(&mut *db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::new(ErrorKind::NotFound, "channel not found"));
    }
    Ok(())
}

/// Switch a channel's auth policy. All credential columns are written in a
/// single statement so no stale credentials can survive a mode change.
#[tracing::instrument(skip(db))]
pub async fn update_auth(db: &mut DbC, channel_id: ChannelId, update: AuthUpdate) -> Result<Channel> {
    let policy = match update {
        AuthUpdate::None => AuthPolicy::None,
        AuthUpdate::Basic { username, password } => {
            if username.is_empty() || password.is_empty() {
                return Err(Error::new(
                    ErrorKind::Invalid,
                    "basic auth requires both a username and a password",
                ));
            }
            AuthPolicy::Basic {
                username,
                password_hash: vault::hash_password(&password)?,
            }
        }
        AuthUpdate::Token => AuthPolicy::Token {
            token: FeedToken::random(),
        },
    };

    let (username, password_hash, token) = match &policy {
        AuthPolicy::None => (None, None, None),
        AuthPolicy::Basic {
            username,
            password_hash,
        } => (Some(username.as_str()), Some(password_hash.as_str()), None),
        AuthPolicy::Token { token } => (None, None, Some(token.as_str())),
    };

    let result = sqlx::query(
        "UPDATE channel SET auth_mode = ?, auth_username = ?, auth_password_hash = ?, auth_token = ? WHERE id = ?",
    )
    .bind(policy.mode())
    .bind(username)
    .bind(password_hash)
    .bind(token)
    .bind(channel_id)
    .execute(&mut *db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(Error::new(ErrorKind::NotFound, "channel not found"));
    }

    get(db, channel_id).await
}
