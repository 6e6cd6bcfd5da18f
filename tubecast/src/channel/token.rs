use std::{str::FromStr, sync::Arc};

use rand::Rng;

const FEED_TOKEN_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const FEED_TOKEN_LENGTH: usize = 48;

#[derive(Debug)]
pub struct InvalidFeedTokenError;

impl std::fmt::Display for InvalidFeedTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid feed token")
    }
}

impl std::error::Error for InvalidFeedTokenError {}

/// A feed token is a random URL-safe string granting access to one channel's
/// feed and audio. A fresh one is generated on every switch into token mode,
/// invalidating previously handed out links.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedToken(Arc<str>);

impl std::fmt::Display for FeedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeedToken {
    type Err = InvalidFeedTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::check_token(s)?;
        Ok(Self(Arc::from(s)))
    }
}

impl TryFrom<String> for FeedToken {
    type Error = InvalidFeedTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::check_token(&value)?;
        Ok(Self(Arc::from(value)))
    }
}

impl TryFrom<&str> for FeedToken {
    type Error = InvalidFeedTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::check_token(value)?;
        Ok(Self(Arc::from(value)))
    }
}

impl FeedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        (0..FEED_TOKEN_LENGTH)
            .map(|_| rng.gen_range(0..FEED_TOKEN_ALPHABET.len()))
            .map(|i| FEED_TOKEN_ALPHABET.as_bytes()[i] as char)
            .collect::<String>()
            .try_into()
            .expect("generated token is always valid")
    }

    fn check_token(token: &str) -> Result<(), InvalidFeedTokenError> {
        if token.len() != FEED_TOKEN_LENGTH {
            return Err(InvalidFeedTokenError);
        }

        if !token.chars().all(|c| FEED_TOKEN_ALPHABET.contains(c)) {
            return Err(InvalidFeedTokenError);
        }

        Ok(())
    }
}
