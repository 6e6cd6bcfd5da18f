use axum::http::{header, HeaderMap};
use base64::Engine;

use tubecast::{vault, AuthPolicy, Channel};

use crate::error::ApiError;

const CHANNEL_REALM: &str = "tubecast";
const ADMIN_REALM: &str = "tubecast-admin";

/// Shared credential gating the administrative endpoints. Distinct from any
/// per-channel policy.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

pub fn parse_basic(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Gate for administrative endpoints.
pub fn require_admin(admin: &AdminCredentials, headers: &HeaderMap) -> Result<(), ApiError> {
    match parse_basic(headers) {
        Some(credentials)
            if credentials.username == admin.username
                && credentials.password == admin.password =>
        {
            Ok(())
        }
        _ => Err(ApiError::unauthorized_basic(
            ADMIN_REALM,
            "administrative credentials required",
        )),
    }
}

/// Evaluate a channel's auth policy for a local-id request.
///
/// Token channels have no authorized access through local-id paths at all;
/// the caller is pointed at the token path instead.
pub fn authorize_channel(channel: &Channel, headers: &HeaderMap) -> Result<(), ApiError> {
    match &channel.auth {
        AuthPolicy::None => Ok(()),
        AuthPolicy::Basic {
            username,
            password_hash,
        } => match parse_basic(headers) {
            Some(credentials)
                if credentials.username == *username
                    && vault::verify_password(&credentials.password, password_hash).is_ok() =>
            {
                Ok(())
            }
            _ => Err(ApiError::unauthorized_basic(
                CHANNEL_REALM,
                "channel credentials required",
            )),
        },
        AuthPolicy::Token { .. } => Err(ApiError::not_found(
            "this channel is only reachable through its token path",
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn headers_with_basic(username: &str, password: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {}", encoded).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn parse_basic_roundtrip() {
        let headers = headers_with_basic("alice", "se:cret");
        let credentials = parse_basic(&headers).unwrap();
        assert_eq!(credentials.username, "alice");
        // everything after the first colon is the password
        assert_eq!(credentials.password, "se:cret");
    }

    #[test]
    fn parse_basic_missing_header() {
        assert!(parse_basic(&HeaderMap::new()).is_none());
    }

    #[test]
    fn parse_basic_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer token".parse().unwrap());
        assert!(parse_basic(&headers).is_none());
    }

    #[test]
    fn admin_gate() {
        let admin = AdminCredentials {
            username: "admin".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(require_admin(&admin, &headers_with_basic("admin", "hunter22")).is_ok());
        assert!(require_admin(&admin, &headers_with_basic("admin", "wrong")).is_err());
        assert!(require_admin(&admin, &HeaderMap::new()).is_err());
    }
}
