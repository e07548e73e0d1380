//! Local decoding of session tokens.
//!
//! Tokens are JWT-shaped: `header.payload.signature`, with a base64url JSON
//! payload. Only the payload is read; the signature is checked by the services
//! that issued the token, never here.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::model::UserSession;

/// Why a token could not be turned into a `UserSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedTokenError {
    #[error("token is empty")]
    Empty,
    #[error("token has {0} segments, expected 3")]
    Segments(usize),
    #[error("token payload is not valid base64url: {0}")]
    Encoding(String),
    #[error("token payload is not a JSON claims object: {0}")]
    Claims(String),
    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),
    #[error("token expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Opaque signed credential, as issued by the auth exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decodes the claims carried by this token. See [`decode`].
    ///
    /// # Errors
    ///
    /// Returns `MalformedTokenError` for any token that is not a live session.
    pub fn decode(&self, now: DateTime<Utc>) -> Result<UserSession, MalformedTokenError> {
        decode(&self.0, now)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    name: Option<String>,
    email: Option<String>,
    exp: Option<i64>,
}

/// Parses `token` into the session it proves, without any network access.
///
/// A token with an `exp` claim at or before `now` is rejected.
///
/// # Errors
///
/// Returns `MalformedTokenError` if the token is not three segments, the
/// payload does not decode to JSON claims, `name` or `email` is missing or
/// blank, or the token has expired.
pub fn decode(token: &str, now: DateTime<Utc>) -> Result<UserSession, MalformedTokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(MalformedTokenError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(MalformedTokenError::Segments(segments.len()));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|err| MalformedTokenError::Encoding(err.to_string()))?;
    let claims: Claims = serde_json::from_slice(&payload)
        .map_err(|err| MalformedTokenError::Claims(err.to_string()))?;

    let name = required(claims.name, "name")?;
    let email = required(claims.email, "email")?;

    if let Some(exp) = claims.exp {
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| MalformedTokenError::Claims(format!("exp out of range: {exp}")))?;
        if expires_at <= now {
            return Err(MalformedTokenError::Expired(expires_at));
        }
    }

    Ok(UserSession::new(name, email))
}

fn required(value: Option<String>, claim: &'static str) -> Result<String, MalformedTokenError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MalformedTokenError::MissingClaim(claim)),
    }
}

/// Builds an unsigned token carrying the given claims.
///
/// Intended for tests and local stubs; real tokens come from the auth exchange.
#[must_use]
pub fn unsigned_token(name: &str, email: &str, exp: Option<DateTime<Utc>>) -> SessionToken {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let mut claims = serde_json::json!({ "name": name, "email": email });
    if let Some(exp) = exp {
        claims["exp"] = serde_json::json!(exp.timestamp());
    }
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    SessionToken::new(format!("{header}.{payload}.signature"))
}
