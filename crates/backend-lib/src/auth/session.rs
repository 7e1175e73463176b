// ============================
// authgate-backend/src/auth/session.rs
// ============================
//! Stateless session issuance, validation and refresh.
//!
//! A session is nothing but a signed token: validity is a pure function of
//! the token, the server secret and the current time. Nothing is stored
//! server-side, so a refreshed token does not revoke its predecessor; the old
//! one simply runs out.
use std::{sync::Arc, time::Duration};

use chrono::Utc;
use thiserror::Error;

use authgate_common::UserId;

use super::token::{self, Claims, DecodeError};
use super::ServerSecret;

/// Issuer written into every token
pub const ISSUER: &str = "authgate";

/// Session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24); // 24 hours

/// Why a token is not usable right now
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("session has expired")]
    Expired,

    #[error("session is not valid yet")]
    NotYetValid,

    #[error("session token is malformed")]
    Malformed,

    #[error("session token signature does not verify")]
    BadSignature,
}

impl From<DecodeError> for ValidationError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Malformed(_) => ValidationError::Malformed,
            DecodeError::BadSignature => ValidationError::BadSignature,
        }
    }
}

fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

/// Mint a token for `username` valid from `now` for `ttl`
pub fn issue_session(
    user_id: UserId,
    username: &str,
    secret: &ServerSecret,
    ttl: Duration,
    now: i64,
) -> String {
    let claims = Claims {
        user_id,
        username: username.to_string(),
        iss: ISSUER.to_string(),
        sub: username.to_string(),
        exp: now.saturating_add(ttl_secs(ttl)),
        nbf: now,
        iat: now,
    };
    token::encode(&claims, secret)
}

/// Check signature, structure and the `[nbf, exp)` window at `now`
pub fn validate_session(
    token: &str,
    secret: &ServerSecret,
    now: i64,
) -> Result<Claims, ValidationError> {
    let claims = token::decode(token, secret)?;
    if now >= claims.exp {
        return Err(ValidationError::Expired);
    }
    if now < claims.nbf {
        return Err(ValidationError::NotYetValid);
    }
    Ok(claims)
}

/// Re-issue a currently valid token with a fresh window.
///
/// An expired token fails here exactly as it fails validation.
pub fn refresh_session(
    token: &str,
    secret: &ServerSecret,
    now: i64,
    ttl: Duration,
) -> Result<String, ValidationError> {
    let claims = validate_session(token, secret, now)?;
    Ok(issue_session(
        claims.user_id,
        &claims.username,
        secret,
        ttl,
        now,
    ))
}

/// Session operations bound to the process secret, TTL and wall clock
#[derive(Clone, Debug)]
pub struct SessionValidator {
    secret: Arc<ServerSecret>,
    ttl: Duration,
}

impl SessionValidator {
    pub fn new(secret: ServerSecret, ttl: Duration) -> Self {
        Self {
            secret: Arc::new(secret),
            ttl,
        }
    }

    pub fn secret(&self) -> &ServerSecret {
        &self.secret
    }

    /// Current time in seconds since the epoch
    pub fn now() -> i64 {
        Utc::now().timestamp()
    }

    /// Create a new session token
    pub fn issue(&self, user_id: UserId, username: &str) -> String {
        issue_session(user_id, username, &self.secret, self.ttl, Self::now())
    }

    /// Validate a session token
    pub fn validate(&self, token: &str) -> Result<Claims, ValidationError> {
        validate_session(token, &self.secret, Self::now())
    }

    pub fn refresh(&self, token: &str) -> Result<String, ValidationError> {
        refresh_session(token, &self.secret, Self::now(), self.ttl)
    }
}
