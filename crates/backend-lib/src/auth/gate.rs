//! Per-request access decision.
//!
//! The gate turns an optional `Authorization` header into either an
//! [`Identity`] or a [`GateRejection`], depending on whether the route
//! requires authentication. It is synchronous and consults nothing but the
//! header, the secret and the clock.
use thiserror::Error;

use authgate_common::UserId;

use super::session::{validate_session, ValidationError};
use super::ServerSecret;

const BEARER: &str = "Bearer";

/// Whether a route insists on an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    Required,
    Optional,
}

/// Who a validated token speaks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub user_id: UserId,
    pub username: String,
}

/// Outcome of the gate for a request that is let through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(Subject),
}

impl Identity {
    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(subject) => Some(subject),
        }
    }
}

/// Why a required route turned the request away
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed credential")]
    MalformedCredential,

    #[error("invalid credential")]
    InvalidCredential(ValidationError),
}

impl GateRejection {
    /// Short label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            GateRejection::MissingCredential => "missing",
            GateRejection::MalformedCredential => "malformed",
            GateRejection::InvalidCredential(_) => "invalid",
        }
    }
}

/// Extract the token from `Bearer <token>`.
///
/// The header must split on single spaces into exactly two parts, the first
/// being literally `Bearer`.
pub fn bearer_token(header: Option<&str>) -> Result<&str, GateRejection> {
    let header = header.ok_or(GateRejection::MissingCredential)?;
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) => Ok(token),
        _ => Err(GateRejection::MalformedCredential),
    }
}

/// Decide the identity for a request under `policy`.
///
/// On an optional route every failure degrades to [`Identity::Anonymous`].
pub fn authorize(
    header: Option<&str>,
    policy: RoutePolicy,
    secret: &ServerSecret,
    now: i64,
) -> Result<Identity, GateRejection> {
    let outcome = bearer_token(header).and_then(|token| {
        validate_session(token, secret, now).map_err(GateRejection::InvalidCredential)
    });

    match (outcome, policy) {
        (Ok(claims), _) => Ok(Identity::Authenticated(Subject {
            user_id: claims.user_id,
            username: claims.username,
        })),
        (Err(rejection), RoutePolicy::Required) => Err(rejection),
        (Err(_), RoutePolicy::Optional) => Ok(Identity::Anonymous),
    }
}
