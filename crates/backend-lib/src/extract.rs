//! Axum extractors that run the access gate.
//!
//! Handlers declare the policy they need by the extractor they take:
//! [`Authenticated`] for required authentication, [`MaybeAuthenticated`] for
//! optional authentication, [`BearerToken`] for the raw presented token.
//! [`JsonBody`] reads request bodies and reports failures in the API error
//! format.
use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use metrics::counter;
use tracing::debug;

use crate::auth::{
    authorize, bearer_token, GateRejection, Identity, RoutePolicy, SessionValidator, Subject,
};
use crate::error::AppError;
use crate::metrics::GATE_REJECTED;
use crate::AppState;

/// JSON request body; malformed input is a 400 with the usual error body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Raw `Authorization` header. Non-ASCII values count as present but malformed.
fn authorization(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or(""))
}

fn reject(rejection: GateRejection) -> AppError {
    counter!(GATE_REJECTED, "reason" => rejection.reason()).increment(1);
    debug!(reason = rejection.reason(), "request rejected by access gate");
    AppError::Gate(rejection)
}

/// Caller with a valid session; the request is rejected with 401 otherwise
#[derive(Debug, Clone)]
pub struct Authenticated(pub Subject);

/// Caller identity on a route that also serves anonymous requests
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Identity);

/// The token from a well-formed `Bearer` header, not yet validated
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = authorize(
            authorization(parts),
            RoutePolicy::Required,
            state.sessions.secret(),
            SessionValidator::now(),
        )
        .map_err(reject)?;

        match identity {
            Identity::Authenticated(subject) => Ok(Authenticated(subject)),
            // a required route never yields an anonymous identity
            Identity::Anonymous => Err(reject(GateRejection::MissingCredential)),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeAuthenticated {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let identity = authorize(
            authorization(parts),
            RoutePolicy::Optional,
            state.sessions.secret(),
            SessionValidator::now(),
        )
        .unwrap_or(Identity::Anonymous);
        Ok(MaybeAuthenticated(identity))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(authorization(parts)).map_err(reject)?;
        Ok(BearerToken(token.to_string()))
    }
}
