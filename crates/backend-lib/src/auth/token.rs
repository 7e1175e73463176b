// ============================
// authgate-backend/src/auth/token.rs
// ============================
//! Signed session token codec.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! without padding, where `mac = HMAC-SHA256(secret, "<header>.<claims>")`.
//! Only `HS256` is ever produced or accepted. Decoding checks structure and
//! signature; freshness (`exp`/`nbf`) is judged by [`crate::auth::session`].
//!
//! The signature segment is compared as encoded text rather than decoded
//! first, so a corrupted signature (even one that is no longer valid base64)
//! is reported as [`DecodeError::BadSignature`], which a general JWT library
//! would surface as a base64 error instead.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use authgate_common::UserId;

use super::ServerSecret;

type HmacSha256 = Hmac<Sha256>;

/// The only signing algorithm this codec speaks
pub const ALGORITHM: &str = "HS256";

/// Canonical header, byte-identical for every token we mint
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Identity and timing payload of a session token.
///
/// Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub username: String,
    /// Issuer
    pub iss: String,
    /// Subject, the username
    pub sub: String,
    /// Expiry
    pub exp: i64,
    /// Not before
    pub nbf: i64,
    /// Issued at
    pub iat: i64,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Why a token string could not be turned into claims
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    #[error("token signature does not verify")]
    BadSignature,
}

/// Serialize and sign claims
pub fn encode(claims: &Claims, secret: &ServerSecret) -> String {
    let payload = serde_json::json!({
        "user_id": claims.user_id,
        "username": claims.username,
        "iss": claims.iss,
        "sub": claims.sub,
        "exp": claims.exp,
        "nbf": claims.nbf,
        "iat": claims.iat,
    });

    let mut token = URL_SAFE_NO_PAD.encode(HEADER_JSON);
    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(payload.to_string()));

    let signature = sign(&token, secret);
    token.push('.');
    token.push_str(&signature);
    token
}

/// Verify a token's signature and extract its claims.
///
/// Expiry and not-before are not checked here.
pub fn decode(token: &str, secret: &ServerSecret) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::Malformed("expected three segments"));
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| DecodeError::Malformed("header is not base64url"))?;
    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|_| DecodeError::Malformed("header is not a JSON object with alg"))?;
    if header.alg != ALGORITHM {
        return Err(DecodeError::Malformed("unsupported signing algorithm"));
    }

    // Compare encoded forms so any change to the signature segment, including
    // one that is not valid base64, is a signature failure.
    let signing_input = &token[..header_b64.len() + 1 + payload_b64.len()];
    let expected = sign(signing_input, secret);
    if !bool::from(expected.as_bytes().ct_eq(signature_b64.as_bytes())) {
        return Err(DecodeError::BadSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| DecodeError::Malformed("claims are not base64url"))?;
    serde_json::from_slice(&payload)
        .map_err(|_| DecodeError::Malformed("claims are missing or mistyped"))
}

fn sign(signing_input: &str, secret: &ServerSecret) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.expose()).expect("HMAC can take key of any size");
    mac.update(signing_input.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}
