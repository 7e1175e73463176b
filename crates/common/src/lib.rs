// ================
// common/src/lib.rs
// ================
//! Wire types shared between the `authgate` server and its clients.
//! Every JSON body the HTTP API accepts or returns is defined here.

use serde::{Deserialize, Serialize};

/// User identifier assigned by the user store
pub type UserId = i64;

/// Success envelope wrapping every non-error response body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// Mirrors the HTTP status code
    pub code: u16,
    /// Short human readable outcome
    pub message: String,
    /// Response payload
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }
}

/// Body of `POST /api/v1/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/v1/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Public view of a stored user. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

/// Data returned by a successful login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user: UserProfile,
}

/// Data returned by a successful token refresh
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub token: String,
}

/// Identity as seen by a route with optional authentication
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WhoAmI {
    Anonymous,
    Authenticated { user_id: UserId, username: String },
}

/// Body of `GET /health`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_has_no_password_field() {
        let profile = UserProfile {
            id: 1,
            username: "admin".into(),
            email: "admin@example.com".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn whoami_is_tagged_by_state() {
        let json = serde_json::to_value(WhoAmI::Authenticated {
            user_id: 7,
            username: "bob".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "authenticated");
        assert_eq!(json["user_id"], 7);

        let anon = serde_json::to_value(WhoAmI::Anonymous).unwrap();
        assert_eq!(anon["state"], "anonymous");
    }

    #[test]
    fn envelope_layout() {
        let body = ApiResponse::new(200, "ok", TokenResponse { token: "t".into() });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["token"], "t");
    }
}
