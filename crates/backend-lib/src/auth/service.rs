//! The `AuthService` trait: the login/register entry points of the core.
use async_trait::async_trait;

use authgate_common::{RegisterRequest, UserId};

use crate::error::AppError;
use crate::storage::UserRecord;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate input, hash the password and store the user
    async fn register(&self, req: RegisterRequest) -> Result<UserRecord, AppError>;

    /// Check a username/password pair and mint a session token
    async fn login(&self, username: &str, password: &str)
        -> Result<(String, UserRecord), AppError>;

    async fn profile(&self, user_id: UserId) -> Result<UserRecord, AppError>;

    /// Exchange a still-valid token for a fresh one
    fn refresh(&self, token: &str) -> Result<String, AppError>;

    /// Create the `admin` user if absent. Returns whether it was created.
    async fn seed_admin(&self, password: &str) -> Result<bool, AppError>;
}
