use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use authgate_common::{RegisterRequest, UserId};

use crate::auth::{hash_password, verify_password, AuthService, HashParams, SessionValidator};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, TOKEN_REFRESHED, USER_REGISTERED};
use crate::storage::{NewUser, StoreError, UserRecord, UserStore};
use crate::validation::validate_register;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@example.com";

/// Checked against when the username is unknown; never matches a real login
const DECOY_PASSWORD: &str = "authgate-decoy-password";

pub struct DefaultAuth {
    store: Arc<dyn UserStore>,
    sessions: SessionValidator,
    hash_params: HashParams,
    decoy_hash: OnceCell<String>,
}

impl DefaultAuth {
    pub fn new(
        store: Arc<dyn UserStore>,
        sessions: SessionValidator,
        hash_params: HashParams,
    ) -> Self {
        Self {
            store,
            sessions,
            hash_params,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Scrypt is deliberately slow, keep it off the async workers
    async fn hash(&self, password: String) -> Result<String, AppError> {
        let params = self.hash_params;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, params)).await??;
        Ok(hash)
    }

    async fn verify(&self, password: String, stored: String) -> Result<bool, AppError> {
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await??;
        Ok(ok)
    }

    /// Hash with the configured cost, built on first use
    async fn decoy_hash(&self) -> Result<String, AppError> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hash(DECOY_PASSWORD.to_string()))
            .await?;
        Ok(hash.clone())
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, req: RegisterRequest) -> Result<UserRecord, AppError> {
        validate_register(&req)?;

        let RegisterRequest {
            username,
            password,
            email,
        } = req;
        let password_hash = self.hash(password).await?;
        let id = self
            .store
            .insert(NewUser {
                username: username.clone(),
                password_hash,
                email,
            })
            .await?;

        counter!(USER_REGISTERED).increment(1);
        info!(user_id = id, %username, "user registered");

        self.profile(id).await
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, UserRecord), AppError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            // unknown users pay for one verification, same as a wrong password
            let decoy = self.decoy_hash().await?;
            self.verify(password.to_string(), decoy).await?;
            counter!(LOGIN_FAILURE).increment(1);
            warn!(%username, "login failed");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .verify(password.to_string(), user.password_hash.clone())
            .await?
        {
            counter!(LOGIN_FAILURE).increment(1);
            warn!(%username, "login failed");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.sessions.issue(user.id, &user.username);
        counter!(LOGIN_SUCCESS).increment(1);
        info!(user_id = user.id, %username, "login succeeded");
        Ok((token, user))
    }

    async fn profile(&self, user_id: UserId) -> Result<UserRecord, AppError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    fn refresh(&self, token: &str) -> Result<String, AppError> {
        let fresh = self.sessions.refresh(token).map_err(AppError::Refresh)?;
        counter!(TOKEN_REFRESHED).increment(1);
        Ok(fresh)
    }

    async fn seed_admin(&self, password: &str) -> Result<bool, AppError> {
        if self.store.find_by_username(ADMIN_USERNAME).await?.is_some() {
            return Ok(false);
        }

        let password_hash = self.hash(password.to_string()).await?;
        let inserted = self
            .store
            .insert(NewUser {
                username: ADMIN_USERNAME.to_string(),
                password_hash,
                email: ADMIN_EMAIL.to_string(),
            })
            .await;

        match inserted {
            Ok(id) => {
                info!(user_id = id, "default admin user created");
                Ok(true)
            },
            // another instance won the race
            Err(StoreError::DuplicateUsername(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
