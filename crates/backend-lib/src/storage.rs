// ============================
// authgate-backend/src/storage.rs
// ============================
//! User store abstraction with in-memory and flat-file implementations.
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{fs as tokio_fs, sync::RwLock};
use tracing::debug;

use authgate_common::{UserId, UserProfile};

/// File holding all users under the data directory
const USERS_FILE: &str = "users.json";

/// A stored credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// PHC string, never plaintext
    pub password_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view without the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

/// Input for [`UserStore::insert`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

impl NewUser {
    fn into_record(self, id: UserId) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists: {0}")]
    DuplicateUsername(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage data is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for user store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by their unique username
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look a user up by id
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new user and return the assigned id
    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError>;
}

/// Process-local store, lost on restart
#[derive(Debug)]
pub struct MemoryUserStore {
    users: DashMap<UserId, UserRecord>,
    by_name: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            by_name: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.by_name.get(username).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        // The name entry stays locked until the record is in place.
        match self.by_name.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername(user.username)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.users.insert(id, user.into_record(id));
                slot.insert(id);
                Ok(id)
            },
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersDocument {
    next_id: UserId,
    users: Vec<UserRecord>,
}

/// Flat-file implementation of the [`UserStore`] trait.
///
/// All users live in one JSON document that is loaded on open and rewritten
/// through a temp file and rename on every insert.
#[derive(Debug)]
pub struct FlatFileUserStore {
    path: PathBuf,
    doc: RwLock<UsersDocument>,
}

impl FlatFileUserStore {
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref();
        tokio_fs::create_dir_all(root).await?;
        let path = root.join(USERS_FILE);

        let doc = match tokio_fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UsersDocument {
                next_id: 1,
                users: Vec::new(),
            },
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), users = doc.users.len(), "opened user store");

        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    async fn persist(&self, doc: &UsersDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let doc = self.doc.read().await;
        Ok(doc.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let doc = self.doc.read().await;
        Ok(doc.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserId, StoreError> {
        let mut doc = self.doc.write().await;
        if doc.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        let id = doc.next_id.max(1);
        doc.next_id = id + 1;
        doc.users.push(user.into_record(id));

        if let Err(e) = self.persist(&doc).await {
            // keep memory in line with disk
            doc.users.pop();
            doc.next_id = id;
            return Err(e);
        }
        debug!(user_id = id, "stored new user");
        Ok(id)
    }
}
