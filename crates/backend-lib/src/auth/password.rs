// ============================
// authgate-backend/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Stored credentials are PHC strings (`$scrypt$ln=..,r=..,p=..$salt$hash`), so
//! the salt and cost parameters travel with every hash. Verification always
//! uses the parameters embedded in the stored string, which lets the cost be
//! raised for new hashes without invalidating old ones.
use scrypt::{
    password_hash::{
        rand_core::OsRng, Error as PhcError, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output length of the derived key in bytes
const HASH_LEN: usize = Params::RECOMMENDED_LEN;

/// Failure of the hashing machinery itself, never a wrong password
#[derive(Debug, Error)]
pub enum HashingError {
    #[error("invalid scrypt cost parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hash(PhcError),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(PhcError),
}

/// Scrypt cost factor. `log_n` dominates CPU and memory cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for HashParams {
    /// Tens of milliseconds on commodity hardware
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl HashParams {
    /// Convert into scrypt parameters, rejecting out-of-range values
    pub fn to_scrypt(self) -> Result<Params, HashingError> {
        Params::new(self.log_n, self.r, self.p, HASH_LEN)
            .map_err(|e| HashingError::InvalidParams(e.to_string()))
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(plain: &str, params: HashParams) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params.to_scrypt()?, &salt)
        .map_err(HashingError::Hash)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored PHC hash.
///
/// A wrong password is `Ok(false)`. Only a stored value that cannot be parsed
/// as a scrypt PHC string is an error.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, HashingError> {
    let parsed = PasswordHash::new(stored).map_err(HashingError::MalformedHash)?;
    match Scrypt.verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(e) => Err(HashingError::MalformedHash(e)),
    }
}
