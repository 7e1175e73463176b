// ============================
// authgate-backend/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod gate;
pub mod password;
pub mod secret;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use gate::{authorize, bearer_token, GateRejection, Identity, RoutePolicy, Subject};
pub use password::{hash_password, verify_password, HashParams, HashingError};
pub use secret::ServerSecret;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{
    issue_session, refresh_session, validate_session, SessionValidator, ValidationError,
    SESSION_TTL,
};
pub use token::{Claims, DecodeError};
