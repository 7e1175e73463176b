// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const USER_REGISTERED: &str = "auth.user.registered";
pub const TOKEN_REFRESHED: &str = "auth.token.refreshed";
pub const GATE_REJECTED: &str = "auth.gate.rejected";
