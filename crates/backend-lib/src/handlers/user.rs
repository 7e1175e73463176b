use std::sync::Arc;

use axum::{extract::State, Json};

use authgate_common::{ApiResponse, UserProfile};

use crate::error::AppError;
use crate::extract::Authenticated;
use crate::AppState;

/// `GET /api/v1/user/profile`
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Authenticated(subject): Authenticated,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let user = state.auth.profile(subject.user_id).await?;
    Ok(Json(ApiResponse::new(200, "ok", user.profile())))
}
