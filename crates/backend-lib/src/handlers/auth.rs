//! Login, registration, token refresh and identity echo.
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use authgate_common::{
    ApiResponse, LoginRequest, LoginResponse, RegisterRequest, TokenResponse, UserProfile, WhoAmI,
};

use crate::auth::Identity;
use crate::error::AppError;
use crate::extract::{BearerToken, JsonBody, MaybeAuthenticated};
use crate::AppState;

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let (token, user) = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(ApiResponse::new(
        200,
        "login succeeded",
        LoginResponse {
            token,
            user: user.profile(),
        },
    )))
}

/// `POST /api/v1/auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), AppError> {
    let user = state.auth.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(201, "registration succeeded", user.profile())),
    ))
}

/// `POST /api/v1/token/refresh`
///
/// The presented token must itself still be valid. It is checked once, by the
/// refresh, so every validation failure reports as a refresh failure.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let token = state.auth.refresh(&token)?;
    Ok(Json(ApiResponse::new(
        200,
        "token refreshed",
        TokenResponse { token },
    )))
}

/// `GET /api/v1/auth/whoami`
pub async fn whoami(
    MaybeAuthenticated(identity): MaybeAuthenticated,
) -> Json<ApiResponse<WhoAmI>> {
    let data = match identity {
        Identity::Anonymous => WhoAmI::Anonymous,
        Identity::Authenticated(subject) => WhoAmI::Authenticated {
            user_id: subject.user_id,
            username: subject.username,
        },
    };
    Json(ApiResponse::new(200, "ok", data))
}
