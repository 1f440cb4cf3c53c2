//! Authentication routes
//!
//! Signup, login, logout and refresh are forwarded to the BaaS auth API.
//! Logout and `/me` require a bearer token.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::AuthService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use healthymeal_shared::types::{
    CurrentUserResponse, LoginRequest, LoginResponse, RefreshRequest, SignUpRequest,
    SignUpResponse,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route("/me", get(current_user))
}

/// Register a new account
///
/// POST /api/v1/auth/signup
async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    let redirect_to = state.config().server.public_url.as_deref();
    let response = AuthService::sign_up(state.baas(), &req, redirect_to).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let response = AuthService::login(state.baas(), &state.login_limiter, &req).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    AuthService::logout(state.baas(), state.cache(), &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/refresh
async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let response = AuthService::refresh(state.baas(), &req).await?;
    Ok(Json(response))
}

/// Get the signed-in user
///
/// GET /api/v1/auth/me
async fn current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CurrentUserResponse>> {
    let user = AuthService::current_user(state.baas(), &auth).await?;
    Ok(Json(user))
}
