//! Dietary preferences routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::PreferencesService;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use healthymeal_shared::types::{UpdateUserPreferencesRequest, UserPreferencesResponse};

pub fn preferences_routes() -> Router<AppState> {
    Router::new().route("/", get(get_preferences).put(update_preferences))
}

/// GET /api/v1/preferences
async fn get_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UserPreferencesResponse>> {
    let preferences =
        PreferencesService::get(&auth.rest(&state), state.cache(), auth.user_id).await?;
    Ok(Json(preferences))
}

/// PUT /api/v1/preferences - Create or update the user's preferences
async fn update_preferences(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateUserPreferencesRequest>,
) -> ApiResult<Json<UserPreferencesResponse>> {
    let preferences =
        PreferencesService::update(&auth.rest(&state), state.cache(), auth.user_id, &req).await?;
    Ok(Json(preferences))
}
