//! Translation lookup route

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::TranslationService;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use healthymeal_shared::types::{TranslationParams, TranslationResponse};

pub fn translation_routes() -> Router<AppState> {
    Router::new().route("/", get(get_translations))
}

/// GET /api/v1/translations?table_name=..&record_id=..&language_code=..
async fn get_translations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<TranslationParams>,
) -> ApiResult<Json<TranslationResponse>> {
    let response = TranslationService::get(&auth.rest(&state), &params).await?;
    Ok(Json(response))
}
