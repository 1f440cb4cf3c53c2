//! Ingredient collection routes

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::IngredientService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use healthymeal_shared::types::{
    CreateIngredientRequest, IngredientListParams, IngredientListResponse, IngredientResponse,
    UpdateIngredientRequest,
};
use uuid::Uuid;

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route("/:id", put(rename_ingredient).delete(delete_ingredient))
}

fn parse_ingredient_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::Validation("Invalid ingredient ID format".to_string()))
}

/// GET /api/v1/ingredients - Page through the user's ingredients
async fn list_ingredients(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<IngredientListParams>,
) -> ApiResult<Json<IngredientListResponse>> {
    let response =
        IngredientService::list(&auth.rest(&state), state.cache(), auth.user_id, &params).await?;
    Ok(Json(response))
}

/// POST /api/v1/ingredients - Add an ingredient
async fn create_ingredient(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateIngredientRequest>,
) -> ApiResult<(StatusCode, Json<IngredientResponse>)> {
    let created =
        IngredientService::create(&auth.rest(&state), state.cache(), auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/ingredients/:id - Rename an ingredient
async fn rename_ingredient(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateIngredientRequest>,
) -> ApiResult<Json<IngredientResponse>> {
    let id = parse_ingredient_id(&id)?;
    let updated =
        IngredientService::rename(&auth.rest(&state), state.cache(), auth.user_id, id, &req)
            .await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/ingredients/:id
async fn delete_ingredient(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_ingredient_id(&id)?;
    IngredientService::delete(&auth.rest(&state), state.cache(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
