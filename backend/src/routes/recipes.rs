//! Recipe routes, including LLM generation and version history

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::{GenerationService, RecipeService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use healthymeal_shared::types::{
    CreateRecipeRequest, GenerateRecipeResponse, RecipeGenerationRequest, RecipeListParams,
    RecipeListResponse, RecipeResponse, RecipeVersionsResponse, UpdateRecipeRequest,
};
use uuid::Uuid;

/// Create recipe routes
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/generate", post(generate_recipe))
        .route(
            "/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/:id/versions", get(list_versions))
}

fn parse_recipe_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::Validation("Invalid recipe ID format".to_string()))
}

/// GET /api/v1/recipes - Search, sort and page the user's recipes
async fn list_recipes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<RecipeListParams>,
) -> ApiResult<Json<RecipeListResponse>> {
    let response =
        RecipeService::list(&auth.rest(&state), state.cache(), auth.user_id, &params).await?;
    Ok(Json(response))
}

/// POST /api/v1/recipes
async fn create_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let recipe =
        RecipeService::create(&auth.rest(&state), state.cache(), auth.user_id, &req).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// POST /api/v1/recipes/generate - Generate a recipe with the LLM and save it
///
/// Limited per user; stored preferences fill in anything the request
/// leaves out.
async fn generate_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RecipeGenerationRequest>,
) -> ApiResult<(StatusCode, Json<GenerateRecipeResponse>)> {
    let response = GenerationService::generate_and_save(
        &auth.rest(&state),
        state.cache(),
        &state.llm,
        &state.generation_limiter,
        auth.user_id,
        req,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/recipes/:id
async fn get_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RecipeResponse>> {
    let id = parse_recipe_id(&id)?;
    let recipe = RecipeService::get(&auth.rest(&state), auth.user_id, id).await?;
    Ok(Json(recipe))
}

/// PUT /api/v1/recipes/:id - Update a recipe, keeping the previous version
async fn update_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    let id = parse_recipe_id(&id)?;
    let recipe =
        RecipeService::update(&auth.rest(&state), state.cache(), auth.user_id, id, &req).await?;
    Ok(Json(recipe))
}

/// DELETE /api/v1/recipes/:id
async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_recipe_id(&id)?;
    RecipeService::delete(&auth.rest(&state), state.cache(), auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/recipes/:id/versions
async fn list_versions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RecipeVersionsResponse>> {
    let id = parse_recipe_id(&id)?;
    let versions = RecipeService::versions(&auth.rest(&state), auth.user_id, id).await?;
    Ok(Json(versions))
}
