//! Dashboard routes

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::DashboardService;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use healthymeal_shared::types::{ActivityItem, DashboardStats};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/activities", get(get_activities))
}

/// GET /api/v1/dashboard/stats
async fn get_stats(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<DashboardStats>> {
    let stats = DashboardService::stats(&auth.rest(&state), state.cache(), auth.user_id).await?;
    Ok(Json(stats))
}

/// GET /api/v1/dashboard/activities
async fn get_activities(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<ActivityItem>>> {
    let items = DashboardService::activities(&auth.rest(&state), auth.user_id).await?;
    Ok(Json(items))
}
