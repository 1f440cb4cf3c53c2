//! Dashboard counters and recent activity

use crate::baas::RestClient;
use crate::cache::{ns, ResponseCache};
use crate::error::ApiError;
use crate::repositories::{RecipeIngredientRepository, RecipeRepository};
use chrono::{DateTime, Utc};
use healthymeal_shared::models::ActivityType;
use healthymeal_shared::text::format_relative_time;
use healthymeal_shared::types::{ActivityItem, DashboardStats};
use std::collections::HashSet;
use uuid::Uuid;

const STATS_KEY: &str = "stats";
const RECENT_ACTIVITY_LIMIT: u64 = 5;

/// Dashboard service
pub struct DashboardService;

impl DashboardService {
    pub async fn stats(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
    ) -> Result<DashboardStats, ApiError> {
        let seen = cache.generation(ns::DASHBOARD, user_id);
        if let Some(cached) = cache.get(ns::DASHBOARD, user_id, STATS_KEY).await {
            return Ok(cached);
        }

        let recipe_ids = RecipeRepository::active_ids(db, user_id)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch user recipes"))?;

        let stats = if recipe_ids.is_empty() {
            DashboardStats {
                total_recipes: 0,
                total_ingredients: 0,
                total_active_days: 0,
            }
        } else {
            let ingredient_ids =
                RecipeIngredientRepository::ingredient_ids_for_recipes(db, &recipe_ids)
                    .await
                    .map_err(ApiError::baas_ctx("Failed to fetch recipe ingredients"))?;
            let distinct: HashSet<Uuid> = ingredient_ids.into_iter().collect();

            let first = RecipeRepository::first_created_at(db, user_id)
                .await
                .map_err(ApiError::baas_ctx("Failed to fetch user recipes"))?;

            DashboardStats {
                total_recipes: recipe_ids.len() as u64,
                total_ingredients: distinct.len() as u64,
                total_active_days: first.map(|at| days_since(at, Utc::now())).unwrap_or(0),
            }
        };

        cache
            .put_if_current(ns::DASHBOARD, user_id, STATS_KEY, &stats, seen)
            .await;
        Ok(stats)
    }

    /// Recently added recipes, newest first
    pub async fn activities(db: &RestClient, user_id: Uuid) -> Result<Vec<ActivityItem>, ApiError> {
        let recent = RecipeRepository::recent(db, user_id, RECENT_ACTIVITY_LIMIT)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch activities"))?;

        let now = Utc::now();
        if recent.is_empty() {
            return Ok(vec![ActivityItem {
                id: "welcome".to_string(),
                activity_type: ActivityType::RecipeAdded,
                title: "Welcome to HealthyMeal".to_string(),
                timestamp: now,
                relative_time: format_relative_time(now, now),
            }]);
        }

        Ok(recent
            .into_iter()
            .map(|recipe| {
                let timestamp = recipe.created_at.unwrap_or(now);
                ActivityItem {
                    id: recipe.id.to_string(),
                    activity_type: ActivityType::RecipeAdded,
                    title: recipe.title,
                    timestamp,
                    relative_time: format_relative_time(timestamp, now),
                }
            })
            .collect())
    }
}

fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(then).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::BaasClient;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rest(server: &MockServer) -> RestClient {
        BaasClient::new(&server.uri(), "anon", Duration::from_secs(5))
            .unwrap()
            .rest("user-token")
    }

    #[test]
    fn test_days_since_never_negative() {
        let now = Utc::now();
        assert_eq!(days_since(now + ChronoDuration::hours(3), now), 0);
        assert_eq!(days_since(now - ChronoDuration::hours(49), now), 2);
    }

    #[tokio::test]
    async fn test_stats_without_recipes_skips_other_queries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipes"))
            .and(query_param("select", "id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipe_ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let cache = ResponseCache::in_memory(Duration::from_secs(300));
        let stats = DashboardService::stats(&rest(&server), &cache, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(stats.total_recipes, 0);
        assert_eq!(stats.total_active_days, 0);
    }

    #[tokio::test]
    async fn test_stats_counts_distinct_ingredients() {
        let server = MockServer::start().await;
        let (r1, r2) = (Uuid::new_v4(), Uuid::new_v4());
        let (flour, egg) = (Uuid::new_v4(), Uuid::new_v4());
        let first = Utc::now() - ChronoDuration::days(3) - ChronoDuration::hours(1);

        Mock::given(method("GET"))
            .and(path("/rest/v1/recipes"))
            .and(query_param("select", "id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": r1 }, { "id": r2 }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipe_ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ingredient_id": flour },
                { "ingredient_id": egg },
                { "ingredient_id": flour }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipes"))
            .and(query_param("select", "created_at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "created_at": first }])))
            .mount(&server)
            .await;

        let cache = ResponseCache::in_memory(Duration::from_secs(300));
        let stats = DashboardService::stats(&rest(&server), &cache, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_recipes: 2,
                total_ingredients: 2,
                total_active_days: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_activities_welcome_when_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipes"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let items = DashboardService::activities(&rest(&server), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Welcome to HealthyMeal");
        assert_eq!(items[0].relative_time, "Just now");
    }

    #[tokio::test]
    async fn test_activities_lists_recent_recipes() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        let created = Utc::now() - ChronoDuration::hours(2) - ChronoDuration::minutes(5);
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": id,
                "title": "Shakshuka",
                "description": null,
                "cooking_time": 25,
                "difficulty": "easy",
                "calories": 410.0,
                "created_at": created
            }])))
            .mount(&server)
            .await;

        let items = DashboardService::activities(&rest(&server), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(items[0].id, id.to_string());
        assert_eq!(items[0].activity_type, ActivityType::RecipeAdded);
        assert_eq!(items[0].relative_time, "2 hours ago");
    }
}
