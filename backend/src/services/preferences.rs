//! Dietary preferences service

use crate::baas::RestClient;
use crate::cache::{ns, ResponseCache};
use crate::error::ApiError;
use crate::repositories::{
    CreatePreferences, CreatePreferencesHistory, PreferencesFields, PreferencesPatch,
    PreferencesRepository,
};
use chrono::Utc;
use healthymeal_shared::models::MeasurementSystem;
use healthymeal_shared::types::{UpdateUserPreferencesRequest, UserPreferencesResponse};
use healthymeal_shared::validation::validate_preferences;
use tracing::{info, warn};
use uuid::Uuid;

/// Preferences are a single record per user
const CACHE_KEY: &str = "current";

fn fields_from(req: &UpdateUserPreferencesRequest) -> Result<PreferencesFields, ApiError> {
    let measurement_system = req
        .measurement_system
        .as_deref()
        .map(|s| {
            s.parse::<MeasurementSystem>()
                .map_err(|e| ApiError::Validation(e.to_string()))
        })
        .transpose()?;

    Ok(PreferencesFields {
        daily_calories: req.daily_calories,
        protein_percentage: req.protein_percentage,
        carbs_percentage: req.carbs_percentage,
        fat_percentage: req.fat_percentage,
        allergens: req.allergens.clone(),
        micro_nutrients: req.micro_nutrients.clone(),
        measurement_system,
    })
}

/// Preferences service for business logic
pub struct PreferencesService;

impl PreferencesService {
    pub async fn get(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
    ) -> Result<UserPreferencesResponse, ApiError> {
        let seen = cache.generation(ns::PREFERENCES, user_id);
        if let Some(cached) = cache.get(ns::PREFERENCES, user_id, CACHE_KEY).await {
            return Ok(cached);
        }

        let preferences = PreferencesRepository::find_by_user(db, user_id)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch user preferences"))?
            .ok_or_else(|| ApiError::NotFound("User preferences not found".to_string()))?;

        cache
            .put_if_current(ns::PREFERENCES, user_id, CACHE_KEY, &preferences, seen)
            .await;
        Ok(preferences)
    }

    /// Create or patch the user's preferences and record the change
    pub async fn update(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        req: &UpdateUserPreferencesRequest,
    ) -> Result<UserPreferencesResponse, ApiError> {
        validate_preferences(req).map_err(ApiError::Validation)?;
        let fields = fields_from(req)?;

        let existing = PreferencesRepository::find_by_user(db, user_id)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch user preferences"))?;

        let now = Utc::now();
        let preferences = match existing {
            None => PreferencesRepository::create(
                db,
                &CreatePreferences {
                    user_id,
                    fields,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .map_err(ApiError::baas_ctx("Failed to create user preferences"))?,
            Some(current) => PreferencesRepository::update(
                db,
                user_id,
                current.id,
                &PreferencesPatch {
                    fields,
                    updated_at: now,
                },
            )
            .await
            .map_err(ApiError::baas_ctx("Failed to update user preferences"))?,
        };

        let history = CreatePreferencesHistory {
            user_preferences_id: preferences.id,
            changed_by: user_id,
            changes: serde_json::to_value(req).unwrap_or_default(),
            changed_at: now,
        };
        if let Err(e) = PreferencesRepository::add_history(db, &history).await {
            warn!(%user_id, error = %e, "Failed to record preferences history");
        }

        cache.put(ns::PREFERENCES, user_id, CACHE_KEY, &preferences).await;
        info!(%user_id, "Preferences updated");
        Ok(preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::BaasClient;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rest(server: &MockServer) -> RestClient {
        BaasClient::new(&server.uri(), "anon", Duration::from_secs(5))
            .unwrap()
            .rest("user-token")
    }

    fn cache() -> ResponseCache {
        ResponseCache::in_memory(Duration::from_secs(300))
    }

    fn row(id: Uuid, calories: i32) -> serde_json::Value {
        json!({
            "id": id,
            "daily_calories": calories,
            "protein_percentage": 30.0,
            "carbs_percentage": 40.0,
            "fat_percentage": 30.0,
            "allergens": ["nuts"],
            "micro_nutrients": null,
            "measurement_system": "metric"
        })
    }

    #[tokio::test]
    async fn test_get_missing_preferences_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_preferences"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = PreferencesService::get(&rest(&server), &cache(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "User preferences not found"));
    }

    #[tokio::test]
    async fn test_get_is_cached() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_preferences"))
            .and(query_param("user_id", format!("eq.{}", user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(Uuid::new_v4(), 2000)])))
            .expect(1)
            .mount(&server)
            .await;

        let db = rest(&server);
        let cache = cache();
        let first = PreferencesService::get(&db, &cache, user_id).await.unwrap();
        let second = PreferencesService::get(&db, &cache, user_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_macros() {
        let server = MockServer::start().await;
        let req = UpdateUserPreferencesRequest {
            protein_percentage: Some(50.0),
            carbs_percentage: Some(40.0),
            ..Default::default()
        };
        let err = PreferencesService::update(&rest(&server), &cache(), Uuid::new_v4(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Macronutrient percentages must sum to 100"));
    }

    #[tokio::test]
    async fn test_update_patches_existing_and_survives_history_failure() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        let prefs_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/user_preferences"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(prefs_id, 2000)])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/user_preferences"))
            .and(query_param("id", format!("eq.{}", prefs_id)))
            .and(body_partial_json(json!({ "daily_calories": 1800 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(prefs_id, 1800)])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_preferences_history"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "denied" })))
            .expect(1)
            .mount(&server)
            .await;

        let req = UpdateUserPreferencesRequest {
            daily_calories: Some(1800),
            ..Default::default()
        };
        let db = rest(&server);
        let cache = cache();
        let updated = PreferencesService::update(&db, &cache, user_id, &req).await.unwrap();
        assert_eq!(updated.daily_calories, Some(1800));

        let cached: Option<UserPreferencesResponse> =
            cache.get(ns::PREFERENCES, user_id, CACHE_KEY).await;
        assert_eq!(cached.unwrap().daily_calories, Some(1800));
    }

    #[tokio::test]
    async fn test_update_inserts_when_missing() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_preferences"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_preferences"))
            .and(body_partial_json(json!({ "user_id": user_id, "measurement_system": "imperial" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(Uuid::new_v4(), 2000)])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_preferences_history"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let req = UpdateUserPreferencesRequest {
            measurement_system: Some("imperial".to_string()),
            ..Default::default()
        };
        PreferencesService::update(&rest(&server), &cache(), user_id, &req)
            .await
            .unwrap();
    }
}
