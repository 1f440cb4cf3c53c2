//! Ingredient collection service

use crate::baas::RestClient;
use crate::cache::{ns, ResponseCache};
use crate::error::ApiError;
use crate::repositories::{
    CreateIngredient, IngredientRepository, RecipeIngredientRepository,
};
use healthymeal_shared::types::{
    CreateIngredientRequest, IngredientListItem, IngredientListParams, IngredientListResponse,
    IngredientResponse, ListMeta, UpdateIngredientRequest,
};
use healthymeal_shared::validation::{resolve_ingredient_list_params, validate_ingredient_name};
use tracing::{debug, info};
use uuid::Uuid;

const DUPLICATE_NAME: &str = "Ingredient with this name already exists in your collection";

/// Ingredient service for business logic
pub struct IngredientService;

impl IngredientService {
    /// One page of the user's ingredients with their recipe usage
    pub async fn list(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        params: &IngredientListParams,
    ) -> Result<IngredientListResponse, ApiError> {
        let query = resolve_ingredient_list_params(params).map_err(ApiError::Validation)?;

        let key = ResponseCache::key_for(&query);
        let seen = cache.generation(ns::INGREDIENTS, user_id);
        if let Some(cached) = cache.get(ns::INGREDIENTS, user_id, &key).await {
            return Ok(cached);
        }

        let fetched = IngredientRepository::list_page(db, user_id, &query)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch ingredients"))?;

        let ids: Vec<Uuid> = fetched.rows.iter().map(|r| r.id).collect();
        let usage = RecipeIngredientRepository::usage_counts(db, &ids)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch ingredients"))?;

        let response = IngredientListResponse {
            data: fetched
                .rows
                .into_iter()
                .map(|r| IngredientListItem {
                    usage_count: Some(usage.get(&r.id).copied().unwrap_or(0)),
                    id: r.id,
                    name: r.name,
                    created_at: r.created_at,
                })
                .collect(),
            meta: ListMeta {
                total: fetched.total.unwrap_or(0),
                page: query.page,
                limit: query.limit,
            },
        };

        cache
            .put_if_current(ns::INGREDIENTS, user_id, &key, &response, seen)
            .await;
        Ok(response)
    }

    /// Add an ingredient; a soft-deleted one with the same name comes back
    pub async fn create(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        req: &CreateIngredientRequest,
    ) -> Result<IngredientResponse, ApiError> {
        validate_ingredient_name(&req.name).map_err(ApiError::Validation)?;
        let name = req.name.trim();

        let existing = IngredientRepository::find_by_name(db, user_id, name)
            .await
            .map_err(ApiError::baas_ctx("Failed to create ingredient"))?;

        let record = match existing {
            Some(found) if found.is_active => {
                return Err(ApiError::Conflict(DUPLICATE_NAME.to_string()));
            }
            Some(inactive) => {
                debug!(ingredient_id = %inactive.id, "Reactivating ingredient");
                IngredientRepository::reactivate(db, user_id, inactive.id)
                    .await
                    .map_err(ApiError::baas_ctx("Failed to create ingredient"))?
            }
            None => IngredientRepository::create(db, &CreateIngredient::new(user_id, name))
                .await
                .map_err(ApiError::baas_ctx("Failed to create ingredient"))?,
        };

        cache.invalidate(ns::INGREDIENTS, user_id).await;
        info!(%user_id, ingredient_id = %record.id, "Ingredient created");
        Ok(record.into())
    }

    pub async fn rename(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        id: Uuid,
        req: &UpdateIngredientRequest,
    ) -> Result<IngredientResponse, ApiError> {
        validate_ingredient_name(&req.name).map_err(ApiError::Validation)?;
        let name = req.name.trim();

        let duplicate = IngredientRepository::find_other_by_name(db, user_id, name, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to update ingredient"))?;
        if duplicate.is_some() {
            return Err(ApiError::Conflict(DUPLICATE_NAME.to_string()));
        }

        let record = IngredientRepository::rename(db, user_id, id, name)
            .await
            .map_err(ApiError::baas_ctx("Failed to update ingredient"))?
            .ok_or_else(|| ApiError::NotFound("Ingredient not found".to_string()))?;

        // Recipe details embed ingredient names
        cache.invalidate(ns::INGREDIENTS, user_id).await;
        cache.invalidate(ns::RECIPES, user_id).await;
        Ok(record.into())
    }

    /// Soft delete, refused while any recipe uses the ingredient
    pub async fn delete(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), ApiError> {
        IngredientRepository::find_by_id(db, user_id, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to delete ingredient"))?
            .ok_or_else(|| ApiError::NotFound("Ingredient not found".to_string()))?;

        let usage = RecipeIngredientRepository::count_for_ingredient(db, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to delete ingredient"))?;
        if usage > 0 {
            return Err(ApiError::Conflict(
                "Cannot delete an ingredient that is used in recipes".to_string(),
            ));
        }

        if !IngredientRepository::deactivate(db, user_id, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to delete ingredient"))?
        {
            return Err(ApiError::NotFound("Ingredient not found".to_string()));
        }

        cache.invalidate(ns::INGREDIENTS, user_id).await;
        cache.invalidate(ns::DASHBOARD, user_id).await;
        info!(%user_id, ingredient_id = %id, "Ingredient deleted");
        Ok(())
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

    #[tokio::test]
    async fn test_list_attaches_usage_and_caches() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        let salt = Uuid::new_v4();
        let pepper = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("name", "ilike.*salt*"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "0-1/2")
                    .set_body_json(json!([
                        { "id": salt, "name": "Salt", "created_at": "2024-03-01T12:00:00Z" },
                        { "id": pepper, "name": "Salt flakes", "created_at": null }
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipe_ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ingredient_id": salt },
                { "ingredient_id": salt }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let params = IngredientListParams {
            search: Some("  salt ".to_string()),
            ..Default::default()
        };
        let db = rest(&server);
        let cache = cache();

        let first = IngredientService::list(&db, &cache, user_id, &params).await.unwrap();
        assert_eq!(first.meta.total, 2);
        assert_eq!(first.data[0].usage_count, Some(2));
        assert_eq!(first.data[1].usage_count, Some(0));

        // second call is served from cache; the mocks expect one hit each
        let second = IngredientService::list(&db, &cache, user_id, &params).await.unwrap();
        assert_eq!(second.data.len(), 2);
    }

    #[tokio::test]
    async fn test_list_rejects_large_limit() {
        let server = MockServer::start().await;
        let params = IngredientListParams {
            limit: Some(101),
            ..Default::default()
        };
        let err = IngredientService::list(&rest(&server), &cache(), Uuid::new_v4(), &params)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Limit cannot exceed 100"));
    }

    #[tokio::test]
    async fn test_create_rejects_active_duplicate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("name", "eq.Basil"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": Uuid::new_v4(), "name": "Basil", "is_active": true }
            ])))
            .mount(&server)
            .await;

        let req = CreateIngredientRequest {
            name: " Basil ".to_string(),
        };
        let err = IngredientService::create(&rest(&server), &cache(), Uuid::new_v4(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(msg) if msg == DUPLICATE_NAME));
    }

    #[tokio::test]
    async fn test_create_inserts_trimmed_name() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/ingredients"))
            .and(body_partial_json(json!({ "name": "Basil", "is_active": true })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "id": Uuid::new_v4(), "name": "Basil", "is_active": true }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let req = CreateIngredientRequest {
            name: " Basil ".to_string(),
        };
        let created = IngredientService::create(&rest(&server), &cache(), user_id, &req)
            .await
            .unwrap();
        assert_eq!(created.name, "Basil");
    }

    #[tokio::test]
    async fn test_delete_refuses_used_ingredient() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "name": "Flour", "is_active": true }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/recipe_ingredients"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/1"))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = IngredientService::delete(&rest(&server), &cache(), Uuid::new_v4(), id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_ignores_lines_of_deleted_recipes() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "name": "Saffron", "is_active": true }
            ])))
            .mount(&server)
            .await;
        // the only recipe using it was soft deleted, so the active join finds nothing
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/recipe_ingredients"))
            .and(query_param("ingredient_id", format!("eq.{}", id)))
            .and(query_param("select", "ingredient_id,recipes!inner(is_active)"))
            .and(query_param("recipes.is_active", "eq.true"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/0"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/ingredients"))
            .and(body_partial_json(json!({ "is_active": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "name": "Saffron", "is_active": false }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        IngredientService::delete(&rest(&server), &cache(), user_id, id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_usage_counts_only_active_recipes() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "name": "Saffron", "created_at": null }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/recipe_ingredients"))
            .and(query_param("recipes.is_active", "eq.true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ingredient_id": id, "recipes": { "is_active": true } }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let page = IngredientService::list(
            &rest(&server),
            &cache(),
            Uuid::new_v4(),
            &IngredientListParams::default(),
        )
        .await
        .unwrap();
        assert_eq!(page.data[0].usage_count, Some(1));
    }

    #[tokio::test]
    async fn test_create_reactivates_soft_deleted_match() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("name", "eq.Basil"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "name": "Basil", "is_active": false }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("id", format!("eq.{}", id)))
            .and(body_partial_json(json!({ "is_active": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": id, "name": "Basil", "is_active": true }
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/ingredients"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let req = CreateIngredientRequest {
            name: "Basil".to_string(),
        };
        let created = IngredientService::create(&rest(&server), &cache(), Uuid::new_v4(), &req)
            .await
            .unwrap();
        assert_eq!(created.id, id);
    }

    #[tokio::test]
    async fn test_rename_to_other_ingredients_name_conflicts() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("name", "eq.Parsley"))
            .and(query_param("id", format!("neq.{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": Uuid::new_v4(), "name": "Parsley", "is_active": true }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let req = UpdateIngredientRequest {
            name: "Parsley".to_string(),
        };
        let err = IngredientService::rename(&rest(&server), &cache(), Uuid::new_v4(), id, &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(msg) if msg == DUPLICATE_NAME));
    }

    #[tokio::test]
    async fn test_rename_missing_ingredient_is_not_found() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        // keeping its own name is not a duplicate; the neq filter excludes it
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("id", format!("neq.{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/ingredients"))
            .and(query_param("id", format!("eq.{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let req = UpdateIngredientRequest {
            name: "Chives".to_string(),
        };
        let err = IngredientService::rename(&rest(&server), &cache(), Uuid::new_v4(), id, &req)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Ingredient not found"));
    }

    #[tokio::test]
    async fn test_list_error_is_prefixed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/ingredients"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "message": "relation does not exist"
            })))
            .mount(&server)
            .await;

        let err = IngredientService::list(
            &rest(&server),
            &cache(),
            Uuid::new_v4(),
            &IngredientListParams::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch ingredients: relation does not exist"
        );
    }
}
