//! Recipe service
//!
//! Provides business logic for recipes including:
//! - Paginated, sorted listing with a per-user response cache
//! - Creation with ingredient lines and compensating rollback
//! - Versioned updates that snapshot the previous row
//! - Soft deletion

use crate::baas::RestClient;
use crate::cache::{ns, ResponseCache};
use crate::error::ApiError;
use crate::repositories::{
    CreateRecipe, CreateRecipeIngredientRow, CreateRecipeVersion, IngredientRepository,
    RecipeDetailRecord, RecipeIngredientRecord, RecipeIngredientRepository, RecipePatch,
    RecipeRepository, RecipeVersionRepository,
};
use chrono::Utc;
use healthymeal_shared::models::Difficulty;
use healthymeal_shared::text::parse_instructions;
use healthymeal_shared::types::{
    CreateRecipeIngredient, CreateRecipeRequest, ListMeta, RecipeIngredientDto, RecipeListItem,
    RecipeListParams, RecipeListResponse, RecipeResponse, RecipeVersionsResponse,
    UpdateRecipeRequest,
};
use healthymeal_shared::validation::{
    resolve_recipe_list_params, validate_create_recipe, validate_update_recipe,
};
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

fn not_found() -> ApiError {
    ApiError::NotFound("Recipe not found".to_string())
}

fn parse_difficulty(value: Option<&str>) -> Result<Option<Difficulty>, ApiError> {
    value
        .map(|d| {
            d.parse::<Difficulty>()
                .map_err(|_| ApiError::Validation("Invalid difficulty value".to_string()))
        })
        .transpose()
}

/// Join rows for `recipe_id`; ids were validated upstream
fn ingredient_rows(
    recipe_id: Uuid,
    lines: &[CreateRecipeIngredient],
) -> Result<Vec<CreateRecipeIngredientRow>, ApiError> {
    let now = Utc::now();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let ingredient_id = Uuid::parse_str(&line.ingredient_id).map_err(|_| {
                ApiError::Validation(format!(
                    "Ingredient {}: Invalid ID format. Must be a valid UUID",
                    i + 1
                ))
            })?;
            Ok(CreateRecipeIngredientRow {
                recipe_id,
                ingredient_id,
                amount: line.amount,
                unit: line.unit.trim().to_string(),
                notes: line.notes.clone(),
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

fn detail_response(detail: RecipeDetailRecord) -> RecipeResponse {
    let recipe = detail.recipe;
    RecipeResponse {
        steps: parse_instructions(&recipe.instructions),
        id: recipe.id,
        title: recipe.title,
        description: recipe.description,
        instructions: recipe.instructions,
        cooking_time: recipe.cooking_time,
        difficulty: recipe.difficulty,
        calories: recipe.calories,
        protein: recipe.protein,
        carbs: recipe.carbs,
        fat: recipe.fat,
        version: recipe.version.unwrap_or(1),
        ingredients: detail
            .recipe_ingredients
            .into_iter()
            .map(|line| RecipeIngredientDto {
                id: line.id,
                name: line.ingredient.map(|i| i.name).unwrap_or_default(),
                amount: line.amount,
                unit: line.unit,
                notes: line.notes,
            })
            .collect(),
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    }
}

/// Recipe service for business logic
pub struct RecipeService;

impl RecipeService {
    /// One page of the user's active recipes
    pub async fn list(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        params: &RecipeListParams,
    ) -> Result<RecipeListResponse, ApiError> {
        let query = resolve_recipe_list_params(params).map_err(ApiError::Validation)?;

        let key = ResponseCache::key_for(&query);
        let seen = cache.generation(ns::RECIPES, user_id);
        if let Some(cached) = cache.get(ns::RECIPES, user_id, &key).await {
            return Ok(cached);
        }

        let fetched = RecipeRepository::list_page(db, user_id, &query)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch recipes"))?;

        let response = RecipeListResponse {
            data: fetched
                .rows
                .into_iter()
                .map(|r| RecipeListItem {
                    id: r.id,
                    title: r.title,
                    description: r.description,
                    cooking_time: r.cooking_time,
                    difficulty: r.difficulty,
                    calories: r.calories,
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
            .put_if_current(ns::RECIPES, user_id, &key, &response, seen)
            .await;
        Ok(response)
    }

    /// Recipe with its ingredient lines and parsed steps
    pub async fn get(db: &RestClient, user_id: Uuid, id: Uuid) -> Result<RecipeResponse, ApiError> {
        let detail = RecipeRepository::find_detail(db, user_id, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch recipe"))?
            .ok_or_else(not_found)?;
        Ok(detail_response(detail))
    }

    /// Create a recipe and its ingredient lines
    ///
    /// The lines go in as one insert; if it fails the recipe row is deleted
    /// again before the error is returned.
    pub async fn create(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        req: &CreateRecipeRequest,
    ) -> Result<RecipeResponse, ApiError> {
        validate_create_recipe(req).map_err(ApiError::Validation)?;
        let difficulty = parse_difficulty(req.difficulty.as_deref())?;

        let now = Utc::now();
        let recipe = RecipeRepository::create(
            db,
            &CreateRecipe {
                user_id,
                title: req.title.trim().to_string(),
                description: req.description.clone(),
                instructions: req.instructions.clone(),
                cooking_time: req.cooking_time,
                difficulty,
                calories: req.calories,
                protein: req.protein,
                carbs: req.carbs,
                fat: req.fat,
                version: 1,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(ApiError::baas_ctx("Failed to create recipe"))?;

        let rows = ingredient_rows(recipe.id, &req.ingredients)?;
        let lines = match RecipeIngredientRepository::insert_many(db, &rows).await {
            Ok(lines) => lines,
            Err(e) => {
                if let Err(rollback) = RecipeRepository::delete(db, user_id, recipe.id).await {
                    error!(recipe_id = %recipe.id, error = %rollback, "Recipe rollback failed");
                }
                return Err(ApiError::baas("Failed to create recipe ingredients", e));
            }
        };

        let names = Self::ingredient_names(db, &lines).await?;

        Self::invalidate_after_write(cache, user_id).await;
        info!(%user_id, recipe_id = %recipe.id, "Recipe created");

        Ok(RecipeResponse {
            steps: parse_instructions(&recipe.instructions),
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            instructions: recipe.instructions,
            cooking_time: recipe.cooking_time,
            difficulty: recipe.difficulty,
            calories: recipe.calories,
            protein: recipe.protein,
            carbs: recipe.carbs,
            fat: recipe.fat,
            version: recipe.version.unwrap_or(1),
            ingredients: lines
                .into_iter()
                .map(|line| RecipeIngredientDto {
                    id: line.id,
                    name: names.get(&line.ingredient_id).cloned().unwrap_or_default(),
                    amount: line.amount,
                    unit: line.unit,
                    notes: line.notes,
                })
                .collect(),
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        })
    }

    /// Apply a partial update, keeping the previous state as a version
    pub async fn update(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        id: Uuid,
        req: &UpdateRecipeRequest,
    ) -> Result<RecipeResponse, ApiError> {
        validate_update_recipe(req).map_err(ApiError::Validation)?;
        let difficulty = parse_difficulty(req.difficulty.as_deref())?;

        let current = RecipeRepository::find_by_id(db, user_id, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to update recipe"))?
            .ok_or_else(not_found)?;

        let snapshot = CreateRecipeVersion::snapshot(&current, user_id);
        RecipeVersionRepository::create(db, &snapshot)
            .await
            .map_err(ApiError::baas_ctx("Failed to save recipe version"))?;

        let patch = RecipePatch {
            title: req.title.as_deref().map(|t| t.trim().to_string()),
            description: req.description.clone(),
            instructions: req.instructions.clone(),
            cooking_time: req.cooking_time,
            difficulty,
            calories: req.calories,
            protein: req.protein,
            carbs: req.carbs,
            fat: req.fat,
            version: current.version.unwrap_or(1) + 1,
            updated_at: Utc::now(),
        };
        let updated = match RecipeRepository::update(db, user_id, id, &patch).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(not_found()),
            Err(e) => Err(ApiError::baas("Failed to update recipe", e)),
        };
        if let Err(e) = updated {
            // the snapshot belongs to an update that never happened
            if let Err(cleanup) = RecipeVersionRepository::delete(db, id, snapshot.version).await {
                error!(recipe_id = %id, error = %cleanup, "Failed to remove recipe version snapshot");
            }
            return Err(e);
        }

        if let Some(lines) = &req.ingredients {
            Self::replace_ingredients(db, id, lines).await?;
        }

        Self::invalidate_after_write(cache, user_id).await;
        info!(%user_id, recipe_id = %id, version = patch.version, "Recipe updated");

        Self::get(db, user_id, id).await
    }

    /// Soft delete
    pub async fn delete(
        db: &RestClient,
        cache: &ResponseCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), ApiError> {
        let deleted = RecipeRepository::deactivate(db, user_id, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to delete recipe"))?;
        if !deleted {
            return Err(not_found());
        }

        Self::invalidate_after_write(cache, user_id).await;
        info!(%user_id, recipe_id = %id, "Recipe deleted");
        Ok(())
    }

    /// Stored versions, newest first
    pub async fn versions(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<RecipeVersionsResponse, ApiError> {
        RecipeRepository::find_by_id(db, user_id, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch recipe versions"))?
            .ok_or_else(not_found)?;

        let versions = RecipeVersionRepository::list_by_recipe(db, id)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch recipe versions"))?;

        Ok(RecipeVersionsResponse {
            data: versions.into_iter().map(Into::into).collect(),
        })
    }

    async fn ingredient_names(
        db: &RestClient,
        lines: &[RecipeIngredientRecord],
    ) -> Result<HashMap<Uuid, String>, ApiError> {
        let mut ids: Vec<Uuid> = lines.iter().map(|l| l.ingredient_id).collect();
        ids.sort();
        ids.dedup();

        let names = IngredientRepository::names_by_ids(db, &ids)
            .await
            .map_err(ApiError::baas_ctx("Failed to fetch ingredient names"))?;
        Ok(names.into_iter().collect())
    }

    /// Swap the recipe's ingredient lines, putting the old ones back when
    /// the new ones cannot be inserted
    async fn replace_ingredients(
        db: &RestClient,
        recipe_id: Uuid,
        lines: &[CreateRecipeIngredient],
    ) -> Result<(), ApiError> {
        let rows = ingredient_rows(recipe_id, lines)?;

        let previous = RecipeIngredientRepository::list_by_recipe(db, recipe_id)
            .await
            .map_err(ApiError::baas_ctx("Failed to update recipe ingredients"))?;
        RecipeIngredientRepository::delete_by_recipe(db, recipe_id)
            .await
            .map_err(ApiError::baas_ctx("Failed to update recipe ingredients"))?;

        if let Err(e) = RecipeIngredientRepository::insert_many(db, &rows).await {
            let restore: Vec<CreateRecipeIngredientRow> = previous.iter().map(Into::into).collect();
            match RecipeIngredientRepository::insert_many(db, &restore).await {
                Ok(_) => warn!(%recipe_id, "Restored previous recipe ingredients"),
                Err(restore_err) => error!(
                    %recipe_id,
                    error = %restore_err,
                    "Failed to restore recipe ingredients"
                ),
            }
            return Err(ApiError::baas("Failed to update recipe ingredients", e));
        }
        Ok(())
    }

    /// Lists, usage counts and dashboard figures all depend on recipes
    async fn invalidate_after_write(cache: &ResponseCache, user_id: Uuid) {
        cache.invalidate(ns::RECIPES, user_id).await;
        cache.invalidate(ns::INGREDIENTS, user_id).await;
        cache.invalidate(ns::DASHBOARD, user_id).await;
    }
}
