//! AI recipe generation
//!
//! Generates a recipe through the LLM gateway and stores it in the user's
//! collection. Stored preferences fill in whatever the request leaves out.
//! Persisting is a sequence of single-row writes; when one fails, every row
//! written by the call is removed again.

use crate::baas::{BaasError, RestClient};
use crate::cache::{ns, ResponseCache};
use crate::error::ApiError;
use crate::llm::OpenRouterClient;
use crate::rate_limit::FixedWindowLimiter;
use crate::repositories::{
    CreateIngredient, CreateRecipe, CreateRecipeIngredientRow, IngredientRepository,
    PreferencesRepository, RecipeIngredientRepository, RecipeRepository,
};
use chrono::Utc;
use healthymeal_shared::text::parse_leading_amount;
use healthymeal_shared::types::{
    GenerateRecipeResponse, GeneratedRecipe, GenerationPreferences, MacroTargets,
    RecipeGenerationRequest, UserPreferencesResponse,
};
use healthymeal_shared::validation::validate_generation_prompt;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Rows written while saving one generated recipe
#[derive(Debug, Default)]
struct SavedRows {
    recipe_id: Option<Uuid>,
    created_ingredients: Vec<Uuid>,
    reactivated_ingredients: Vec<Uuid>,
}

/// Fill unset request preferences from the stored ones
pub fn merge_preferences(
    requested: Option<GenerationPreferences>,
    stored: Option<&UserPreferencesResponse>,
) -> Option<GenerationPreferences> {
    let Some(stored) = stored else {
        return requested;
    };
    let mut merged = requested.unwrap_or_default();

    if merged.calories.is_none() {
        merged.calories = stored.daily_calories.filter(|c| *c > 0);
    }
    if merged.allergens.is_none() {
        let allergens = stored.allergen_list();
        if !allergens.is_empty() {
            merged.allergens = Some(allergens);
        }
    }
    if merged.macros.is_none() {
        let macros = MacroTargets {
            protein: stored.protein_percentage,
            carbs: stored.carbs_percentage,
            fat: stored.fat_percentage,
        };
        if !macros.is_empty() {
            merged.macros = Some(macros);
        }
    }

    Some(merged)
}

/// Generation service
pub struct GenerationService;

impl GenerationService {
    /// Generate a recipe and save it with its ingredients
    pub async fn generate_and_save(
        db: &RestClient,
        cache: &ResponseCache,
        llm: &OpenRouterClient,
        limiter: &FixedWindowLimiter,
        user_id: Uuid,
        req: RecipeGenerationRequest,
    ) -> Result<GenerateRecipeResponse, ApiError> {
        validate_generation_prompt(&req.prompt).map_err(ApiError::Validation)?;

        limiter
            .check(&user_id.to_string())
            .map_err(|limited| ApiError::TooManyRequests {
                message: "Too many generation requests. Please try again later.".to_string(),
                retry_after_secs: limited.retry_after_secs(),
            })?;

        let stored = match PreferencesRepository::find_by_user(db, user_id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(%user_id, error = %e, "Generating without stored preferences");
                None
            }
        };
        let request = RecipeGenerationRequest {
            preferences: merge_preferences(req.preferences, stored.as_ref()),
            prompt: req.prompt,
        };

        let recipe = llm.generate_recipe(&request).await?;

        let mut saved = SavedRows::default();
        if let Err(e) = Self::save(db, user_id, &recipe, &mut saved).await {
            Self::rollback(db, user_id, &saved).await;
            return Err(ApiError::baas("Failed to save generated recipe", e));
        }
        let Some(recipe_id) = saved.recipe_id else {
            return Err(ApiError::Internal(anyhow::anyhow!(
                "generated recipe saved without an id"
            )));
        };

        cache.invalidate(ns::RECIPES, user_id).await;
        cache.invalidate(ns::INGREDIENTS, user_id).await;
        cache.invalidate(ns::DASHBOARD, user_id).await;

        metrics::counter!("healthymeal_recipes_generated_total").increment(1);
        info!(
            %user_id,
            %recipe_id,
            new_ingredients = saved.created_ingredients.len(),
            "Generated recipe saved"
        );

        Ok(GenerateRecipeResponse {
            recipe,
            saved_recipe_id: recipe_id,
        })
    }

    async fn save(
        db: &RestClient,
        user_id: Uuid,
        recipe: &GeneratedRecipe,
        saved: &mut SavedRows,
    ) -> Result<(), BaasError> {
        let instructions = serde_json::to_string(&recipe.instructions)
            .map_err(|e| BaasError::Decode(e.to_string()))?;
        let now = Utc::now();

        let row = RecipeRepository::create(
            db,
            &CreateRecipe {
                user_id,
                title: recipe.title.trim().to_string(),
                description: Some(recipe.description.clone()),
                instructions,
                cooking_time: recipe.cooking_time,
                difficulty: recipe.difficulty,
                calories: Some(recipe.nutrition.calories),
                protein: Some(recipe.nutrition.protein),
                carbs: Some(recipe.nutrition.carbs),
                fat: Some(recipe.nutrition.fat),
                version: 1,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;
        saved.recipe_id = Some(row.id);

        for item in &recipe.ingredients {
            let name = item.name.trim();
            if name.is_empty() {
                continue;
            }

            let ingredient_id = match IngredientRepository::find_by_name_ci(db, user_id, name).await? {
                Some(existing) if existing.is_active => existing.id,
                Some(inactive) => {
                    IngredientRepository::reactivate(db, user_id, inactive.id).await?;
                    saved.reactivated_ingredients.push(inactive.id);
                    inactive.id
                }
                None => {
                    let created =
                        IngredientRepository::create(db, &CreateIngredient::new(user_id, name))
                            .await?;
                    saved.created_ingredients.push(created.id);
                    created.id
                }
            };

            RecipeIngredientRepository::insert_one(
                db,
                &CreateRecipeIngredientRow {
                    recipe_id: row.id,
                    ingredient_id,
                    amount: parse_leading_amount(&item.amount),
                    unit: item.unit.trim().to_string(),
                    notes: None,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await?;
        }

        Ok(())
    }

    async fn rollback(db: &RestClient, user_id: Uuid, saved: &SavedRows) {
        if let Some(recipe_id) = saved.recipe_id {
            if let Err(e) = RecipeIngredientRepository::delete_by_recipe(db, recipe_id).await {
                error!(%recipe_id, error = %e, "Rollback of recipe ingredients failed");
            }
            if let Err(e) = RecipeRepository::delete(db, user_id, recipe_id).await {
                error!(%recipe_id, error = %e, "Rollback of recipe failed");
            }
        }
        if let Err(e) = IngredientRepository::delete_many(db, user_id, &saved.created_ingredients).await {
            error!(%user_id, error = %e, "Rollback of created ingredients failed");
        }
        for id in &saved.reactivated_ingredients {
            if let Err(e) = IngredientRepository::deactivate(db, user_id, *id).await {
                error!(ingredient_id = %id, error = %e, "Rollback of reactivated ingredient failed");
            }
        }
        warn!(%user_id, recipe_id = ?saved.recipe_id, "Generated recipe rolled back");
    }
}
