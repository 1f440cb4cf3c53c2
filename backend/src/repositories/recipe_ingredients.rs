//! Recipe ingredient join rows

use crate::baas::{BaasError, Fetched, RestClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

const TABLE: &str = "recipe_ingredients";
const COLUMNS: &str = "id,recipe_id,ingredient_id,amount,unit,notes";
/// Inner join on the owning recipe so only active recipes count as usage
const ACTIVE_USAGE: &str = "ingredient_id,recipes!inner(is_active)";

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeIngredientRecord {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: f64,
    pub unit: String,
    pub notes: Option<String>,
}

/// Input for one join row
#[derive(Debug, Clone, Serialize)]
pub struct CreateRecipeIngredientRow {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: f64,
    pub unit: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&RecipeIngredientRecord> for CreateRecipeIngredientRow {
    fn from(r: &RecipeIngredientRecord) -> Self {
        let now = Utc::now();
        Self {
            recipe_id: r.recipe_id,
            ingredient_id: r.ingredient_id,
            amount: r.amount,
            unit: r.unit.clone(),
            notes: r.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IngredientIdRow {
    ingredient_id: Uuid,
}

/// Recipe ingredient repository for BaaS operations
pub struct RecipeIngredientRepository;

impl RecipeIngredientRepository {
    /// Insert all rows in one request
    pub async fn insert_many(
        db: &RestClient,
        rows: &[CreateRecipeIngredientRow],
    ) -> Result<Vec<RecipeIngredientRecord>, BaasError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        db.from(TABLE).select(COLUMNS).insert(rows).await
    }

    pub async fn insert_one(
        db: &RestClient,
        row: &CreateRecipeIngredientRow,
    ) -> Result<RecipeIngredientRecord, BaasError> {
        db.from(TABLE).select(COLUMNS).insert_one(row).await
    }

    pub async fn list_by_recipe(
        db: &RestClient,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeIngredientRecord>, BaasError> {
        let fetched = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("recipe_id", recipe_id)
            .fetch()
            .await?;
        Ok(fetched.rows)
    }

    pub async fn delete_by_recipe(db: &RestClient, recipe_id: Uuid) -> Result<(), BaasError> {
        db.from(TABLE).eq("recipe_id", recipe_id).delete().await
    }

    /// Ingredient ids referenced by the given recipes, with repeats
    pub async fn ingredient_ids_for_recipes(
        db: &RestClient,
        recipe_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, BaasError> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        let fetched: Fetched<IngredientIdRow> = db
            .from(TABLE)
            .select("ingredient_id")
            .in_list("recipe_id", recipe_ids)
            .fetch()
            .await?;
        Ok(fetched.rows.into_iter().map(|r| r.ingredient_id).collect())
    }

    /// How many active recipes' rows reference each of `ingredient_ids`
    pub async fn usage_counts(
        db: &RestClient,
        ingredient_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, u64>, BaasError> {
        let mut counts = HashMap::new();
        if ingredient_ids.is_empty() {
            return Ok(counts);
        }
        let fetched: Fetched<IngredientIdRow> = db
            .from(TABLE)
            .select(ACTIVE_USAGE)
            .in_list("ingredient_id", ingredient_ids)
            .eq("recipes.is_active", true)
            .fetch()
            .await?;
        for row in fetched.rows {
            *counts.entry(row.ingredient_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Rows of active recipes that use `ingredient_id`
    pub async fn count_for_ingredient(
        db: &RestClient,
        ingredient_id: Uuid,
    ) -> Result<u64, BaasError> {
        db.from(TABLE)
            .select(ACTIVE_USAGE)
            .eq("ingredient_id", ingredient_id)
            .eq("recipes.is_active", true)
            .count()
            .await
    }
}
