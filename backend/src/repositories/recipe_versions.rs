//! Recipe version snapshots

use super::recipes::RecipeRecord;
use crate::baas::{BaasError, RestClient};
use chrono::{DateTime, Utc};
use healthymeal_shared::models::Difficulty;
use healthymeal_shared::types::RecipeVersionListItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TABLE: &str = "recipe_versions";
const COLUMNS: &str = "id,version,title,description,instructions,cooking_time,difficulty,\
calories,protein,carbs,fat,created_at";

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeVersionRecord {
    pub id: Uuid,
    pub version: i32,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: String,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<RecipeVersionRecord> for RecipeVersionListItem {
    fn from(r: RecipeVersionRecord) -> Self {
        RecipeVersionListItem {
            id: r.id,
            version: r.version,
            title: r.title,
            description: r.description,
            instructions: r.instructions,
            cooking_time: r.cooking_time,
            difficulty: r.difficulty,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
            created_at: r.created_at,
        }
    }
}

/// Snapshot of a recipe row before it changes
#[derive(Debug, Clone, Serialize)]
pub struct CreateRecipeVersion {
    pub recipe_id: Uuid,
    pub version: i32,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl CreateRecipeVersion {
    pub fn snapshot(recipe: &RecipeRecord, created_by: Uuid) -> Self {
        Self {
            recipe_id: recipe.id,
            version: recipe.version.unwrap_or(1),
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            instructions: recipe.instructions.clone(),
            cooking_time: recipe.cooking_time,
            difficulty: recipe.difficulty,
            calories: recipe.calories,
            protein: recipe.protein,
            carbs: recipe.carbs,
            fat: recipe.fat,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// Recipe version repository for BaaS operations
pub struct RecipeVersionRepository;

impl RecipeVersionRepository {
    pub async fn create(db: &RestClient, input: &CreateRecipeVersion) -> Result<(), BaasError> {
        db.from(TABLE).insert_silent(input).await
    }

    /// Remove the snapshot of `version`, used when the update it preceded fails
    pub async fn delete(db: &RestClient, recipe_id: Uuid, version: i32) -> Result<(), BaasError> {
        db.from(TABLE)
            .eq("recipe_id", recipe_id)
            .eq("version", version)
            .delete()
            .await
    }

    /// Versions of a recipe, newest first
    pub async fn list_by_recipe(
        db: &RestClient,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeVersionRecord>, BaasError> {
        let fetched = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("recipe_id", recipe_id)
            .order("version", false)
            .fetch()
            .await?;
        Ok(fetched.rows)
    }
}
