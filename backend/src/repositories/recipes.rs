//! Recipe repository
//!
//! Detail reads embed the join rows and ingredient names in one request:
//! `recipe_ingredients(id,amount,unit,notes,ingredient:ingredients(name))`.

use crate::baas::{BaasError, Fetched, RestClient};
use chrono::{DateTime, Utc};
use healthymeal_shared::models::Difficulty;
use healthymeal_shared::types::RecipeListQuery;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

const TABLE: &str = "recipes";
const LIST_COLUMNS: &str =
    "id,title,description,cooking_time,difficulty,calories,created_at";
const ROW_COLUMNS: &str = "id,user_id,title,description,instructions,cooking_time,difficulty,\
calories,protein,carbs,fat,version,is_active,created_at,updated_at";
const DETAIL_COLUMNS: &str = "id,user_id,title,description,instructions,cooking_time,difficulty,\
calories,protein,carbs,fat,version,is_active,created_at,updated_at,\
recipe_ingredients(id,amount,unit,notes,ingredient:ingredients(name))";

/// Row shown in recipe lists
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSummaryRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Full recipe row
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub version: Option<i32>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedIngredientName {
    pub name: String,
}

/// Join row as embedded in a recipe detail read
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedRecipeIngredient {
    pub id: Uuid,
    pub amount: f64,
    pub unit: String,
    pub notes: Option<String>,
    pub ingredient: Option<EmbeddedIngredientName>,
}

/// Recipe with its ingredients
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDetailRecord {
    #[serde(flatten)]
    pub recipe: RecipeRecord,
    #[serde(default)]
    pub recipe_ingredients: Vec<EmbeddedRecipeIngredient>,
}

/// Input for creating a recipe
#[derive(Debug, Clone, Serialize)]
pub struct CreateRecipe {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub version: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns to change; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

/// Recipe repository for BaaS operations
pub struct RecipeRepository;

impl RecipeRepository {
    /// One page of the user's active recipes, with the total count
    pub async fn list_page(
        db: &RestClient,
        user_id: Uuid,
        query: &RecipeListQuery,
    ) -> Result<Fetched<RecipeSummaryRecord>, BaasError> {
        let offset = query.offset();
        db.from(TABLE)
            .select(LIST_COLUMNS)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .order(query.sort.column(), query.order.is_ascending())
            .range(offset, offset + query.limit as u64 - 1)
            .count_exact()
            .fetch()
            .await
    }

    /// Active recipe owned by `user_id`
    pub async fn find_by_id(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RecipeRecord>, BaasError> {
        db.from(TABLE)
            .select(ROW_COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .fetch_optional()
            .await
    }

    /// Active recipe with embedded ingredients
    pub async fn find_detail(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RecipeDetailRecord>, BaasError> {
        db.from(TABLE)
            .select(DETAIL_COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .fetch_optional()
            .await
    }

    pub async fn create(db: &RestClient, input: &CreateRecipe) -> Result<RecipeRecord, BaasError> {
        db.from(TABLE).select(ROW_COLUMNS).insert_one(input).await
    }

    pub async fn update(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
        patch: &RecipePatch,
    ) -> Result<Option<RecipeRecord>, BaasError> {
        let rows: Vec<RecipeRecord> = db
            .from(TABLE)
            .select(ROW_COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .update(patch)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Soft delete; returns false when nothing matched
    pub async fn deactivate(db: &RestClient, user_id: Uuid, id: Uuid) -> Result<bool, BaasError> {
        let rows: Vec<IdRow> = db
            .from(TABLE)
            .select("id")
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .update(&json!({ "is_active": false, "updated_at": Utc::now() }))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Hard delete, used to undo a failed multi-step write
    pub async fn delete(db: &RestClient, user_id: Uuid, id: Uuid) -> Result<(), BaasError> {
        db.from(TABLE)
            .eq("id", id)
            .eq("user_id", user_id)
            .delete()
            .await
    }

    pub async fn active_ids(db: &RestClient, user_id: Uuid) -> Result<Vec<Uuid>, BaasError> {
        let fetched: Fetched<IdRow> = db
            .from(TABLE)
            .select("id")
            .eq("user_id", user_id)
            .eq("is_active", true)
            .fetch()
            .await?;
        Ok(fetched.rows.into_iter().map(|r| r.id).collect())
    }

    /// Creation time of the user's earliest active recipe
    pub async fn first_created_at(
        db: &RestClient,
        user_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, BaasError> {
        let row: Option<CreatedAtRow> = db
            .from(TABLE)
            .select("created_at")
            .eq("user_id", user_id)
            .eq("is_active", true)
            .order("created_at", true)
            .fetch_optional()
            .await?;
        Ok(row.map(|r| r.created_at))
    }

    /// Most recently created active recipes
    pub async fn recent(
        db: &RestClient,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<RecipeSummaryRecord>, BaasError> {
        let fetched = db
            .from(TABLE)
            .select(LIST_COLUMNS)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .order("created_at", false)
            .limit(limit)
            .fetch()
            .await?;
        Ok(fetched.rows)
    }
}
