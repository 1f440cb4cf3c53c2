//! Ingredient repository

use crate::baas::{escape_like, BaasError, Fetched, RestClient};
use chrono::{DateTime, Utc};
use healthymeal_shared::types::{IngredientListQuery, IngredientResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

const TABLE: &str = "ingredients";
const COLUMNS: &str = "id,name,is_active,created_at,updated_at";

/// Ingredient row
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl From<IngredientRecord> for IngredientResponse {
    fn from(r: IngredientRecord) -> Self {
        IngredientResponse {
            id: r.id,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Input for creating an ingredient
#[derive(Debug, Clone, Serialize)]
pub struct CreateIngredient {
    pub user_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreateIngredient {
    pub fn new(user_id: Uuid, name: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            name: name.trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Ingredient repository for BaaS operations
pub struct IngredientRepository;

impl IngredientRepository {
    /// One page of the user's active ingredients, with the total count
    pub async fn list_page(
        db: &RestClient,
        user_id: Uuid,
        query: &IngredientListQuery,
    ) -> Result<Fetched<IngredientRecord>, BaasError> {
        let offset = query.offset();
        let mut q = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("is_active", true)
            .eq("user_id", user_id);
        if !query.search.is_empty() {
            q = q.ilike("name", &format!("*{}*", escape_like(&query.search)));
        }
        q.order("name", true)
            .range(offset, offset + query.limit as u64 - 1)
            .count_exact()
            .fetch()
            .await
    }

    pub async fn find_by_id(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<IngredientRecord>, BaasError> {
        db.from(TABLE)
            .select(COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .fetch_optional()
            .await
    }

    /// Exact name match among all of the user's ingredients, active or not
    pub async fn find_by_name(
        db: &RestClient,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<IngredientRecord>, BaasError> {
        db.from(TABLE)
            .select(COLUMNS)
            .eq("name", name)
            .eq("user_id", user_id)
            .order("is_active", false)
            .fetch_optional()
            .await
    }

    /// Exact name match on any of the user's ingredients other than `id`
    pub async fn find_other_by_name(
        db: &RestClient,
        user_id: Uuid,
        name: &str,
        id: Uuid,
    ) -> Result<Option<IngredientRecord>, BaasError> {
        db.from(TABLE)
            .select(COLUMNS)
            .eq("name", name)
            .eq("user_id", user_id)
            .neq("id", id)
            .fetch_optional()
            .await
    }

    /// Case-insensitive name match, active ingredients first
    pub async fn find_by_name_ci(
        db: &RestClient,
        user_id: Uuid,
        name: &str,
    ) -> Result<Option<IngredientRecord>, BaasError> {
        db.from(TABLE)
            .select(COLUMNS)
            .ilike("name", &escape_like(name))
            .eq("user_id", user_id)
            .order("is_active", false)
            .fetch_optional()
            .await
    }

    /// `(id, name)` pairs for the given ids
    pub async fn names_by_ids(
        db: &RestClient,
        ids: &[Uuid],
    ) -> Result<Vec<(Uuid, String)>, BaasError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Deserialize)]
        struct NameRow {
            id: Uuid,
            name: String,
        }

        let fetched: Fetched<NameRow> = db
            .from(TABLE)
            .select("id,name")
            .in_list("id", ids)
            .fetch()
            .await?;
        Ok(fetched.rows.into_iter().map(|r| (r.id, r.name)).collect())
    }

    pub async fn create(
        db: &RestClient,
        input: &CreateIngredient,
    ) -> Result<IngredientRecord, BaasError> {
        db.from(TABLE).select(COLUMNS).insert_one(input).await
    }

    pub async fn rename(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<Option<IngredientRecord>, BaasError> {
        let rows: Vec<IngredientRecord> = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .update(&json!({ "name": name, "updated_at": Utc::now() }))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Bring back a soft-deleted ingredient
    pub async fn reactivate(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<IngredientRecord, BaasError> {
        let rows: Vec<IngredientRecord> = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .update(&json!({ "is_active": true, "updated_at": Utc::now() }))
            .await?;
        rows.into_iter().next().ok_or(BaasError::EmptyResult)
    }

    /// Soft delete; returns false when nothing matched
    pub async fn deactivate(db: &RestClient, user_id: Uuid, id: Uuid) -> Result<bool, BaasError> {
        let rows: Vec<IngredientRecord> = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .eq("is_active", true)
            .update(&json!({ "is_active": false, "updated_at": Utc::now() }))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Hard delete, used to undo ingredients created by a failed write
    pub async fn delete_many(db: &RestClient, user_id: Uuid, ids: &[Uuid]) -> Result<(), BaasError> {
        if ids.is_empty() {
            return Ok(());
        }
        db.from(TABLE)
            .in_list("id", ids)
            .eq("user_id", user_id)
            .delete()
            .await
    }
}
