//! User preferences and their change history

use crate::baas::{BaasError, RestClient};
use chrono::{DateTime, Utc};
use healthymeal_shared::models::MeasurementSystem;
use healthymeal_shared::types::UserPreferencesResponse;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

const TABLE: &str = "user_preferences";
const HISTORY_TABLE: &str = "user_preferences_history";
const COLUMNS: &str = "id,daily_calories,protein_percentage,carbs_percentage,fat_percentage,\
allergens,micro_nutrients,measurement_system";

/// Preference columns that a write may set
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreferencesFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calories: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub micro_nutrients: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_system: Option<MeasurementSystem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePreferences {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub fields: PreferencesFields,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferencesPatch {
    #[serde(flatten)]
    pub fields: PreferencesFields,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePreferencesHistory {
    pub user_preferences_id: Uuid,
    pub changed_by: Uuid,
    pub changes: Value,
    pub changed_at: DateTime<Utc>,
}

/// Preferences repository for BaaS operations
pub struct PreferencesRepository;

impl PreferencesRepository {
    pub async fn find_by_user(
        db: &RestClient,
        user_id: Uuid,
    ) -> Result<Option<UserPreferencesResponse>, BaasError> {
        db.from(TABLE)
            .select(COLUMNS)
            .eq("user_id", user_id)
            .fetch_optional()
            .await
    }

    pub async fn create(
        db: &RestClient,
        input: &CreatePreferences,
    ) -> Result<UserPreferencesResponse, BaasError> {
        db.from(TABLE).select(COLUMNS).insert_one(input).await
    }

    pub async fn update(
        db: &RestClient,
        user_id: Uuid,
        id: Uuid,
        patch: &PreferencesPatch,
    ) -> Result<UserPreferencesResponse, BaasError> {
        let rows: Vec<UserPreferencesResponse> = db
            .from(TABLE)
            .select(COLUMNS)
            .eq("id", id)
            .eq("user_id", user_id)
            .update(patch)
            .await?;
        rows.into_iter().next().ok_or(BaasError::EmptyResult)
    }

    pub async fn add_history(
        db: &RestClient,
        entry: &CreatePreferencesHistory,
    ) -> Result<(), BaasError> {
        db.from(HISTORY_TABLE).insert_silent(entry).await
    }
}
