//! Field translations for recipes and ingredients

use crate::baas::RestClient;
use crate::error::ApiError;
use crate::repositories::TranslationRepository;
use healthymeal_shared::types::{TranslationParams, TranslationResponse};
use uuid::Uuid;
use validator::Validate;

/// Tables that carry translations
const TRANSLATABLE_TABLES: [&str; 2] = ["recipes", "ingredients"];

pub struct TranslationService;

impl TranslationService {
    pub async fn get(
        db: &RestClient,
        params: &TranslationParams,
    ) -> Result<TranslationResponse, ApiError> {
        params
            .validate()
            .map_err(|e| ApiError::Validation(format!("Invalid translation parameters: {}", e)))?;

        if !TRANSLATABLE_TABLES.contains(&params.table_name.as_str()) {
            return Err(ApiError::Validation(format!(
                "Invalid table name. Must be one of: {}",
                TRANSLATABLE_TABLES.join(", ")
            )));
        }
        let record_id = Uuid::parse_str(&params.record_id)
            .map_err(|_| ApiError::Validation("Invalid record ID format".to_string()))?;

        let data = TranslationRepository::list(
            db,
            &params.table_name,
            record_id,
            &params.language_code,
        )
        .await
        .map_err(ApiError::baas_ctx("Failed to fetch translations"))?;

        Ok(TranslationResponse { data })
    }
}
