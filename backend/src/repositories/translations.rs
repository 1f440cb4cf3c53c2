//! Record translations

use crate::baas::{BaasError, RestClient};
use healthymeal_shared::types::TranslationItem;
use uuid::Uuid;

/// Translation repository for BaaS operations
pub struct TranslationRepository;

impl TranslationRepository {
    pub async fn list(
        db: &RestClient,
        table_name: &str,
        record_id: Uuid,
        language_code: &str,
    ) -> Result<Vec<TranslationItem>, BaasError> {
        let fetched = db
            .from("translations")
            .select("field_name,translated_text")
            .eq("table_name", table_name)
            .eq("record_id", record_id)
            .eq("language_code", language_code)
            .fetch()
            .await?;
        Ok(fetched.rows)
    }
}
