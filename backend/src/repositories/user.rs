//! User profile repository
//!
//! The auth provider owns credentials; this table only mirrors the profile.

use crate::baas::{BaasError, RestClient};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

const TABLE: &str = "users";

/// Input for creating a profile row
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserProfile {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl CreateUserProfile {
    pub fn new(id: Uuid, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// User repository for BaaS operations
pub struct UserRepository;

impl UserRepository {
    pub async fn create(db: &RestClient, input: &CreateUserProfile) -> Result<(), BaasError> {
        db.from(TABLE).insert_silent(input).await
    }

    /// Record a successful sign-in
    pub async fn touch_last_login(
        db: &RestClient,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), BaasError> {
        let _: Vec<serde_json::Value> = db
            .from(TABLE)
            .select("id")
            .eq("id", user_id)
            .update(&json!({ "last_login_at": at, "updated_at": at }))
            .await?;
        Ok(())
    }
}
