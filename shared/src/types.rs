//! API request and response types

use crate::errors::ErrorCode;
use crate::models::{ActivityType, Difficulty, MeasurementSystem, RecipeSort, SortOrder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Common
// ============================================================================

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

// ============================================================================
// Authentication
// ============================================================================

/// Registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Identity part of an auth response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUserInfo {
    pub id: Uuid,
    pub email: String,
}

/// Tokens of an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

/// Registration response
///
/// `session` is absent when the BaaS requires email confirmation first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user: AuthUserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionTokens>,
}

/// Login / refresh response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: AuthUserInfo,
    pub session: SessionTokens,
}

/// Current user as reported by the BaaS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

// ============================================================================
// User Preferences
// ============================================================================

/// Stored dietary preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferencesResponse {
    pub id: Uuid,
    pub daily_calories: Option<i32>,
    pub protein_percentage: Option<f64>,
    pub carbs_percentage: Option<f64>,
    pub fat_percentage: Option<f64>,
    pub allergens: Option<serde_json::Value>,
    pub micro_nutrients: Option<serde_json::Value>,
    pub measurement_system: Option<MeasurementSystem>,
}

impl UserPreferencesResponse {
    /// Allergens as plain strings; non-string entries are ignored
    pub fn allergen_list(&self) -> Vec<String> {
        match &self.allergens {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Partial preferences update; omitted fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserPreferencesRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_calories: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_nutrients: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_system: Option<String>,
}

// ============================================================================
// Recipes
// ============================================================================

/// Raw recipe list query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Recipe list parameters after validation with defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecipeListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: RecipeSort,
    pub order: SortOrder,
}

impl RecipeListQuery {
    /// Zero-based offset of the first row on this page
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// Recipe row in list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeListItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

pub type RecipeListResponse = ListResponse<RecipeListItem>;

/// Ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientDto {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub notes: Option<String>,
}

/// Full recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    /// Instructions split into display steps
    pub steps: Vec<String>,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub version: i32,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Ingredient line of a create/update request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRecipeIngredient {
    #[serde(default)]
    pub ingredient_id: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create recipe request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRecipeRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub cooking_time: Option<i32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<CreateRecipeIngredient>,
}

/// Partial recipe update; `ingredients`, when present, replaces the list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecipeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<i32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub ingredients: Option<Vec<CreateRecipeIngredient>>,
}

/// Historical snapshot of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeVersionListItem {
    pub id: Uuid,
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
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeVersionsResponse {
    pub data: Vec<RecipeVersionListItem>,
}

// ============================================================================
// Ingredients
// ============================================================================

/// Raw ingredient list query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// Ingredient list parameters after validation with defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: String,
}

impl IngredientListQuery {
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientListItem {
    pub id: Uuid,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Number of recipe lines referencing this ingredient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u64>,
}

pub type IngredientListResponse = ListResponse<IngredientListItem>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIngredientRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIngredientRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Translations
// ============================================================================

/// Translation lookup parameters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TranslationParams {
    #[validate(length(min = 1, max = 64))]
    pub table_name: String,
    #[validate(length(equal = 36))]
    pub record_id: String,
    #[validate(length(min = 2, max = 10))]
    pub language_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub field_name: String,
    pub translated_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub data: Vec<TranslationItem>,
}

// ============================================================================
// Dashboard
// ============================================================================

/// Dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_recipes: u64,
    /// Distinct ingredients referenced by the user's recipes
    pub total_ingredients: u64,
    /// Whole days since the first recipe
    pub total_active_days: i64,
}

/// Recent activity entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    /// Human readable age, e.g. "3 hours ago"
    pub relative_time: String,
}

// ============================================================================
// Recipe Generation
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

impl MacroTargets {
    pub fn is_empty(&self) -> bool {
        self.protein.is_none() && self.carbs.is_none() && self.fat.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<MacroTargets>,
}

/// Free-text recipe generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeGenerationRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub preferences: Option<GenerationPreferences>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedIngredient {
    pub name: String,
    /// Quantity as written by the model, e.g. "2" or "1/4"
    #[serde(deserialize_with = "lenient::string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratedNutrition {
    #[serde(default, deserialize_with = "lenient::number")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fat: f64,
}

/// Recipe as produced by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<GeneratedIngredient>,
    pub instructions: Vec<String>,
    pub nutrition: GeneratedNutrition,
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub cooking_time: Option<i32>,
    #[serde(default, deserialize_with = "lenient::difficulty")]
    pub difficulty: Option<Difficulty>,
}

/// Envelope the model is asked to produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRecipeEnvelope {
    pub recipe: GeneratedRecipe,
}

/// Generation result after the recipe was stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRecipeResponse {
    pub recipe: GeneratedRecipe,
    pub saved_recipe_id: Uuid,
}

/// Deserializers tolerant of the shapes language models actually emit
mod lenient {
    use crate::models::Difficulty;
    use crate::text::parse_leading_amount;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => parse_leading_amount(&s),
            _ => 0.0,
        })
    }

    pub fn minutes<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().map(|m| m.round() as i32),
            Value::String(s) => {
                let m = parse_leading_amount(&s);
                (m > 0.0).then(|| m.round() as i32)
            }
            _ => None,
        })
    }

    pub fn difficulty<'de, D>(deserializer: D) -> Result<Option<Difficulty>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s.trim().to_lowercase().parse().ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_recipe_accepts_numeric_amounts_and_loose_fields() {
        let value = json!({
            "title": "Salad",
            "description": "Fresh",
            "ingredients": [
                {"name": "Tomato", "amount": 2, "unit": "pcs"},
                {"name": "Oil", "amount": "1.5", "unit": "tbsp"}
            ],
            "instructions": ["Chop", "Mix"],
            "nutrition": {"calories": "320 kcal", "protein": 4, "carbs": 12.5, "fat": 20},
            "cooking_time": 10.4,
            "difficulty": "Easy"
        });

        let recipe: GeneratedRecipe = serde_json::from_value(value).unwrap();
        assert_eq!(recipe.ingredients[0].amount, "2");
        assert_eq!(recipe.ingredients[1].amount, "1.5");
        assert_eq!(recipe.nutrition.calories, 320.0);
        assert_eq!(recipe.cooking_time, Some(10));
        assert_eq!(recipe.difficulty, Some(Difficulty::Easy));
    }

    #[test]
    fn test_generated_recipe_unknown_difficulty_is_none() {
        let value = json!({
            "title": "Soup",
            "description": "Warm",
            "ingredients": [],
            "instructions": [],
            "nutrition": {},
            "difficulty": "legendary"
        });

        let recipe: GeneratedRecipe = serde_json::from_value(value).unwrap();
        assert_eq!(recipe.difficulty, None);
        assert_eq!(recipe.cooking_time, None);
    }

    #[test]
    fn test_allergen_list_ignores_non_strings() {
        let prefs = UserPreferencesResponse {
            id: Uuid::nil(),
            daily_calories: None,
            protein_percentage: None,
            carbs_percentage: None,
            fat_percentage: None,
            allergens: Some(json!(["peanuts", 3, "gluten", null])),
            micro_nutrients: None,
            measurement_system: None,
        };
        assert_eq!(prefs.allergen_list(), vec!["peanuts", "gluten"]);
    }

    #[test]
    fn test_update_preferences_skips_absent_fields() {
        let req = UpdateUserPreferencesRequest {
            daily_calories: Some(2000),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"daily_calories": 2000}));
    }

    #[test]
    fn test_dashboard_stats_wire_format_is_camel_case() {
        let stats = DashboardStats {
            total_recipes: 3,
            total_ingredients: 7,
            total_active_days: 12,
        };
        assert_eq!(
            serde_json::to_value(stats).unwrap(),
            json!({"totalRecipes": 3, "totalIngredients": 7, "totalActiveDays": 12})
        );
    }

    #[test]
    fn test_list_query_offset() {
        let query = RecipeListQuery {
            page: 3,
            limit: 10,
            sort: RecipeSort::Title,
            order: SortOrder::Asc,
        };
        assert_eq!(query.offset(), 20);
    }
}
