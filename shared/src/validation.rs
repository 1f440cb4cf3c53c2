//! Input validation functions
//!
//! Every validator returns a user-facing message on failure. The messages
//! are part of the public API: clients display them verbatim.

use crate::models::{Difficulty, MeasurementSystem, RecipeSort, SortOrder};
use crate::types::{
    CreateRecipeIngredient, CreateRecipeRequest, IngredientListParams, IngredientListQuery,
    RecipeListParams, RecipeListQuery, UpdateRecipeRequest, UpdateUserPreferencesRequest,
};
use std::sync::OnceLock;

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size accepted by list endpoints
pub const MAX_LIMIT: u32 = 100;

/// Longest accepted ingredient search query
pub const MAX_SEARCH_LENGTH: usize = 255;

/// Longest accepted ingredient name
pub const MAX_NAME_LENGTH: usize = 255;

fn email_regex() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
    })
}

fn uuid_regex() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex_lite::Regex::new(
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        )
        .expect("valid uuid regex")
    })
}

/// Hyphenated, case-insensitive UUID check
pub fn is_uuid(value: &str) -> bool {
    uuid_regex().is_match(value)
}

// ============================================================================
// Authentication
// ============================================================================

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if !email_regex().is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate password strength for new accounts
pub fn validate_signup_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    Ok(())
}

// ============================================================================
// List Parameters
// ============================================================================

fn resolve_page(page: Option<i64>) -> Result<u32, String> {
    match page {
        None => Ok(1),
        Some(p) if p < 1 => Err("Page number must be greater than 0".to_string()),
        Some(p) => u32::try_from(p).map_err(|_| "Page number is too large".to_string()),
    }
}

fn resolve_limit(limit: Option<i64>) -> Result<u32, String> {
    match limit {
        None => Ok(DEFAULT_LIMIT),
        Some(l) if l < 1 => Err("Limit must be greater than 0".to_string()),
        Some(l) if l > MAX_LIMIT as i64 => Err(format!("Limit cannot exceed {}", MAX_LIMIT)),
        Some(l) => Ok(l as u32),
    }
}

/// Validate recipe list parameters
pub fn validate_recipe_list_params(params: &RecipeListParams) -> Result<(), String> {
    resolve_recipe_list_params(params).map(|_| ())
}

/// Validate recipe list parameters and apply defaults
pub fn resolve_recipe_list_params(params: &RecipeListParams) -> Result<RecipeListQuery, String> {
    let page = resolve_page(params.page)?;
    let limit = resolve_limit(params.limit)?;
    let sort = match params.sort.as_deref() {
        None => RecipeSort::default(),
        Some(s) => s
            .parse::<RecipeSort>()
            .map_err(|_| "Invalid sort field".to_string())?,
    };
    let order = match params.order.as_deref() {
        None => SortOrder::default(),
        Some(o) => o
            .parse::<SortOrder>()
            .map_err(|_| "Invalid order value".to_string())?,
    };

    Ok(RecipeListQuery {
        page,
        limit,
        sort,
        order,
    })
}

/// Validate ingredient list parameters
pub fn validate_ingredient_list_params(params: &IngredientListParams) -> Result<(), String> {
    resolve_ingredient_list_params(params).map(|_| ())
}

/// Validate ingredient list parameters and apply defaults
///
/// The search term is trimmed; an empty term means "no filter".
pub fn resolve_ingredient_list_params(
    params: &IngredientListParams,
) -> Result<IngredientListQuery, String> {
    let page = resolve_page(params.page)?;
    let limit = resolve_limit(params.limit)?;
    let search = params.search.as_deref().unwrap_or_default().trim();
    if search.chars().count() > MAX_SEARCH_LENGTH {
        return Err(format!(
            "Search query cannot exceed {} characters",
            MAX_SEARCH_LENGTH
        ));
    }

    Ok(IngredientListQuery {
        page,
        limit,
        search: search.to_string(),
    })
}

// ============================================================================
// Ingredients
// ============================================================================

/// Validate an ingredient name
pub fn validate_ingredient_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name cannot exceed {} characters", MAX_NAME_LENGTH));
    }
    Ok(())
}

// ============================================================================
// Recipes
// ============================================================================

fn validate_difficulty(difficulty: Option<&str>) -> Result<(), String> {
    match difficulty {
        Some(d) if d.parse::<Difficulty>().is_err() => Err("Invalid difficulty value".to_string()),
        _ => Ok(()),
    }
}

fn validate_non_negative(label: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if v.is_nan() || v < 0.0 => Err(format!("{} must be positive", label)),
        _ => Ok(()),
    }
}

fn validate_recipe_numbers(
    cooking_time: Option<i32>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
) -> Result<(), String> {
    validate_non_negative("Cooking time", cooking_time.map(f64::from))?;
    validate_non_negative("Calories", calories)?;
    validate_non_negative("Protein", protein)?;
    validate_non_negative("Carbs", carbs)?;
    validate_non_negative("Fat", fat)
}

/// Validate the ingredient lines of a recipe request
pub fn validate_recipe_ingredients(ingredients: &[CreateRecipeIngredient]) -> Result<(), String> {
    if ingredients.is_empty() {
        return Err("At least one ingredient is required".to_string());
    }
    for (index, ingredient) in ingredients.iter().enumerate() {
        let n = index + 1;
        if ingredient.ingredient_id.is_empty() {
            return Err(format!("Ingredient {}: ID is required", n));
        }
        if !is_uuid(&ingredient.ingredient_id) {
            return Err(format!(
                "Ingredient {}: Invalid ID format. Must be a valid UUID",
                n
            ));
        }
        if ingredient.amount.is_nan() || ingredient.amount <= 0.0 {
            return Err(format!("Ingredient {}: Amount must be positive", n));
        }
        if ingredient.unit.trim().is_empty() {
            return Err(format!("Ingredient {}: Unit is required", n));
        }
    }
    Ok(())
}

/// Validate a create recipe request
pub fn validate_create_recipe(req: &CreateRecipeRequest) -> Result<(), String> {
    if req.title.trim().is_empty() {
        return Err("Title is required".to_string());
    }
    if req.instructions.trim().is_empty() {
        return Err("Instructions are required".to_string());
    }
    if req.ingredients.is_empty() {
        return Err("At least one ingredient is required".to_string());
    }
    validate_difficulty(req.difficulty.as_deref())?;
    validate_recipe_numbers(
        req.cooking_time,
        req.calories,
        req.protein,
        req.carbs,
        req.fat,
    )?;
    validate_recipe_ingredients(&req.ingredients)
}

/// Validate an update recipe request; only provided fields are checked
pub fn validate_update_recipe(req: &UpdateRecipeRequest) -> Result<(), String> {
    if matches!(req.title.as_deref(), Some(t) if t.trim().is_empty()) {
        return Err("Title is required".to_string());
    }
    if matches!(req.instructions.as_deref(), Some(i) if i.trim().is_empty()) {
        return Err("Instructions are required".to_string());
    }
    validate_difficulty(req.difficulty.as_deref())?;
    validate_recipe_numbers(
        req.cooking_time,
        req.calories,
        req.protein,
        req.carbs,
        req.fat,
    )?;
    if let Some(ingredients) = &req.ingredients {
        validate_recipe_ingredients(ingredients)?;
    }
    Ok(())
}

/// Shortest accepted generation prompt
pub const MIN_PROMPT_LENGTH: usize = 10;

/// Validate a free-text generation prompt
pub fn validate_generation_prompt(prompt: &str) -> Result<(), String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err("Prompt is required".to_string());
    }
    if trimmed.chars().count() < MIN_PROMPT_LENGTH {
        return Err(format!(
            "Prompt must be at least {} characters long",
            MIN_PROMPT_LENGTH
        ));
    }
    Ok(())
}

// ============================================================================
// Preferences
// ============================================================================

/// Validate percentage value (0-100)
pub fn validate_percentage(value: f64) -> Result<(), String> {
    if value.is_nan() || value.is_infinite() {
        return Err("Percentage must be a valid number".to_string());
    }
    if !(0.0..=100.0).contains(&value) {
        return Err("Percentage must be between 0 and 100".to_string());
    }
    Ok(())
}

/// Validate that macronutrient percentages add up to 100
///
/// Missing values count as zero; the check only applies when at least one
/// value is given.
pub fn validate_macros(protein: Option<f64>, carbs: Option<f64>, fat: Option<f64>) -> Result<(), String> {
    if protein.is_none() && carbs.is_none() && fat.is_none() {
        return Ok(());
    }
    for value in [protein, carbs, fat].into_iter().flatten() {
        validate_percentage(value)?;
    }
    let total = protein.unwrap_or(0.0) + carbs.unwrap_or(0.0) + fat.unwrap_or(0.0);
    if (total - 100.0).abs() > 0.01 {
        return Err("Macronutrient percentages must sum to 100".to_string());
    }
    Ok(())
}

/// Validate a preferences update
pub fn validate_preferences(req: &UpdateUserPreferencesRequest) -> Result<(), String> {
    validate_macros(
        req.protein_percentage,
        req.carbs_percentage,
        req.fat_percentage,
    )?;
    if let Some(system) = req.measurement_system.as_deref() {
        system.parse::<MeasurementSystem>().map_err(|_| {
            format!(
                "Invalid measurement system. Must be one of: {}",
                MeasurementSystem::ALL.join(", ")
            )
        })?;
    }
    if matches!(req.daily_calories, Some(c) if c < 0) {
        return Err("Daily calories must be positive".to_string());
    }
    if let Some(allergens) = &req.allergens {
        if !allergens.is_array() {
            return Err("Allergens must be a list".to_string());
        }
    }
    Ok(())
}
