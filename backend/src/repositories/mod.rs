//! Table repositories
//!
//! Data access over the BaaS query builder. Every call runs with the
//! caller's token, so row-level security still applies underneath the
//! explicit `user_id` filters.

pub mod ingredients;
pub mod preferences;
pub mod recipe_ingredients;
pub mod recipe_versions;
pub mod recipes;
pub mod translations;
pub mod user;

pub use ingredients::{CreateIngredient, IngredientRecord, IngredientRepository};
pub use preferences::{
    CreatePreferences, CreatePreferencesHistory, PreferencesFields, PreferencesPatch,
    PreferencesRepository,
};
pub use recipe_ingredients::{
    CreateRecipeIngredientRow, RecipeIngredientRecord, RecipeIngredientRepository,
};
pub use recipe_versions::{CreateRecipeVersion, RecipeVersionRecord, RecipeVersionRepository};
pub use recipes::{
    CreateRecipe, RecipeDetailRecord, RecipePatch, RecipeRecord, RecipeRepository,
    RecipeSummaryRecord,
};
pub use translations::TranslationRepository;
pub use user::{CreateUserProfile, UserRepository};
