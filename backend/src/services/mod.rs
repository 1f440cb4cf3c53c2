//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the response cache and the LLM client.

pub mod auth;
pub mod dashboard;
pub mod generation;
pub mod ingredients;
pub mod preferences;
pub mod recipes;
pub mod translations;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use generation::{merge_preferences, GenerationService};
pub use ingredients::IngredientService;
pub use preferences::PreferencesService;
pub use recipes::RecipeService;
pub use translations::TranslationService;
