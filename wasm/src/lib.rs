//! HealthyMeal WASM Module
//!
//! This crate provides WebAssembly bindings so the browser validates and
//! formats recipe data with the same rules as the backend.

use healthymeal_shared::text;
use healthymeal_shared::validation;
use wasm_bindgen::prelude::*;

/// Check macronutrient percentages; returns the error message, if any
///
/// Negative or NaN inputs are treated as "not set".
#[wasm_bindgen]
pub fn validate_macros(protein: f64, carbs: f64, fat: f64) -> Option<String> {
    let given = |v: f64| (v.is_finite() && v >= 0.0).then_some(v);
    validation::validate_macros(given(protein), given(carbs), given(fat)).err()
}

/// Split stored instructions into steps, returned as a JSON array string
#[wasm_bindgen]
pub fn parse_instructions(instructions: &str) -> String {
    let steps = text::parse_instructions(instructions);
    serde_json::to_string(&steps).unwrap_or_else(|_| "[]".to_string())
}

/// Human readable cooking time, e.g. "1h 15m"
#[wasm_bindgen]
pub fn format_cooking_time(minutes: i32) -> String {
    text::format_cooking_time(minutes)
}

/// Leading quantity of an amount such as "2.5 cups"; 0 when absent
#[wasm_bindgen]
pub fn parse_ingredient_amount(amount: &str) -> f64 {
    text::parse_leading_amount(amount)
}

#[wasm_bindgen]
pub fn is_valid_uuid(value: &str) -> bool {
    validation::is_uuid(value)
}
