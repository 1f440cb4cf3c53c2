//! Prompt construction and response parsing for recipe generation

use super::LlmError;
use healthymeal_shared::types::{GeneratedRecipe, RecipeGenerationRequest};
use serde_json::Value;

pub const SYSTEM_PROMPT: &str = "You are a professional chef. Generate a recipe in JSON format only. No explanations or thinking process. Just the JSON object.";

const FORMAT_BLOCK: &str = r#"
Please provide the recipe in the following JSON format:
{
  "recipe": {
    "title": "string",
    "description": "string",
    "ingredients": [
      {
        "name": "string",
        "amount": "string",
        "unit": "string"
      }
    ],
    "instructions": ["string"],
    "nutrition": {
      "calories": number,
      "protein": number,
      "carbs": number,
      "fat": number
    },
    "cooking_time": number,
    "difficulty": "easy" | "medium" | "hard"
  }
}

Notes:
- cooking_time should be in minutes
- difficulty should be one of: "easy", "medium", "hard"
- amount in ingredients should be a string that includes both the number and unit (e.g., "2 cups", "1/4 teaspoon")
- nutrition values should be in grams except for calories
- instructions should be an array of step-by-step instructions"#;

const REQUIRED_FIELDS: [&str; 5] = ["title", "description", "ingredients", "instructions", "nutrition"];

/// User message for a generation request
pub fn build_prompt(request: &RecipeGenerationRequest) -> String {
    let mut prompt = String::from("Generate a recipe based on the following preferences:\n");
    prompt.push_str(&format!("Description: {}\n", request.prompt.trim()));

    if let Some(prefs) = &request.preferences {
        if let Some(calories) = prefs.calories.filter(|c| *c > 0) {
            prompt.push_str(&format!("Target calories: {}\n", calories));
        }
        if let Some(allergens) = prefs.allergens.as_ref().filter(|a| !a.is_empty()) {
            prompt.push_str(&format!("Allergens to avoid: {}\n", allergens.join(", ")));
        }
        if let Some(macros) = prefs.macros.as_ref().filter(|m| !m.is_empty()) {
            let parts: Vec<String> = [
                ("protein", macros.protein),
                ("carbs", macros.carbs),
                ("fat", macros.fat),
            ]
            .iter()
            .filter_map(|(name, value)| value.map(|v| format!("{} {}%", name, v)))
            .collect();
            prompt.push_str(&format!("Macronutrient targets: {}\n", parts.join(", ")));
        }
    }

    prompt.push_str(FORMAT_BLOCK);
    prompt
}

/// Outermost `{ ... }` span of `content`
fn json_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Parse the assistant message into a recipe
pub fn parse_recipe_content(content: &str) -> Result<GeneratedRecipe, LlmError> {
    let span = json_span(content.trim())
        .ok_or_else(|| LlmError::InvalidResponse("No JSON object found in response".to_string()))?;

    let data: Value = serde_json::from_str(span)
        .map_err(|e| LlmError::InvalidResponse(format!("Malformed JSON: {}", e)))?;

    let recipe = data
        .get("recipe")
        .filter(|r| r.is_object())
        .ok_or_else(|| LlmError::InvalidResponse("Invalid recipe data format".to_string()))?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| is_missing(recipe.get(*field)))
        .collect();
    if !missing.is_empty() {
        return Err(LlmError::InvalidResponse(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(recipe.clone())
        .map_err(|e| LlmError::InvalidResponse(format!("Unexpected recipe shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthymeal_shared::types::{GenerationPreferences, MacroTargets};

    fn request(preferences: Option<GenerationPreferences>) -> RecipeGenerationRequest {
        RecipeGenerationRequest {
            prompt: "  quick vegan lunch ".to_string(),
            preferences,
        }
    }

    #[test]
    fn test_prompt_without_preferences() {
        let prompt = build_prompt(&request(None));
        assert!(prompt.starts_with("Generate a recipe based on the following preferences:\nDescription: quick vegan lunch\n"));
        assert!(!prompt.contains("Target calories"));
        assert!(prompt.contains("cooking_time should be in minutes"));
    }

    #[test]
    fn test_prompt_with_preferences() {
        let prompt = build_prompt(&request(Some(GenerationPreferences {
            calories: Some(600),
            allergens: Some(vec!["peanuts".to_string(), "soy".to_string()]),
            macros: Some(MacroTargets {
                protein: Some(30.0),
                carbs: None,
                fat: Some(20.0),
            }),
        })));
        assert!(prompt.contains("Target calories: 600\n"));
        assert!(prompt.contains("Allergens to avoid: peanuts, soy\n"));
        assert!(prompt.contains("Macronutrient targets: protein 30%, fat 20%\n"));
    }

    #[test]
    fn test_empty_allergens_are_omitted() {
        let prompt = build_prompt(&request(Some(GenerationPreferences {
            allergens: Some(vec![]),
            ..Default::default()
        })));
        assert!(!prompt.contains("Allergens"));
    }

    #[test]
    fn test_parse_content_with_surrounding_text() {
        let content = r#"Sure! Here it is:
{"recipe": {"title": "Hummus", "description": "Dip", "ingredients": [{"name": "Chickpeas", "amount": "400", "unit": "g"}],
"instructions": ["Blend"], "nutrition": {"calories": 500, "protein": 20, "carbs": 50, "fat": 25}, "cooking_time": 10, "difficulty": "easy"}}
Enjoy!"#;
        let recipe = parse_recipe_content(content).unwrap();
        assert_eq!(recipe.title, "Hummus");
        assert_eq!(recipe.ingredients[0].amount, "400");
        assert_eq!(recipe.cooking_time, Some(10));
    }

    #[test]
    fn test_parse_reports_missing_fields() {
        let content = r#"{"recipe": {"title": "Hummus", "ingredients": [], "nutrition": {}}}"#;
        let err = parse_recipe_content(content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response format from AI: Missing required fields: description, ingredients, instructions"
        );
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_recipe_content("I cannot help with that"),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(parse_recipe_content(r#"{"title": "no envelope"}"#).is_err());
    }
}
