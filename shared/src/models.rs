//! Domain enums shared between the backend and the browser bindings

use crate::errors::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recipe difficulty
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [&'static str; 3] = ["easy", "medium", "hard"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ParseEnumError::new("difficulty", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit system used when presenting amounts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    #[default]
    Metric,
    Imperial,
}

impl MeasurementSystem {
    pub const ALL: [&'static str; 2] = ["metric", "imperial"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementSystem::Metric => "metric",
            MeasurementSystem::Imperial => "imperial",
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(MeasurementSystem::Metric),
            "imperial" => Ok(MeasurementSystem::Imperial),
            other => Err(ParseEnumError::new("measurement system", other)),
        }
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sortable recipe columns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

impl RecipeSort {
    pub const ALL: [&'static str; 3] = ["created_at", "updated_at", "title"];

    /// Column name in the `recipes` table
    pub fn column(&self) -> &'static str {
        match self {
            RecipeSort::CreatedAt => "created_at",
            RecipeSort::UpdatedAt => "updated_at",
            RecipeSort::Title => "title",
        }
    }
}

impl FromStr for RecipeSort {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(RecipeSort::CreatedAt),
            "updated_at" => Ok(RecipeSort::UpdatedAt),
            "title" => Ok(RecipeSort::Title),
            other => Err(ParseEnumError::new("sort", other)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const ALL: [&'static str; 2] = ["asc", "desc"];

    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Asc)
    }
}

impl FromStr for SortOrder {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ParseEnumError::new("order", other)),
        }
    }
}

/// Dashboard activity kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    RecipeAdded,
    FavoriteAdded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("easy", Difficulty::Easy)]
    #[case("medium", Difficulty::Medium)]
    #[case("hard", Difficulty::Hard)]
    fn test_difficulty_from_str(#[case] input: &str, #[case] expected: Difficulty) {
        assert_eq!(input.parse::<Difficulty>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn test_difficulty_rejects_unknown_and_case() {
        assert!("Easy".parse::<Difficulty>().is_err());
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_recipe_sort_defaults_to_created_at() {
        assert_eq!(RecipeSort::default().column(), "created_at");
        assert_eq!("title".parse::<RecipeSort>().unwrap().column(), "title");
    }

    #[test]
    fn test_sort_order_default_is_desc() {
        assert!(!SortOrder::default().is_ascending());
        assert!("asc".parse::<SortOrder>().unwrap().is_ascending());
    }

    #[test]
    fn test_activity_type_wire_name() {
        let json = serde_json::to_string(&ActivityType::RecipeAdded).unwrap();
        assert_eq!(json, "\"recipe_added\"");
    }
}
