//! Text helpers for recipe instructions, amounts and display times

use chrono::{DateTime, Utc};
use std::sync::OnceLock;

fn line_break_regex() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    // Real line breaks as well as escaped `\n` sequences left in stored text
    RE.get_or_init(|| regex_lite::Regex::new(r"\r\n|\n|\\n|\r").expect("valid regex"))
}

fn step_number_regex() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| regex_lite::Regex::new(r"\d+\.\s*").expect("valid regex"))
}

fn leading_amount_regex() -> &'static regex_lite::Regex {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    RE.get_or_init(|| regex_lite::Regex::new(r"^(\d+(?:\.\d+)?)").expect("valid regex"))
}

/// Split stored instructions into display steps.
///
/// Generated recipes store a JSON array of strings, hand-written ones plain
/// text. Plain text is split on line breaks; a single line is split on step
/// numbers (`1. Mix 2. Bake`) when that yields more than one step.
pub fn parse_instructions(instructions: &str) -> Vec<String> {
    if instructions.trim().is_empty() {
        return Vec::new();
    }

    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(instructions) {
        return items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|step| !step.trim().is_empty())
            .map(str::to_string)
            .collect();
    }

    let lines: Vec<String> = line_break_regex()
        .split(instructions)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.len() == 1 {
        let steps: Vec<String> = step_number_regex()
            .split(instructions)
            .map(str::trim)
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect();
        if steps.len() > 1 {
            return steps;
        }
    }

    if lines.is_empty() {
        vec![instructions.trim().to_string()]
    } else {
        lines
    }
}

/// Normalise instructions to the JSON array form used for storage
pub fn instructions_to_json(instructions: &str) -> String {
    let steps = parse_instructions(instructions);
    serde_json::Value::from(steps).to_string()
}

/// Leading decimal number of a free-form amount ("2.5 cups" -> 2.5); 0 when absent
pub fn parse_leading_amount(amount: &str) -> f64 {
    leading_amount_regex()
        .captures(amount.trim_start())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Cooking time for display: "1h 5m", "45m", or "-" when unknown
pub fn format_cooking_time(minutes: i32) -> String {
    if minutes <= 0 {
        return "-".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {} ago", n, unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Age of a timestamp relative to `now`, using the largest whole unit
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let days = elapsed.num_days();
    let hours = elapsed.num_hours();
    let minutes = elapsed.num_minutes();

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "Just now".to_string()
    }
}
