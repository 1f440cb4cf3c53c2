//! Recipe generation through an OpenAI-compatible chat gateway

mod client;
mod prompt;

pub use client::OpenRouterClient;
pub use prompt::{build_prompt, parse_recipe_content, SYSTEM_PROMPT};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Recipe generation is disabled")]
    Disabled,

    #[error("AI request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response format from AI: {0}")]
    InvalidResponse(String),
}
