//! OpenRouter chat-completions client

use super::prompt::{build_prompt, parse_recipe_content, SYSTEM_PROMPT};
use super::LlmError;
use crate::config::LlmConfig;
use healthymeal_shared::types::{GeneratedRecipe, RecipeGenerationRequest};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenRouterClient {
    http: reqwest::Client,
    enabled: bool,
    api_url: String,
    api_key: SecretString,
    model: String,
    app_url: String,
    app_title: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenRouterClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            enabled: config.enabled,
            api_url: config.api_url.clone(),
            api_key: SecretString::new(config.api_key.clone()),
            model: config.model.clone(),
            app_url: config.app_url.clone(),
            app_title: config.app_title.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Ask the model for a recipe matching `request`
    pub async fn generate_recipe(
        &self,
        request: &RecipeGenerationRequest,
    ) -> Result<GeneratedRecipe, LlmError> {
        if !self.enabled {
            return Err(LlmError::Disabled);
        }

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(request) },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let started = Instant::now();
        let result = self
            .http
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await;
        metrics::histogram!("healthymeal_llm_request_seconds")
            .record(started.elapsed().as_secs_f64());

        let response = result?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            warn!(status = status.as_u16(), %message, "AI service returned an error");
            metrics::counter!("healthymeal_llm_errors_total").increment(1);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("Unexpected completion body: {}", e)))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Empty completion".to_string()))?;

        debug!(chars = content.len(), "Received completion");
        let recipe = parse_recipe_content(&content).map_err(|e| {
            metrics::counter!("healthymeal_llm_errors_total").increment(1);
            e
        })?;

        info!(
            model = %self.model,
            title = %recipe.title,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recipe generated"
        );
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> LlmConfig {
        LlmConfig {
            api_url: format!("{}/api/v1/chat/completions", server.uri()),
            api_key: "sk-or-test".to_string(),
            model: "test/model".to_string(),
            ..LlmConfig::default()
        }
    }

    fn request() -> RecipeGenerationRequest {
        RecipeGenerationRequest {
            prompt: "tomato soup".to_string(),
            preferences: None,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
    }

    #[tokio::test]
    async fn test_generate_recipe_sends_openrouter_headers() {
        let server = MockServer::start().await;
        let content = r#"{"recipe":{"title":"Tomato Soup","description":"Warm","ingredients":[{"name":"Tomato","amount":"4","unit":"pcs"}],"instructions":["Cook"],"nutrition":{"calories":200,"protein":5,"carbs":30,"fat":6},"cooking_time":25,"difficulty":"easy"}}"#;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(header("x-title", "HealthyMeal"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "max_tokens": 2000,
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config(&server)).unwrap();
        let recipe = client.generate_recipe(&request()).await.unwrap();
        assert_eq!(recipe.title, "Tomato Soup");
        assert_eq!(recipe.nutrition.calories, 200.0);
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "message": "Insufficient credits", "code": 402 }
            })))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config(&server)).unwrap();
        match client.generate_recipe(&request()).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 402);
                assert_eq!(message, "Insufficient credits");
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.title)),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = OpenRouterClient::new(&config(&server)).unwrap();
        assert!(matches!(
            client.generate_recipe(&request()).await,
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_client_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.enabled = false;
        let client = OpenRouterClient::new(&cfg).unwrap();
        assert!(matches!(
            client.generate_recipe(&request()).await,
            Err(LlmError::Disabled)
        ));
    }
}
