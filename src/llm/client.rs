use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::prompts::SystemPrompts;
use super::{AdviceError, AdviceGenerator};

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const COMFORT_MODEL: &str = "deepseek/deepseek-chat";

#[derive(Debug, Clone)]
pub struct AdviceConfig {
    pub model: String,
    pub max_tokens: u32,
    /// High temperature keeps the phrases varied between triggers.
    pub temperature: f32,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            model: COMFORT_MODEL.to_string(),
            max_tokens: 50,
            temperature: 1.2,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
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

/// Chat-completions client for the advice generator.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    config: AdviceConfig,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self::with_config(api_key, AdviceConfig::default())
    }

    pub fn with_config(api_key: String, config: AdviceConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url: OPENROUTER_API_URL.to_string(),
            config,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, AdviceError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdviceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AdviceError::EmptyReply)?;

        Ok(content)
    }
}

#[async_trait]
impl AdviceGenerator for OpenRouterClient {
    async fn comfort_phrase(&self) -> Result<String, AdviceError> {
        log::info!("Getting comforting phrase from LLM...");
        let phrase = self
            .complete(
                SystemPrompts::comforting_companion(),
                SystemPrompts::comfort_request(),
            )
            .await?;
        log::info!("LLM responded: {}", phrase);
        Ok(phrase)
    }
}
