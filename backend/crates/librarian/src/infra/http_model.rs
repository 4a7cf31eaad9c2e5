//! OpenAI-compatible chat completions client

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::entities::ChatMessage;
use crate::domain::model::LanguageModel;
use crate::error::{LibrarianError, LibrarianResult};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Full URL of the chat completions endpoint
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl LlmSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.3,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// First choice of a completion response body
fn first_choice(body: CompletionResponse) -> LibrarianResult<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LibrarianError::Model("Completion has no content".to_string()))
}

#[derive(Clone)]
pub struct HttpLanguageModel {
    client: reqwest::Client,
    settings: LlmSettings,
}

impl HttpLanguageModel {
    pub fn new(settings: LlmSettings) -> LibrarianResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LibrarianError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    pub fn model_name(&self) -> &str {
        &self.settings.model
    }
}

impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, messages: &[ChatMessage]) -> LibrarianResult<String> {
        let request = CompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LibrarianError::Model(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LibrarianError::Model(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LibrarianError::Model(e.to_string()))?;
        first_choice(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageRole;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            ChatMessage::new(MessageRole::System, "context"),
            ChatMessage::new(MessageRole::User, "question"),
        ];
        let body = serde_json::to_value(CompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: 0.5,
        })
        .unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "question");
    }

    #[test]
    fn test_first_choice() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(body).unwrap(), "Hi");

        let empty: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice(empty), Err(LibrarianError::Model(_))));
    }
}
