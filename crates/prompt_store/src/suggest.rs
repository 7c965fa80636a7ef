//! AI improvement suggestions for prompt text

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::LibraryConfig;
use crate::error::{StoreError, StoreResult};

pub const SUGGESTION_INSTRUCTIONS: &str = "You review prompts written for large language models. \
Reply with concrete suggestions to improve the user's prompt, one suggestion per line, \
without any introduction or closing remarks.";

/// Turns prompt text into a list of improvement suggestions
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, text: &str) -> StoreResult<Vec<String>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions backend
pub struct OpenAiSuggestionProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiSuggestionProvider {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build a provider when the configuration carries an API key
    pub fn from_config(config: &LibraryConfig) -> Option<Self> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(config.api_base.clone(), key.clone(), config.model.clone()))
    }
}

#[async_trait]
impl SuggestionProvider for OpenAiSuggestionProvider {
    async fn suggest(&self, text: &str) -> StoreResult<Vec<String>> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SUGGESTION_INSTRUCTIONS,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.7,
        };

        debug!("POST {} (model {})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Suggestion(format!(
                "Suggestion service returned {}: {}",
                status, body
            )));
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| StoreError::Suggestion("Empty response from suggestion service".to_string()))?;

        Ok(parse_suggestions(&content))
    }
}

/// Split a model reply into suggestions, dropping bullets and numbering
pub fn parse_suggestions(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim();

    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim();
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }

    line
}
