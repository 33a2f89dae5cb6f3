//! OpenAI Location Extractor
//!
//! Implements LocationExtractor with an OpenAI-compatible chat-completions
//! API (OpenAI, Azure OpenAI, Ollama, ...).

use crate::domain::entities::{ExtractedLocation, Query};
use crate::domain::ports::{ExtractionError, LocationExtractor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a location entity extractor. Your job is to identify and \
return ONLY the location mentioned in the user's query. Return just the location name without \
any additional text, explanations, or JSON formatting.";

/// Language-model backed location extractor.
pub struct OpenAiLocationExtractor {
    client: reqwest::Client,
    /// Base URL up to and including the version segment, e.g. `https://api.openai.com/v1`
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiLocationExtractor {
    /// Create a new extractor.
    ///
    /// # Arguments
    /// * `api_url` - API base, e.g. "https://api.openai.com/v1"
    /// * `api_key` - Bearer token (may be absent for local Ollama)
    /// * `model` - Model name, e.g. "gpt-4o-mini"
    /// * `timeout` - Deadline for a whole completion request
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url)
    }

    fn request_body<'a>(&'a self, query: &'a Query) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: query.as_str(),
                },
            ],
        }
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI API response structure.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<MessageContent>,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

fn map_transport_error(e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::Timeout
    } else {
        ExtractionError::Service(e.to_string())
    }
}

#[async_trait]
impl LocationExtractor for OpenAiLocationExtractor {
    async fn extract(&self, query: &Query) -> Result<ExtractedLocation, ExtractionError> {
        let mut request = self
            .client
            .post(self.completions_url())
            .json(&self.request_body(query));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("language model request failed: {} - {}", status, body);
            return Err(ExtractionError::Service(format!("status {}", status)));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Timeout
            } else {
                ExtractionError::InvalidResponse(e.to_string())
            }
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        let location = ExtractedLocation::from_model_output(content.as_deref());
        tracing::debug!("model answered {:?} for '{}'", location.phrase(), query.as_str());

        Ok(location)
    }
}
