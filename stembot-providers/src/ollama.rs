//! Ollama HTTP client implementation

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::base::{ChatEndpoint, ChatReply, Message, ProviderError, ProviderResult};

/// Ollama chat API request format
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

/// Ollama chat API response format (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error payload Ollama returns on non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for an Ollama-style chat-completion server
pub struct OllamaClient {
    client: Client,
    base_url: String,
    default_model: String,
    list_timeout: Duration,
}

impl OllamaClient {
    /// Create a new client.
    ///
    /// `list_timeout` bounds only the model-listing request; the chat
    /// request bound belongs to the caller.
    pub fn new(
        base_url: impl Into<String>,
        default_model: impl Into<String>,
        list_timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .http1_only() // Force HTTP/1.1 to avoid issues with some local servers
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            list_timeout,
        }
    }
}

#[async_trait::async_trait]
impl ChatEndpoint for OllamaClient {
    async fn chat(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
    ) -> ProviderResult<ChatReply> {
        let model = model.unwrap_or_else(|| self.default_model.clone());
        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };

        debug!(
            "Sending chat request to {} with model {}",
            self.base_url, request.model
        );

        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Surface the server's own error detail when the body carries one
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(ProviderError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: ChatResponseBody = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedBody(e.to_string()))?;

        let content = parsed
            .message
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ProviderError::UnexpectedStructure(
                    "response has no message content".to_string(),
                )
            })?;

        Ok(ChatReply { content })
    }

    async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        let response = match self
            .client
            .get(&url)
            .timeout(self.list_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to reach model listing at {}: {}", url, e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!("Model listing returned HTTP {}", response.status());
            return Vec::new();
        }

        match response.json::<TagsResponse>().await {
            Ok(tags) => {
                let mut names: Vec<String> =
                    tags.models.into_iter().map(|tag| tag.name).collect();
                names.sort();
                names
            }
            Err(e) => {
                warn!("Model listing response did not parse: {}", e);
                Vec::new()
            }
        }
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}
