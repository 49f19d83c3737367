//! Anthropic client
//!
//! Implements the LlmClient trait over the Messages API. The system
//! prompt travels as a top-level field, so system payloads are dropped
//! from the message list. Token accounting uses the vendor's own
//! count-tokens endpoint.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use parley_core::{ChatPayload, ContentPart, LlmModel, MessageContent, Role};

use crate::clients::fetch_attachment;
use crate::error::{ClientError, ClientResult};
use crate::{Attachment, ChatRequest, LlmClient};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn from_env() -> Self {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .expect("ANTHROPIC_API_KEY environment variable must be set");

        let base_url =
            env::var("ANTHROPIC_API_BASE").unwrap_or_else(|_| ANTHROPIC_API_BASE.to_string());

        Self::new(api_key, base_url)
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ClientResult<T> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    system: String,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Parts(Vec<AnthropicPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnthropicPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct CountTokensRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Deserialize)]
struct CountTokensResponse {
    input_tokens: u32,
}

fn to_anthropic_message(payload: &ChatPayload) -> AnthropicMessage {
    AnthropicMessage {
        role: payload.role.as_str().to_string(),
        content: to_anthropic_content(&payload.content),
    }
}

fn to_anthropic_content(content: &MessageContent) -> AnthropicContent {
    match content {
        MessageContent::Text(text) => AnthropicContent::Text(text.clone()),
        MessageContent::Parts(parts) => {
            AnthropicContent::Parts(parts.iter().map(to_anthropic_part).collect())
        }
    }
}

fn to_anthropic_part(part: &ContentPart) -> AnthropicPart {
    match part {
        ContentPart::Text { text } => AnthropicPart::Text { text: text.clone() },
        ContentPart::Image {
            media_type, data, ..
        } => AnthropicPart::Image {
            source: ImageSource {
                source_type: "base64".to_string(),
                media_type: media_type.clone(),
                data: data.clone(),
            },
        },
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn communicate(&self, request: &ChatRequest) -> ClientResult<String> {
        // This API takes the system prompt as a separate field; system
        // payloads must not appear in the message list.
        let messages = request
            .messages
            .iter()
            .filter(|payload| payload.role != Role::System)
            .map(to_anthropic_message)
            .collect();

        let messages_req = MessagesRequest {
            model: request.model.version().to_string(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            system: request.system.clone(),
        };

        let messages_resp: MessagesResponse = self.post_json("/messages", &messages_req).await?;

        let reply = messages_resp
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if reply.is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(reply)
    }

    async fn handle_attachment(&self, attachment: &Attachment) -> ClientResult<Vec<ContentPart>> {
        fetch_attachment(&self.client, attachment).await
    }

    async fn count_tokens(
        &self,
        role: Role,
        content: &MessageContent,
        model: LlmModel,
    ) -> ClientResult<usize> {
        let count_req = CountTokensRequest {
            model: model.version().to_string(),
            messages: vec![AnthropicMessage {
                role: role.as_str().to_string(),
                content: to_anthropic_content(content),
            }],
        };

        let count_resp: CountTokensResponse =
            self.post_json("/messages/count_tokens", &count_req).await?;
        Ok(count_resp.input_tokens as usize)
    }
}
