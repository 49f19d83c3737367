//! OpenAI client
//!
//! Implements the LlmClient trait over the Chat Completions API.
//! Token accounting is local: BPE lengths for text parts and the
//! fixed-tile rule for image parts.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use parley_context::{ContextError, TiktokenEstimator};
use parley_core::{
    ChatPayload, ContentPart, LlmModel, MessageContent, Role, Vendor,
};

use crate::clients::fetch_attachment;
use crate::error::{ClientError, ClientResult};
use crate::{Attachment, ChatRequest, LlmClient};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    estimator: TiktokenEstimator,
}

impl OpenAiClient {
    pub fn from_env() -> Self {
        let api_key =
            env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY environment variable must be set");

        let base_url =
            env::var("OPENAI_API_BASE").unwrap_or_else(|_| OPENAI_API_BASE.to_string());

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
            estimator: TiktokenEstimator::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionsRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: OpenAiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
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

fn to_openai_message(payload: &ChatPayload) -> OpenAiMessage {
    let content = match &payload.content {
        MessageContent::Text(text) => OpenAiContent::Text(text.clone()),
        MessageContent::Parts(parts) => {
            OpenAiContent::Parts(parts.iter().map(to_openai_part).collect())
        }
    };
    OpenAiMessage {
        role: payload.role.as_str().to_string(),
        content,
    }
}

fn to_openai_part(part: &ContentPart) -> OpenAiPart {
    match part {
        ContentPart::Text { text } => OpenAiPart::Text { text: text.clone() },
        ContentPart::Image {
            media_type, data, ..
        } => OpenAiPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{media_type};base64,{data}"),
            },
        },
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn communicate(&self, request: &ChatRequest) -> ClientResult<String> {
        // The system payload travels inside `messages` for this API.
        let completions_req = CompletionsRequest {
            model: request.model.version().to_string(),
            messages: request.messages.iter().map(to_openai_message).collect(),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: Some(request.max_tokens),
        };

        let response = self
            .client
            .post(self.endpoint("/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&completions_req)
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

        let completions_resp: CompletionsResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        completions_resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ClientError::EmptyResponse)
    }

    async fn handle_attachment(&self, attachment: &Attachment) -> ClientResult<Vec<ContentPart>> {
        fetch_attachment(&self.client, attachment).await
    }

    async fn count_tokens(
        &self,
        _role: Role,
        content: &MessageContent,
        model: LlmModel,
    ) -> ClientResult<usize> {
        if model.vendor() != Vendor::OpenAi {
            return Err(ContextError::UnsupportedModel(model.version().to_string()).into());
        }
        Ok(self.estimator.content_tokens(model.version(), content))
    }
}
