//! LLM vendor client abstractions.
//!
//! One capability per vendor: send an assembled conversation, turn
//! platform attachments into content parts, and apply the vendor's own
//! token accounting. The history buffer never touches the network; these
//! clients are the collaborators that do.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use parley_core::{
    ChatPayload, ContentPart, LlmModel, MessageContent, Role, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};

pub mod clients;
pub mod error;

pub use clients::{AnthropicClient, OpenAiClient};
pub use error::{ClientError, ClientResult};

/// A fully assembled completion request.
///
/// `messages` is the buffer's serialized output: system payload first,
/// then history oldest-to-newest. Vendors that take the system prompt
/// out of band read it from `system` and skip the system payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatPayload>,
    pub model: LlmModel,
    pub temperature: f32,
    pub top_p: f32,
    pub system: String,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatPayload>, model: LlmModel, system: impl Into<String>) -> Self {
        Self {
            messages,
            model,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            system: system.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// A platform attachment, already stripped of platform-specific types.
///
/// Width and height come from the platform's attachment metadata when it
/// provides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub content_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// One hosted-model vendor.
///
/// Attachment handling and token accounting belong to the same
/// capability as `communicate` because both are vendor-specific: the
/// wire form of an image part and the accounting scheme differ per API.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send the conversation and return the model's reply text.
    async fn communicate(&self, request: &ChatRequest) -> ClientResult<String>;

    /// Download an attachment and convert it to content parts.
    async fn handle_attachment(&self, attachment: &Attachment) -> ClientResult<Vec<ContentPart>>;

    /// The vendor's own token accounting for a single message.
    async fn count_tokens(
        &self,
        role: Role,
        content: &MessageContent,
        model: LlmModel,
    ) -> ClientResult<usize>;
}

/// Scripted client for tests: replies are queued ahead of time.
#[derive(Debug, Default)]
pub struct MockClient {
    replies: Mutex<VecDeque<ClientResult<String>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_reply(&self, reply: ClientResult<String>) {
        self.replies
            .lock()
            .expect("mock reply queue poisoned")
            .push_back(reply);
    }
}

#[async_trait]
impl LlmClient for MockClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn communicate(&self, _request: &ChatRequest) -> ClientResult<String> {
        self.replies
            .lock()
            .expect("mock reply queue poisoned")
            .pop_front()
            .unwrap_or(Err(ClientError::EmptyResponse))
    }

    async fn handle_attachment(&self, attachment: &Attachment) -> ClientResult<Vec<ContentPart>> {
        Ok(vec![ContentPart::text(format!(
            "[attachment: {}]",
            attachment.url
        ))])
    }

    async fn count_tokens(
        &self,
        _role: Role,
        content: &MessageContent,
        _model: LlmModel,
    ) -> ClientResult<usize> {
        let chars = match content {
            MessageContent::Text(text) => text.len(),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => text.len(),
                    ContentPart::Image { .. } => 1024,
                })
                .sum(),
        };
        Ok((chars / 4).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest::new(
            vec![
                ChatPayload::new(Role::System, "You are terse."),
                ChatPayload::new(Role::User, "hello"),
            ],
            LlmModel::Gpt4o,
            "You are terse.",
        )
    }

    #[tokio::test]
    async fn mock_returns_queued_reply() {
        let client = MockClient::new();
        client.enqueue_reply(Ok("hi from mock".to_string()));

        let reply = client.communicate(&request()).await.unwrap();
        assert_eq!(reply, "hi from mock");
    }

    #[tokio::test]
    async fn mock_reports_empty_queue() {
        let client = MockClient::new();
        let err = client.communicate(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse));
    }

    #[tokio::test]
    async fn mock_replays_queued_error() {
        let client = MockClient::new();
        client.enqueue_reply(Err(ClientError::HttpStatus {
            status: 429,
            body: "rate limited".to_string(),
        }));

        let err = client.communicate(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::HttpStatus { status: 429, .. }));
    }

    #[test]
    fn request_defaults_are_session_defaults() {
        let req = request();
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(req.top_p, DEFAULT_TOP_P);
        assert_eq!(req.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
