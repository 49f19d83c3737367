//! End-to-end flow: buffer feeds the client, the reply feeds the buffer.

use std::sync::Arc;

use parley_context::{BoundedHistory, ContextResult, TokenEstimator};
use parley_core::{LlmModel, MessageContent, Role};
use parley_runtime::{ChatRequest, ClientError, LlmClient, MockClient};

struct CharCost;

impl TokenEstimator for CharCost {
    fn estimate(&self, _role: Role, content: &MessageContent, _model: &str) -> ContextResult<usize> {
        Ok(content.as_text().map_or(0, str::len))
    }
}

fn window() -> BoundedHistory {
    BoundedHistory::new(2_000, "stub", Arc::new(CharCost)).unwrap()
}

#[tokio::test]
async fn user_turn_reply_turn() {
    let mut window = window();
    let client = MockClient::new();
    client.enqueue_reply(Ok("Paris.".to_string()));

    window.set_system_message("Answer with one word.").unwrap();
    window
        .add_message("what is the capital of France?", Role::User)
        .unwrap();

    let system = window
        .system_message()
        .content
        .as_text()
        .unwrap()
        .to_string();
    let request = ChatRequest::new(window.serialize(), LlmModel::Claude35Sonnet, system);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);

    let reply = client.communicate(&request).await.unwrap();
    window.add_message(reply, Role::Assistant).unwrap();

    let messages = window.serialize();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].content.as_text(), Some("Paris."));
}

#[tokio::test]
async fn failed_completion_appends_no_assistant_turn() {
    let mut window = window();
    let client = MockClient::new();
    client.enqueue_reply(Err(ClientError::HttpStatus {
        status: 429,
        body: "rate limited".to_string(),
    }));

    window.add_message("hello?", Role::User).unwrap();
    let request = ChatRequest::new(
        window.serialize(),
        LlmModel::Claude35Sonnet,
        "You are a helpful assistant.",
    );

    let err = client.communicate(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::HttpStatus { status: 429, .. }));

    // The user turn stays; no assistant entry, no rollback.
    assert_eq!(window.len(), 1);
    assert_eq!(window.serialize().len(), 2);
}
