//! Invariant checks over mixed operation sequences.

use std::sync::Arc;

use parley_context::{BoundedHistory, ContextResult, TokenEstimator};
use parley_core::{MessageContent, Role};

/// One token per character, system messages included.
struct CharCost;

impl TokenEstimator for CharCost {
    fn estimate(&self, _role: Role, content: &MessageContent, _model: &str) -> ContextResult<usize> {
        Ok(content.as_text().map_or(0, str::len))
    }
}

fn recomputed_count(window: &BoundedHistory) -> i64 {
    window
        .serialize()
        .iter()
        .skip(1)
        .map(|payload| payload.content.as_text().map_or(0, str::len) as i64)
        .sum()
}

#[test]
fn running_total_matches_entries_after_every_operation() {
    let mut window = BoundedHistory::new(120, "stub", Arc::new(CharCost)).unwrap();

    let script = vec![
        ("what is the capital of France?".to_string(), Role::User),
        ("Paris.".to_string(), Role::Assistant),
        ("and of Germany?".to_string(), Role::User),
        ("Berlin.".to_string(), Role::Assistant),
        ("padding ".repeat(12), Role::User),
    ];

    for (text, role) in script {
        window.add_message(text, role).unwrap();
        assert_eq!(window.token_count(), recomputed_count(&window));
        assert!(window.token_count() <= window.limit());
    }

    window.set_system_message("Be brief.").unwrap();
    assert_eq!(window.token_count(), recomputed_count(&window));

    window.add_message("still here?", Role::User).unwrap();
    assert_eq!(window.token_count(), recomputed_count(&window));
    assert!(window.token_count() <= window.limit());

    window.clear_history().unwrap();
    assert_eq!(window.token_count(), 0);
    assert_eq!(recomputed_count(&window), 0);
}

#[test]
fn serialize_round_trip_keeps_n_plus_one_messages() {
    let mut window = BoundedHistory::new(10_000, "stub", Arc::new(CharCost)).unwrap();
    for i in 0..7 {
        let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
        window.add_message(format!("turn {i}"), role).unwrap();
    }

    let messages = window.serialize();
    assert_eq!(messages.len(), 8);
    assert_eq!(messages[0].role, Role::System);
    for (i, payload) in messages.iter().skip(1).enumerate() {
        assert_eq!(payload.content.as_text(), Some(format!("turn {i}").as_str()));
    }
}

#[test]
fn serialized_payloads_survive_json() {
    let mut window = BoundedHistory::new(10_000, "stub", Arc::new(CharCost)).unwrap();
    window.set_system_message("Reply in French.").unwrap();
    window.add_message("good morning", Role::User).unwrap();
    window.add_message("bonjour", Role::Assistant).unwrap();

    let messages = window.serialize();
    let json = serde_json::to_string(&messages).unwrap();
    let back: Vec<parley_core::ChatPayload> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, messages);
}

#[test]
fn failed_reply_leaves_user_turn_in_place() {
    // A downstream completion failure means no assistant entry is ever
    // appended; the user entry is not rolled back.
    let mut window = BoundedHistory::new(500, "stub", Arc::new(CharCost)).unwrap();
    window.add_message("please summarize this", Role::User).unwrap();

    // ... the model call fails here, nothing is appended ...

    assert_eq!(window.len(), 1);
    assert_eq!(window.token_count(), recomputed_count(&window));

    // The retry appends independently.
    window.add_message("summary text", Role::Assistant).unwrap();
    assert_eq!(window.len(), 2);
}
