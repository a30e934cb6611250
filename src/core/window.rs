//! Trailing context window.
//!
//! Only the most recent turns are sent to the model. Older context is dropped,
//! not summarized.

use crate::api::ChatMessage;
use crate::core::conversation::Conversation;

pub const DEFAULT_WINDOW_LIMIT: usize = 10;

/// Return the last `limit` turns of `conversation` in their original order,
/// reduced to the `{role, content}` shape the model call expects.
pub fn window(conversation: &Conversation, limit: usize) -> Vec<ChatMessage> {
    let turns = conversation.turns();
    let start = turns.len().saturating_sub(limit);
    turns[start..].iter().map(|turn| turn.to_chat_message()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::{MessageStore, GREETING};
    use crate::core::message::Turn;

    fn store_with_total(total: usize) -> MessageStore {
        let mut store = MessageStore::new();
        for index in 2..=total {
            store
                .append(Turn::user(format!("turn {index}")))
                .expect("append");
        }
        store
    }

    #[test]
    fn fifteen_turns_with_limit_ten_returns_turns_six_through_fifteen() {
        let store = store_with_total(15);
        let windowed = window(store.conversation(), DEFAULT_WINDOW_LIMIT);

        let contents: Vec<String> = windowed.into_iter().map(|m| m.content).collect();
        let expected: Vec<String> = (6..=15).map(|index| format!("turn {index}")).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn short_conversation_is_returned_whole() {
        let store = store_with_total(3);
        let windowed = window(store.conversation(), DEFAULT_WINDOW_LIMIT);
        assert_eq!(windowed.len(), 3);
        assert_eq!(windowed[0], ChatMessage::new("assistant", GREETING));
        assert_eq!(windowed[2].content, "turn 3");
    }

    #[test]
    fn window_is_always_a_bounded_suffix() {
        for total in 1..=14 {
            let store = store_with_total(total);
            let all: Vec<ChatMessage> = store
                .conversation()
                .iter()
                .map(Turn::to_chat_message)
                .collect();
            for limit in 0..=16 {
                let windowed = window(store.conversation(), limit);
                assert_eq!(windowed.len(), total.min(limit));
                assert_eq!(windowed.as_slice(), &all[all.len() - windowed.len()..]);
            }
        }
    }

    #[test]
    fn window_is_deterministic() {
        let store = store_with_total(12);
        assert_eq!(
            window(store.conversation(), 4),
            window(store.conversation(), 4)
        );
    }
}
