//! Append-only conversation log.
//!
//! The store owns the conversation. Callers get read-only views and may only
//! append a turn or reset the whole log back to the seeded greeting.

use std::fmt;

use crate::core::message::Turn;

/// Content of the assistant turn every conversation starts with.
pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";

/// Reported when a turn's content is empty after trimming whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyContent;

impl fmt::Display for EmptyContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message content is empty")
    }
}

impl std::error::Error for EmptyContent {}

/// Ordered turns, oldest first. Never empty once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn seeded() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
        }
    }

    /// Build a conversation from previously stored turns, reseeding when
    /// nothing usable survived.
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        if turns.is_empty() {
            Self::seeded()
        } else {
            Self { turns }
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::seeded()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[derive(Debug, Default)]
pub struct MessageStore {
    conversation: Conversation,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_conversation(conversation: Conversation) -> Self {
        Self { conversation }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn len(&self) -> usize {
        self.conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.conversation.last()
    }

    pub fn append(&mut self, turn: Turn) -> Result<&Conversation, EmptyContent> {
        if turn.content().trim().is_empty() {
            return Err(EmptyContent);
        }
        self.conversation.turns.push(turn);
        Ok(&self.conversation)
    }

    pub fn reset(&mut self) -> &Conversation {
        self.conversation = Conversation::seeded();
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;

    #[test]
    fn new_store_is_seeded_with_greeting() {
        let store = MessageStore::new();
        assert_eq!(store.len(), 1);
        let seed = store.last().expect("seed turn");
        assert_eq!(seed.role(), Role::Assistant);
        assert_eq!(seed.content(), GREETING);
    }

    #[test]
    fn appends_keep_call_order_after_seed() {
        let mut store = MessageStore::new();
        let seed_id = store.conversation().turns()[0].id().to_string();
        let contents = ["first", "second", "third", "fourth"];
        for (index, content) in contents.iter().enumerate() {
            let turn = if index % 2 == 0 {
                Turn::user(*content)
            } else {
                Turn::assistant(*content)
            };
            store.append(turn).expect("append should succeed");
        }

        let turns = store.conversation().turns();
        assert_eq!(turns.len(), contents.len() + 1);
        assert_eq!(turns[0].id(), seed_id);
        let appended: Vec<&str> = turns[1..].iter().map(Turn::content).collect();
        assert_eq!(appended, contents);
    }

    #[test]
    fn blank_content_is_rejected_without_change() {
        let mut store = MessageStore::new();
        store.append(Turn::user("kept")).expect("append");
        let before = store.conversation().clone();

        assert_eq!(store.append(Turn::user("   \n\t")), Err(EmptyContent));
        assert_eq!(store.append(Turn::user("")), Err(EmptyContent));
        assert_eq!(store.conversation(), &before);
    }

    #[test]
    fn append_returns_updated_snapshot() {
        let mut store = MessageStore::new();
        let snapshot = store.append(Turn::user("hi")).expect("append");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.last().map(Turn::content), Some("hi"));
    }

    #[test]
    fn reset_leaves_single_greeting_regardless_of_size() {
        let mut store = MessageStore::new();
        for index in 0..25 {
            store
                .append(Turn::user(format!("message {index}")))
                .expect("append");
        }

        let conversation = store.reset();
        assert_eq!(conversation.len(), 1);
        let only = &conversation.turns()[0];
        assert_eq!(only.role(), Role::Assistant);
        assert_eq!(only.content(), GREETING);
    }

    #[test]
    fn empty_restore_is_reseeded() {
        let conversation = Conversation::from_turns(Vec::new());
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].content(), GREETING);
    }
}
