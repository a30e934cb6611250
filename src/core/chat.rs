//! One conversation plus the bookkeeping for its single in-flight dispatch.
//!
//! A send is split in three steps so the conversation is not borrowed while
//! the remote call is outstanding:
//!
//! 1. [`ChatSession::begin_send`] appends the user turn and snapshots the
//!    window into a [`PendingDispatch`].
//! 2. [`PendingDispatch::run`] performs the dispatch; it resolves early to
//!    `None` when the pending dispatch is cancelled.
//! 3. [`ChatSession::complete`] appends the reply, or the apology turn on
//!    failure, unless the dispatch was cancelled or the conversation was
//!    reset in the meantime.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ChatMessage;
use crate::core::conversation::{Conversation, EmptyContent, MessageStore};
use crate::core::dispatch::{DispatchError, DispatchResult, Dispatcher, Reply};
use crate::core::message::Turn;
use crate::core::settings::SessionSettings;
use crate::core::window::{window, DEFAULT_WINDOW_LIMIT};

/// Assistant turn appended when a dispatch fails.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please check your API key and try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    EmptyContent,
    /// A previous dispatch for this conversation has not completed yet.
    DispatchInFlight,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::EmptyContent => write!(f, "{}", EmptyContent),
            SendError::DispatchInFlight => {
                write!(f, "a reply is still pending for this conversation")
            }
        }
    }
}

impl std::error::Error for SendError {}

impl From<EmptyContent> for SendError {
    fn from(_: EmptyContent) -> Self {
        SendError::EmptyContent
    }
}

/// A dispatch that has been prepared but not yet applied to the conversation.
#[derive(Debug)]
pub struct PendingDispatch {
    history: Vec<ChatMessage>,
    sequence: u64,
    user_turn_id: String,
    cancel_token: CancellationToken,
}

impl PendingDispatch {
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn user_turn_id(&self) -> &str {
        &self.user_turn_id
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Run the dispatch, giving up as soon as the pending dispatch is
    /// cancelled. A cancelled run yields `None`.
    pub async fn run(
        &self,
        dispatcher: &Dispatcher,
        settings: &SessionSettings,
    ) -> Option<DispatchResult> {
        if self.cancel_token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => None,
            result = dispatcher.dispatch(&self.history, settings) => Some(result),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The reply was appended as an assistant turn.
    Replied(Reply),
    /// The dispatch failed and the apology turn was appended.
    Failed(DispatchError),
    /// The conversation moved on (reset or cancel); nothing was appended.
    Discarded,
}

#[derive(Debug)]
pub struct ChatSession {
    store: MessageStore,
    window_limit: usize,
    next_sequence: u64,
    in_flight: Option<(u64, CancellationToken)>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(MessageStore::new())
    }
}

impl ChatSession {
    pub fn new(store: MessageStore) -> Self {
        Self {
            store,
            window_limit: DEFAULT_WINDOW_LIMIT,
            next_sequence: 0,
            in_flight: None,
        }
    }

    pub fn with_window_limit(mut self, limit: usize) -> Self {
        self.window_limit = limit;
        self
    }

    pub fn window_limit(&self) -> usize {
        self.window_limit
    }

    pub fn conversation(&self) -> &Conversation {
        self.store.conversation()
    }

    pub fn is_dispatch_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn begin_send(&mut self, text: &str) -> Result<PendingDispatch, SendError> {
        if self.in_flight.is_some() {
            return Err(SendError::DispatchInFlight);
        }

        let turn = Turn::user(text);
        let user_turn_id = turn.id().to_string();
        let conversation = self.store.append(turn)?;
        let history = window(conversation, self.window_limit);

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let cancel_token = CancellationToken::new();
        self.in_flight = Some((sequence, cancel_token.clone()));
        debug!(
            sequence,
            window = history.len(),
            "User turn appended; dispatch pending"
        );

        Ok(PendingDispatch {
            history,
            sequence,
            user_turn_id,
            cancel_token,
        })
    }

    /// Apply a finished dispatch. `None` means the run was cancelled.
    pub fn complete(
        &mut self,
        pending: PendingDispatch,
        result: Option<DispatchResult>,
    ) -> Completion {
        let is_current = matches!(&self.in_flight, Some((sequence, _)) if *sequence == pending.sequence);
        if is_current {
            self.in_flight = None;
        }

        let result = match result {
            Some(result) if is_current && !pending.is_cancelled() => result,
            _ => {
                info!(
                    sequence = pending.sequence,
                    "Dispatch was cancelled or superseded; reply discarded"
                );
                return Completion::Discarded;
            }
        };

        match result {
            Ok(reply) => {
                self.push_assistant(reply.content.clone());
                Completion::Replied(reply)
            }
            Err(err) => {
                self.push_assistant(APOLOGY.to_string());
                Completion::Failed(err)
            }
        }
    }

    /// Cancel the outstanding dispatch, if any. Its result will be discarded.
    pub fn cancel_pending(&mut self) -> bool {
        match self.in_flight.take() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) -> &Conversation {
        self.cancel_pending();
        self.store.reset()
    }

    /// Convenience wrapper running all three steps back to back.
    pub async fn send(
        &mut self,
        dispatcher: &Dispatcher,
        settings: &SessionSettings,
        text: &str,
    ) -> Result<Completion, SendError> {
        let pending = self.begin_send(text)?;
        let result = pending.run(dispatcher, settings).await;
        Ok(self.complete(pending, result))
    }

    fn push_assistant(&mut self, content: String) {
        // Provider replies can be blank; keep the turn visible anyway.
        let content = if content.trim().is_empty() {
            "(empty response)".to_string()
        } else {
            content
        };
        let appended = self.store.append(Turn::assistant(content)).is_ok();
        debug_assert!(appended, "non-blank assistant turn is always accepted");
    }
}
