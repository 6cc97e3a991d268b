// ABOUTME: In-memory chat transcript with per-message diagram access
// ABOUTME: Records user turns, parsed agent replies and inline failure notices
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Session-scoped chat transcript
//!
//! The HTTP API is stateless, so the chat route keeps a transcript only for
//! the duration of one request. Embedders that hold a conversation open
//! (a desktop shell or a test harness) keep a [`ChatSession`] alive and use
//! it to address, replace and regenerate individual diagrams.

use maas_core::errors::{AppError, AppResult};
use maas_core::models::{ChatMessage, MessageRole};
use uuid::Uuid;

use super::parser::{fence, parse_reply, ParsedReply};

/// Transcript of one chat session, never persisted
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every turn in order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Look up a turn by id
    #[must_use]
    pub fn message(&self, message_id: Uuid) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::user(content))
    }

    /// Parse and append an agent reply
    pub fn push_agent_reply(&mut self, reply: &str) -> &ChatMessage {
        let parsed = parse_reply(reply);
        self.push(agent_message(reply, &parsed))
    }

    /// Append an inline notice for a failed agent call
    pub fn push_failure(&mut self, reason: &str) -> &ChatMessage {
        self.push(ChatMessage::upstream_failure(reason))
    }

    /// Most recent diagram across the whole session
    #[must_use]
    pub fn latest_diagram(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.diagrams.last().map(String::as_str))
    }

    /// Diagram `index` of message `message_id`
    pub fn diagram(&self, message_id: Uuid, index: usize) -> AppResult<&str> {
        let message = self
            .message(message_id)
            .ok_or_else(|| AppError::not_found(format!("Message {message_id}")))?;
        message
            .diagrams
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| AppError::not_found(format!("Diagram {index} of message {message_id}")))
    }

    /// Re-extract diagram `index` from the stored message content
    ///
    /// Used to re-render a single diagram without touching its siblings.
    pub fn regenerate_diagram(&self, message_id: Uuid, index: usize) -> AppResult<String> {
        let message = self
            .message(message_id)
            .ok_or_else(|| AppError::not_found(format!("Message {message_id}")))?;
        parse_reply(&message.content)
            .diagrams()
            .nth(index)
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::not_found(format!("Diagram {index} of message {message_id}")))
    }

    /// Replace the source of one diagram in an agent message
    ///
    /// Only the fenced block of that diagram is rewritten; the rest of the
    /// content is left byte for byte.
    pub fn replace_diagram(
        &mut self,
        message_id: Uuid,
        index: usize,
        source: &str,
    ) -> AppResult<&ChatMessage> {
        let position = self
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| AppError::not_found(format!("Message {message_id}")))?;
        let message = &mut self.messages[position];
        if message.role != MessageRole::Agent {
            return Err(AppError::invalid_input("Only agent messages carry diagrams"));
        }

        let span = parse_reply(&message.content)
            .diagram_span(index)
            .ok_or_else(|| AppError::not_found(format!("Diagram {index} of message {message_id}")))?;

        let mut content = String::with_capacity(message.content.len() + source.len());
        content.push_str(&message.content[..span.start]);
        content.push_str(&fence(source.trim()));
        content.push_str(&message.content[span.end..]);

        let parsed = parse_reply(&content);
        message.diagrams = parsed.diagrams().map(ToOwned::to_owned).collect();
        message.content = content;
        Ok(&self.messages[position])
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        let last = self.messages.len() - 1;
        &self.messages[last]
    }
}

/// Build the agent turn for a parsed reply
#[must_use]
pub fn agent_message(reply: &str, parsed: &ParsedReply) -> ChatMessage {
    ChatMessage::agent(reply, parsed.diagrams().map(ToOwned::to_owned).collect())
}
