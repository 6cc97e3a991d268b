// ABOUTME: In-memory chat turn exchanged with the automation agent
// ABOUTME: Carries the role, the raw content and every diagram extracted from it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Typed by the user
    User,
    /// Returned by the agent
    Agent,
}

/// A single chat turn, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message id, used to address a diagram for regeneration
    pub id: Uuid,
    /// Author
    pub role: MessageRole,
    /// Raw text as typed or received
    pub content: String,
    /// Diagram sources in document order
    #[serde(default)]
    pub diagrams: Vec<String>,
    /// Set when the turn reports an upstream failure the user may retry
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// User turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content.into(), Vec::new())
    }

    /// Agent turn with its extracted diagrams
    #[must_use]
    pub fn agent(content: impl Into<String>, diagrams: Vec<String>) -> Self {
        Self::with_role(MessageRole::Agent, content.into(), diagrams)
    }

    /// Inline agent turn describing a failed upstream call
    #[must_use]
    pub fn upstream_failure(reason: &str) -> Self {
        let content = format!(
            "Sorry, I couldn't reach the workflow agent ({reason}).\n\n\
             Please check that:\n\
             - the agent webhook is running and reachable\n\
             - your network connection is working\n\n\
             Then try sending your message again."
        );
        let mut message = Self::with_role(MessageRole::Agent, content, Vec::new());
        message.retryable = true;
        message
    }

    /// First diagram, if any
    #[must_use]
    pub fn first_diagram(&self) -> Option<&str> {
        self.diagrams.first().map(String::as_str)
    }

    fn with_role(role: MessageRole, content: String, diagrams: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            diagrams,
            retryable: false,
            created_at: Utc::now(),
        }
    }
}
