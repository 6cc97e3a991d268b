// ABOUTME: Live chat route handler for the automation agent
// ABOUTME: Relays one message, parses the reply into prose and diagrams, reports failures inline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Chat routes
//!
//! The transcript lives in the browser; each call carries one user
//! message and returns the agent turn. When the agent cannot be reached
//! the error body still carries an agent turn with guidance text, flagged
//! `retryable`, so the client can show it in the conversation. Turns are
//! built through a request-scoped [`ChatSession`] so the relayed message
//! and the agent turn share the transcript's diagram bookkeeping.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use maas_core::constants::endpoints::CHAT_MESSAGES;
use maas_core::errors::{AppError, ErrorResponse};
use maas_core::models::ChatMessage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{parse_json, require_user_id};
use crate::agent::parser::{parse_reply, Segment};
use crate::agent::session::ChatSession;
use crate::context::ServerContext;

/// Body of `POST /api/chat/messages`
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// User text
    #[serde(default)]
    pub message: String,
}

/// Agent turn plus its parsed segments
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// The agent turn
    pub message: ChatMessage,
    /// Prose and diagram segments in document order
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
struct UpstreamFailureBody {
    #[serde(flatten)]
    error: ErrorResponse,
    message: ChatMessage,
}

/// Chat routes implementation
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create chat routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(CHAT_MESSAGES, post(Self::send_message))
            .with_state(context)
    }

    async fn send_message(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let user_id = require_user_id(&context, &headers)?;
        let request: SendMessageRequest = parse_json(&body)?;
        let text = request.message.trim();
        if text.is_empty() {
            return Err(AppError::invalid_input("Message must not be empty"));
        }

        let mut session = ChatSession::new();
        session.push_user(text);

        match context.upstream().agent().send_message(text).await {
            Ok(reply) => {
                let message = session.push_agent_reply(&reply).clone();
                let parsed = parse_reply(&reply);
                info!(
                    user_id = %user_id,
                    diagrams = parsed.diagram_count(),
                    "Agent reply relayed"
                );
                Ok(Json(SendMessageResponse {
                    message,
                    segments: parsed.segments,
                })
                .into_response())
            }
            Err(e) if e.code.is_retryable() => {
                warn!(user_id = %user_id, error = %e, "Agent call failed");
                let status =
                    StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
                let body = UpstreamFailureBody {
                    error: ErrorResponse::from(&e),
                    message: session.push_failure(&e.message).clone(),
                };
                Ok((status, Json(body)).into_response())
            }
            Err(e) => Err(e),
        }
    }
}
