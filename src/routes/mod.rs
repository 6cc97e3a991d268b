// ABOUTME: Route module organization for the MaaS Workflow Creator HTTP API
// ABOUTME: One router per domain plus small shared helpers for session and body handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! HTTP routes
//!
//! Each domain module exposes a `*Routes::routes(context)` constructor
//! returning a stateless router. Handlers stay thin and delegate to the
//! services held in [`ServerContext`].

/// Agent connectivity diagnostics
pub mod agent_probe;
/// Session status and manual user sync
pub mod auth;
/// Live chat with the automation agent
pub mod chat;
/// Generation lifecycle endpoints
pub mod generations;
/// Liveness and readiness
pub mod health;
/// Current user profile
pub mod users;
/// Inbound webhooks from the backend and the identity provider
pub mod webhooks;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::http::HeaderMap;
use axum::Router;
use maas_core::errors::{AppError, AppResult};
use serde::de::DeserializeOwned;

pub use agent_probe::AgentProbeRoutes;
pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use generations::GenerationRoutes;
pub use health::HealthRoutes;
pub use users::UserRoutes;
pub use webhooks::WebhookRoutes;

use crate::context::ServerContext;

/// Every API router merged together
pub fn api_router(context: &Arc<ServerContext>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(context)))
        .merge(AuthRoutes::routes(Arc::clone(context)))
        .merge(UserRoutes::routes(Arc::clone(context)))
        .merge(ChatRoutes::routes(Arc::clone(context)))
        .merge(GenerationRoutes::routes(Arc::clone(context)))
        .merge(WebhookRoutes::routes(Arc::clone(context)))
        .merge(AgentProbeRoutes::routes(Arc::clone(context)))
}

/// External id of the signed-in caller or `AUTH_REQUIRED`
pub(crate) fn require_user_id(context: &ServerContext, headers: &HeaderMap) -> AppResult<String> {
    Ok(context
        .auth()
        .identity()
        .require_session(headers)?
        .external_id)
}

/// Decode a JSON body, reporting malformed input in the API error format
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_input(format!("Invalid JSON body: {e}")))
}

/// Unwrap a query string, reporting malformed parameters in the API error format
pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|e| AppError::invalid_input(format!("Invalid query string: {}", e.body_text())))
}
