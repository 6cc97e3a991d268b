// ABOUTME: Connectivity diagnostics for the automation agent webhook
// ABOUTME: GET checks reachability, POST sends a test message and returns the raw reply
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use maas_core::constants::endpoints::AGENT_PROBE;
use maas_core::constants::messages::DEFAULT_PROBE_MESSAGE;
use maas_core::errors::AppError;
use serde::Deserialize;

use super::parse_json;
use crate::agent::ProbeReport;
use crate::context::ServerContext;

/// Optional body of `POST /api/agent/probe`
#[derive(Debug, Default, Deserialize)]
pub struct ProbeRequest {
    /// Text to send, a fixed test message when absent
    #[serde(default)]
    pub message: Option<String>,
}

/// Agent probe routes implementation
pub struct AgentProbeRoutes;

impl AgentProbeRoutes {
    /// Create probe routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(AGENT_PROBE, get(Self::reachability).post(Self::test_message))
            .with_state(context)
    }

    async fn reachability(
        State(context): State<Arc<ServerContext>>,
    ) -> Result<Json<ProbeReport>, AppError> {
        let report = context.upstream().agent().probe_reachability().await?;
        Ok(Json(report))
    }

    async fn test_message(
        State(context): State<Arc<ServerContext>>,
        body: Bytes,
    ) -> Result<Json<ProbeReport>, AppError> {
        let request: ProbeRequest = if body.is_empty() {
            ProbeRequest::default()
        } else {
            parse_json(&body)?
        };
        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PROBE_MESSAGE);

        let report = context.upstream().agent().probe_message(message).await?;
        Ok(Json(report))
    }
}
