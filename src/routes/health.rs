// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Liveness always answers; readiness pings the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use maas_core::constants::endpoints::{HEALTH_CHECK, READINESS_CHECK};
use serde_json::json;
use tracing::warn;

use crate::context::ServerContext;
use crate::logging::SERVICE_NAME;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(HEALTH_CHECK, get(Self::health))
            .route(READINESS_CHECK, get(Self::ready))
            .with_state(context)
    }

    async fn health() -> Json<serde_json::Value> {
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    async fn ready(State(context): State<Arc<ServerContext>>) -> Response {
        match context.data().database().ping().await {
            Ok(()) => Json(json!({
                "status": "ready",
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
            .into_response(),
            Err(e) => {
                warn!(error = %e, "Readiness check failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "status": "not_ready",
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                )
                    .into_response()
            }
        }
    }
}
