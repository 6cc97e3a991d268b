// ABOUTME: Inbound webhook handlers for backend callbacks and identity lifecycle events
// ABOUTME: Each request passes its verification gate before the body is interpreted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Webhook routes
//!
//! Both handlers read the raw body: the identity signature covers the
//! exact bytes, and the callback gate must run before any parsing.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use maas_core::constants::endpoints::{GENERATION_CALLBACK, IDENTITY_WEBHOOK};
use maas_core::errors::{AppError, AppResult};
use maas_core::models::GenerationStatus;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::parse_json;
use crate::context::ServerContext;
use crate::generation::CallbackPayload;
use crate::identity::{IdentityEvent, IdentityUser};
use crate::logging::AppLogger;

/// Body returned to the generation backend
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResponse {
    /// Always `true`
    pub success: bool,
    /// Generation the callback resolved to
    pub generation_id: Uuid,
    /// Status after the callback
    pub status: GenerationStatus,
    /// The callback repeated an already applied status
    pub replayed: bool,
}

/// Webhook routes implementation
pub struct WebhookRoutes;

impl WebhookRoutes {
    /// Create webhook routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(GENERATION_CALLBACK, post(Self::generation_callback))
            .route(IDENTITY_WEBHOOK, post(Self::identity_event))
            .with_state(context)
    }

    async fn generation_callback(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Json<CallbackResponse>, AppError> {
        if let Err(e) = context.auth().callback_gate().verify_headers(&headers) {
            AppLogger::log_webhook_event("backend", "generation_callback", false);
            return Err(e);
        }
        let payload: CallbackPayload = parse_json(&body)?;

        let receipt = context
            .upstream()
            .generations()
            .handle_callback(&payload)
            .await?;
        AppLogger::log_webhook_event("backend", "generation_callback", true);

        Ok(Json(CallbackResponse {
            success: true,
            generation_id: receipt.generation.id,
            status: receipt.generation.status,
            replayed: receipt.replayed,
        }))
    }

    async fn identity_event(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Json<Value>, AppError> {
        let event = match context.auth().identity().verify_webhook(&body, &headers) {
            Ok(event) => event,
            Err(e) => {
                AppLogger::log_webhook_event("identity", "unverified", false);
                return Err(e);
            }
        };
        let event_type = event.event_type().to_owned();
        Self::apply_identity_event(&context, event).await?;
        AppLogger::log_webhook_event("identity", &event_type, true);

        Ok(Json(json!({ "success": true, "event": event_type })))
    }

    async fn apply_identity_event(context: &ServerContext, event: IdentityEvent) -> AppResult<()> {
        match event {
            IdentityEvent::UserCreated(user) => {
                let outcome = Self::upsert(context, &user).await?;
                if outcome.created {
                    info!(external_id = %user.external_id, "User created from identity event");
                    context
                        .notification()
                        .notifications()
                        .spawn_welcome(&outcome.user);
                }
            }
            IdentityEvent::UserUpdated(user) => {
                Self::upsert(context, &user).await?;
                info!(external_id = %user.external_id, "User updated from identity event");
            }
            IdentityEvent::UserDeleted { external_id } => {
                let deleted = context
                    .data()
                    .database()
                    .delete_user_by_external_id(&external_id)
                    .await?;
                info!(%external_id, deleted, "User deletion event processed");
            }
            IdentityEvent::Ignored { event_type } => {
                info!(%event_type, "Ignoring identity event");
            }
        }
        Ok(())
    }

    async fn upsert(
        context: &ServerContext,
        user: &IdentityUser,
    ) -> AppResult<crate::database::UserUpsert> {
        context
            .data()
            .database()
            .upsert_user(
                &user.external_id,
                user.email.as_deref(),
                user.name.as_deref(),
                context.config().initial_credit_balance(),
            )
            .await
    }
}
