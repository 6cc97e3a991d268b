// ABOUTME: Session status and manual user sync route handlers
// ABOUTME: Reports whether the caller is signed in and creates missing local users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Authentication routes
//!
//! Sessions are issued by the identity provider; this service only
//! verifies them. `POST /api/auth/sync` covers the case where the
//! lifecycle webhook never created the local user.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use maas_core::constants::endpoints::{AUTH_STATUS, AUTH_SYNC};
use maas_core::errors::AppError;
use maas_core::models::UserProfile;
use serde::Serialize;
use serde_json::json;

use crate::context::ServerContext;
use crate::logging::AppLogger;

/// Body of `POST /api/auth/sync`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Local profile
    #[serde(flatten)]
    pub profile: UserProfile,
    /// What happened
    pub message: String,
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(AUTH_STATUS, get(Self::status))
            .route(AUTH_SYNC, post(Self::sync))
            .with_state(context)
    }

    /// `{authenticated: true, userId}` or 401 `{authenticated: false, message}`
    async fn status(State(context): State<Arc<ServerContext>>, headers: HeaderMap) -> Response {
        let message = match context.auth().identity().current_user_id(&headers) {
            Ok(Some(user_id)) => {
                return Json(json!({ "authenticated": true, "userId": user_id })).into_response();
            }
            Ok(None) => "Not authenticated".to_owned(),
            Err(e) => {
                AppLogger::log_auth_event(None, "session_rejected", false);
                e.message
            }
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false, "message": message })),
        )
            .into_response()
    }

    /// Create the local user for the current session if it is missing
    async fn sync(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let session = context.auth().identity().require_session(&headers)?;
        let database = context.data().database();

        if let Some(existing) = database.get_user_by_external_id(&session.external_id).await? {
            return Ok(Json(SyncResponse {
                profile: UserProfile::from(&existing),
                message: "User already exists".to_owned(),
            })
            .into_response());
        }

        let email = session
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input("Session has no verified email address"))?;

        let outcome = database
            .ensure_user(
                &session.external_id,
                Some(email),
                session.name.as_deref(),
                context.config().initial_credit_balance(),
            )
            .await?;
        AppLogger::log_auth_event(Some(&session.external_id), "user_synced", true);

        let message = if outcome.created {
            "User created"
        } else {
            "User already exists"
        };
        Ok(Json(SyncResponse {
            profile: UserProfile::from(&outcome.user),
            message: message.to_owned(),
        })
        .into_response())
    }
}
