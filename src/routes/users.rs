// ABOUTME: Current user profile route handler
// ABOUTME: Returns id, email, name, credit balance and creation time for the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use maas_core::constants::endpoints::USERS_ME;
use maas_core::errors::AppError;
use maas_core::models::UserProfile;

use super::require_user_id;
use crate::context::ServerContext;

/// User routes implementation
pub struct UserRoutes;

impl UserRoutes {
    /// Create user routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(USERS_ME, get(Self::me))
            .with_state(context)
    }

    async fn me(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
    ) -> Result<Json<UserProfile>, AppError> {
        let external_id = require_user_id(&context, &headers)?;
        let user = context
            .data()
            .database()
            .get_user_by_external_id(&external_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(Json(UserProfile::from(&user)))
    }
}
