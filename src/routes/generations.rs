// ABOUTME: Generation lifecycle route handlers
// ABOUTME: Create (charge and dispatch), list and status read, scoped to the signed-in owner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use maas_core::constants::endpoints::{GENERATIONS, GENERATION_BY_ID};
use maas_core::errors::AppError;
use maas_core::models::Generation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_json, parse_query, require_user_id};
use crate::context::ServerContext;

/// Body of `POST /api/generations`
#[derive(Debug, Deserialize)]
pub struct CreateGenerationRequest {
    /// What the workflow should do
    #[serde(default)]
    pub prompt: String,
}

/// Query of `GET /api/generations`
#[derive(Debug, Default, Deserialize)]
pub struct ListGenerationsQuery {
    /// Page size
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

/// Body of `GET /api/generations`
#[derive(Debug, Serialize)]
pub struct GenerationListResponse {
    /// Newest first
    pub generations: Vec<Generation>,
    /// Number returned
    pub count: usize,
}

/// Generation routes implementation
pub struct GenerationRoutes;

impl GenerationRoutes {
    /// Create generation routes
    pub fn routes(context: Arc<ServerContext>) -> Router {
        Router::new()
            .route(GENERATIONS, get(Self::list).post(Self::create))
            .route(GENERATION_BY_ID, get(Self::get))
            .with_state(context)
    }

    async fn create(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let external_id = require_user_id(&context, &headers)?;
        let request: CreateGenerationRequest = parse_json(&body)?;
        let generation = context
            .upstream()
            .generations()
            .create(&external_id, &request.prompt)
            .await?;
        Ok((StatusCode::CREATED, Json(generation)).into_response())
    }

    async fn list(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
        query: Result<Query<ListGenerationsQuery>, QueryRejection>,
    ) -> Result<Json<GenerationListResponse>, AppError> {
        let external_id = require_user_id(&context, &headers)?;
        let query = parse_query(query)?;
        let generations = context
            .upstream()
            .generations()
            .list(&external_id, query.limit, query.offset)
            .await?;
        Ok(Json(GenerationListResponse {
            count: generations.len(),
            generations,
        }))
    }

    async fn get(
        State(context): State<Arc<ServerContext>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Json<Generation>, AppError> {
        let external_id = require_user_id(&context, &headers)?;
        let generation_id = Uuid::parse_str(&id)
            .map_err(|_| AppError::not_found(format!("Generation {id}")))?;
        let generation = context
            .upstream()
            .generations()
            .get(&external_id, generation_id)
            .await?;
        Ok(Json(generation))
    }
}
