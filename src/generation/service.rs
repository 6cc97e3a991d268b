// ABOUTME: Generation lifecycle: charge, dispatch, compensate, complete
// ABOUTME: Owns the create, callback, status and list operations behind the generation routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Generation lifecycle
//!
//! `create` charges one credit and writes the pending generation and its
//! usage entry in a single transaction, then dispatches. Any dispatch
//! failure runs the compensating transaction so the user ends up exactly
//! where they started. `handle_callback` is the only path out of `pending`.

use std::sync::Arc;

use maas_core::errors::{AppError, AppResult, ErrorCode};
use maas_core::models::{Generation, GenerationStatus, User};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::backend::{DispatchRequest, GenerationBackend};
use crate::database::{CallbackOutcome, Database};
use crate::logging::AppLogger;
use crate::notifications::NotificationService;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

const BACKEND_SERVICE: &str = "generation backend";

/// Body posted by the backend when a generation finishes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    /// Correlation id returned at dispatch time
    #[serde(default)]
    pub webhook_call_id: Option<String>,
    /// Workflow JSON, either a string or any JSON value
    #[serde(default)]
    pub json_result: Option<Value>,
    /// `completed` (default) or `failed`
    #[serde(default)]
    pub status: Option<String>,
}

impl CallbackPayload {
    fn call_id(&self) -> AppResult<&str> {
        self.webhook_call_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::missing_field("webhookCallId"))
    }

    fn target_status(&self) -> AppResult<GenerationStatus> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(GenerationStatus::Completed);
        };
        match raw.parse::<GenerationStatus>()? {
            GenerationStatus::Pending => Err(AppError::invalid_input(
                "Callback status must be completed or failed",
            )),
            terminal => Ok(terminal),
        }
    }

    fn serialized_result(&self) -> AppResult<Option<String>> {
        match &self.json_result {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(other) => Ok(Some(serde_json::to_string(other)?)),
        }
    }
}

/// What a callback did
#[derive(Debug)]
pub struct CallbackReceipt {
    /// Generation after the callback
    pub generation: Generation,
    /// The generation was already in the requested status
    pub replayed: bool,
    /// Completion email task, if one was scheduled
    pub notification: Option<JoinHandle<()>>,
}

/// Orchestrates the generation lifecycle
#[derive(Clone)]
pub struct GenerationService {
    database: Database,
    backend: Arc<dyn GenerationBackend>,
    notifications: NotificationService,
    callback_url: String,
    cost: i64,
}

impl GenerationService {
    /// Assemble the service from its collaborators
    #[must_use]
    pub fn new(
        database: Database,
        backend: Arc<dyn GenerationBackend>,
        notifications: NotificationService,
        callback_url: String,
        cost: i64,
    ) -> Self {
        Self {
            database,
            backend,
            notifications,
            callback_url,
            cost,
        }
    }

    /// Local user for an external identity, `RESOURCE_NOT_FOUND` if unsynced
    pub async fn resolve_user(&self, external_id: &str) -> AppResult<User> {
        self.database
            .get_user_by_external_id(external_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Start a generation for the signed-in user
    ///
    /// # Errors
    ///
    /// `INVALID_INPUT` for a blank prompt, `RESOURCE_NOT_FOUND` for an
    /// unknown user, `INSUFFICIENT_CREDITS` when the balance is spent, and
    /// a retryable upstream error when dispatch fails. After a dispatch
    /// failure the charge has been rolled back.
    pub async fn create(&self, external_id: &str, prompt: &str) -> AppResult<Generation> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::invalid_input("Prompt must not be empty"));
        }
        let user = self.resolve_user(external_id).await?;

        let charged = self
            .database
            .charge_and_create_generation(user.id, prompt, self.cost)
            .await?;
        let mut generation = charged.generation;
        AppLogger::log_generation_event(
            &generation.id.to_string(),
            &user.id.to_string(),
            "charged",
        );

        let call_id = self.dispatch(&generation).await?;
        generation.webhook_call_id = Some(call_id);
        AppLogger::log_generation_event(
            &generation.id.to_string(),
            &user.id.to_string(),
            "dispatched",
        );
        Ok(generation)
    }

    /// Send the job and record its correlation id, compensating on failure
    ///
    /// Dispatch and compensation run on their own task so a disconnecting
    /// client cannot leave a charged generation behind.
    async fn dispatch(&self, generation: &Generation) -> AppResult<String> {
        let request = DispatchRequest {
            generation_id: generation.id,
            prompt: generation.prompt.clone(),
            callback_url: self.callback_url.clone(),
        };
        let backend = Arc::clone(&self.backend);
        let database = self.database.clone();
        let cost = self.cost;

        let task = tokio::spawn(async move {
            let result = dispatch_and_record(backend.as_ref(), &database, &request).await;
            if result.is_err() {
                compensate(&database, request.generation_id, cost).await;
            }
            result
        });

        task.await
            .map_err(|e| AppError::internal(format!("Dispatch task failed: {e}")))?
    }

    /// Apply a verified backend callback
    ///
    /// # Errors
    ///
    /// `MISSING_REQUIRED_FIELD` without a correlation id, `INVALID_INPUT`
    /// for an unsupported status, `RESOURCE_NOT_FOUND` for an unknown
    /// correlation id and `STATE_CONFLICT` when a terminal generation is
    /// asked to take a different status.
    pub async fn handle_callback(&self, payload: &CallbackPayload) -> AppResult<CallbackReceipt> {
        let call_id = payload.call_id()?;
        let status = payload.target_status()?;
        let json_result = payload.serialized_result()?;

        let outcome = self
            .database
            .apply_generation_callback(call_id, status, json_result.as_deref())
            .await?;

        let replayed = outcome.is_replay();
        let generation = match outcome {
            CallbackOutcome::Transitioned(g) | CallbackOutcome::Replayed(g) => g,
        };
        AppLogger::log_generation_event(
            &generation.id.to_string(),
            &generation.user_id.to_string(),
            if replayed { "callback_replayed" } else { status.as_str() },
        );

        let notification = if !replayed && status == GenerationStatus::Completed {
            self.notify_completion(&generation).await
        } else {
            None
        };

        Ok(CallbackReceipt {
            generation,
            replayed,
            notification,
        })
    }

    async fn notify_completion(&self, generation: &Generation) -> Option<JoinHandle<()>> {
        match self.database.get_user(generation.user_id).await {
            Ok(Some(owner)) => self.notifications.spawn_generation_complete(&owner, generation),
            Ok(None) => {
                warn!(generation_id = %generation.id, "Owner not found, skipping completion email");
                None
            }
            Err(e) => {
                warn!(generation_id = %generation.id, error = %e, "Could not load owner for completion email");
                None
            }
        }
    }

    /// Snapshot of one of the caller's generations
    pub async fn get(&self, external_id: &str, generation_id: Uuid) -> AppResult<Generation> {
        let user = self.resolve_user(external_id).await?;
        self.database
            .get_generation_for_user(generation_id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Generation {generation_id}")))
    }

    /// The caller's generations, newest first
    pub async fn list(
        &self,
        external_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> AppResult<Vec<Generation>> {
        let user = self.resolve_user(external_id).await?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);
        self.database
            .list_generations_for_user(user.id, limit, offset)
            .await
    }
}

async fn dispatch_and_record(
    backend: &dyn GenerationBackend,
    database: &Database,
    request: &DispatchRequest,
) -> AppResult<String> {
    let call_id = backend.dispatch(request).await?;
    database
        .set_webhook_call_id(request.generation_id, &call_id)
        .await
        .map_err(|e| {
            if e.code == ErrorCode::StateConflict {
                AppError::external_service(
                    BACKEND_SERVICE,
                    format!("returned a duplicate webhookCallId {call_id}"),
                )
            } else {
                e
            }
        })?;
    Ok(call_id)
}

/// Undo the charge for a generation that never reached the backend
async fn compensate(database: &Database, generation_id: Uuid, cost: i64) {
    match database.revert_generation(generation_id, cost).await {
        Ok(true) => info!(%generation_id, "Dispatch failed, generation rolled back and credit refunded"),
        Ok(false) => warn!(%generation_id, "Dispatch failed but generation was no longer pending"),
        Err(e) => error!(%generation_id, error = %e, "Compensating transaction failed"),
    }
}
