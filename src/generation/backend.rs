// ABOUTME: Outbound dispatch of generation jobs to the workflow backend
// ABOUTME: GenerationBackend capability plus the authenticated HTTP implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::time::Instant;

use async_trait::async_trait;
use maas_core::constants::headers::WEBHOOK_SECRET;
use maas_core::errors::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::config::{BackendConfig, SecretString};
use crate::logging::AppLogger;
use crate::utils::http_client::{failure_reason, upstream_client};

const SERVICE: &str = "generation backend";

/// Body sent to the backend for one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    /// Generation being produced
    pub generation_id: Uuid,
    /// User prompt
    pub prompt: String,
    /// Where the backend reports completion
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DispatchResponse {
    #[serde(default)]
    webhook_call_id: Option<String>,
}

/// Capability to hand a generation to the backend
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Dispatch the job and return the backend's correlation id
    async fn dispatch(&self, request: &DispatchRequest) -> AppResult<String>;
}

/// Dispatches over HTTP with the shared secret header
#[derive(Clone)]
pub struct HttpGenerationBackend {
    webhook_url: String,
    secret: SecretString,
    client: Client,
}

impl HttpGenerationBackend {
    /// Build from configuration
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            webhook_url: config.webhook_url.clone(),
            secret: config.webhook_secret.clone(),
            client: upstream_client(config.dispatch_timeout_secs),
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn dispatch(&self, request: &DispatchRequest) -> AppResult<String> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.webhook_url)
            .header(WEBHOOK_SECRET, self.secret.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppLogger::log_upstream_call(SERVICE, None, elapsed_ms(started), false);
                warn!("Generation dispatch failed: {e}");
                if e.is_timeout() {
                    AppError::external_timeout(SERVICE)
                } else {
                    AppError::external_service(SERVICE, failure_reason(&e))
                }
            })?;

        let status = response.status();
        AppLogger::log_upstream_call(
            SERVICE,
            Some(status.as_u16()),
            elapsed_ms(started),
            status.is_success(),
        );
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!("responded with status {status}"),
            )
            .with_details(json!({ "statusCode": status.as_u16() })));
        }

        let body: DispatchResponse = response.json().await.map_err(|e| {
            warn!("Generation backend response unreadable: {e}");
            AppError::external_service(SERVICE, failure_reason(&e))
        })?;

        body.webhook_call_id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::external_service(SERVICE, "response carried no webhookCallId"))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_request_wire_shape() {
        let id = Uuid::new_v4();
        let request = DispatchRequest {
            generation_id: id,
            prompt: "Create a 3-step onboarding flow".to_owned(),
            callback_url: "http://localhost:3000/api/webhook/generation-callback".to_owned(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationId"], id.to_string());
        assert_eq!(
            value["callbackUrl"],
            "http://localhost:3000/api/webhook/generation-callback"
        );
    }
}
