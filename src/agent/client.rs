// ABOUTME: HTTP client for the automation agent webhook
// ABOUTME: Sends chat messages, normalises reply bodies and runs connectivity probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::time::Instant;

use maas_core::errors::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::logging::AppLogger;
use crate::utils::http_client::{failure_reason, upstream_client};

const SERVICE: &str = "agent";

/// Outcome of a successful connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    /// Always `success`
    pub status: String,
    /// HTTP status returned by the agent
    pub status_code: u16,
    /// Human-readable summary
    pub message: String,
    /// Body returned by the agent
    pub response: Value,
}

/// Client for the agent webhook
#[derive(Clone)]
pub struct AgentClient {
    webhook_url: String,
    chat_client: Client,
    probe_client: Client,
}

impl AgentClient {
    /// Build pooled clients with the configured timeouts
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            webhook_url: config.webhook_url.clone(),
            chat_client: upstream_client(config.timeout_secs),
            probe_client: upstream_client(config.probe_timeout_secs),
        }
    }

    /// Agent endpoint
    #[must_use]
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Send one chat message and return the reply text
    pub async fn send_message(&self, message: &str) -> AppResult<String> {
        let started = Instant::now();
        let response = self
            .chat_client
            .post(&self.webhook_url)
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|e| {
                AppLogger::log_upstream_call(SERVICE, None, elapsed_ms(started), false);
                upstream_error(&e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| upstream_error(&e))?;
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

        debug!(bytes = body.len(), "Agent reply received");
        Ok(extract_reply_text(&body))
    }

    /// Check the agent answers a plain GET
    pub async fn probe_reachability(&self) -> AppResult<ProbeReport> {
        let request = self.probe_client.get(&self.webhook_url);
        self.probe(request, "Webhook is reachable").await
    }

    /// Send a test message with the full chat timeout
    pub async fn probe_message(&self, message: &str) -> AppResult<ProbeReport> {
        let request = self
            .chat_client
            .post(&self.webhook_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&json!({ "message": message }));
        self.probe(request, "Webhook responded successfully").await
    }

    async fn probe(&self, request: reqwest::RequestBuilder, summary: &str) -> AppResult<ProbeReport> {
        let response = request.send().await.map_err(|e| {
            warn!(url = %self.webhook_url, "Agent probe failed: {e}");
            upstream_error(&e).with_details(json!({
                "message": failure_reason(&e),
                "isNetworkError": e.is_connect() || e.is_timeout(),
            }))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| upstream_error(&e))?;
        let data = serde_json::from_str(&body).unwrap_or(Value::String(body));

        if !status.is_success() {
            warn!(url = %self.webhook_url, status = status.as_u16(), "Agent probe rejected");
            return Err(AppError::external_service(
                SERVICE,
                format!("responded with status {status}"),
            )
            .with_details(json!({
                "status": status.as_u16(),
                "statusText": status.canonical_reason().unwrap_or_default(),
                "data": data,
                "isNetworkError": false,
            })));
        }

        Ok(ProbeReport {
            status: "success".to_owned(),
            status_code: status.as_u16(),
            message: summary.to_owned(),
            response: data,
        })
    }
}

/// Pull the reply text out of an agent response body
///
/// Accepts an object with `text` or `output`, an array whose first element
/// is such an object, a JSON string, or falls back to the raw body.
#[must_use]
pub fn extract_reply_text(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };
    let candidate = match &value {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    match candidate {
        Value::String(text) => text.clone(),
        Value::Object(map) => ["text", "output"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or_else(|| body.to_owned(), ToOwned::to_owned),
        _ => body.to_owned(),
    }
}

fn upstream_error(error: &reqwest::Error) -> AppError {
    warn!("Agent request failed: {error}");
    if error.is_timeout() {
        AppError::external_timeout(SERVICE)
    } else {
        AppError::external_service(SERVICE, failure_reason(error))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
