// ABOUTME: Resend HTTP API client for transactional email
// ABOUTME: Implements the EmailSender capability over a pooled reqwest client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::time::Instant;

use async_trait::async_trait;
use maas_core::errors::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{EmailMessage, EmailSender};
use crate::config::{EmailConfig, SecretString};
use crate::logging::AppLogger;
use crate::utils::http_client::upstream_client;

const SERVICE: &str = "email";

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Sends email through `POST {api_url}/emails`
#[derive(Clone)]
pub struct ResendEmailSender {
    api_url: String,
    api_key: SecretString,
    client: Client,
}

impl ResendEmailSender {
    /// Build a sender, `None` when no API key is configured
    #[must_use]
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        let api_key = config.resend_api_key.clone().filter(|k| !k.is_blank())?;
        Some(Self {
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key,
            client: upstream_client(config.timeout_secs),
        })
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(self.api_key.expose())
            .json(&json!({
                "from": message.from,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::external_timeout(SERVICE)
                } else {
                    AppError::external_service(SERVICE, format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_upstream_call(SERVICE, Some(status.as_u16()), elapsed, status.is_success());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                SERVICE,
                format!("responded with status {status}: {body}"),
            ));
        }

        let sent: SendResponse = response.json().await.unwrap_or(SendResponse { id: None });
        debug!(email_id = ?sent.id, subject = %message.subject, "Email accepted");
        Ok(())
    }
}
