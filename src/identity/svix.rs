// ABOUTME: Svix-style webhook signature verification for identity lifecycle events
// ABOUTME: HMAC-SHA256 over id, timestamp and raw body with replay tolerance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Svix signatures
//!
//! Signed content is `"{svix-id}.{svix-timestamp}.{raw body}"`. The secret
//! is base64, optionally prefixed with `whsec_`. The `svix-signature`
//! header is a space separated list of `v1,<base64 signature>` entries and
//! any one of them may match.

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use maas_core::constants::headers::{SVIX_ID, SVIX_SIGNATURE, SVIX_TIMESTAMP};
use maas_core::errors::{AppError, AppResult};
use ring::hmac;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::SecretString;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Verifies Svix-signed webhook requests
#[derive(Clone)]
pub struct SvixVerifier {
    key: Option<hmac::Key>,
    tolerance_secs: i64,
}

impl SvixVerifier {
    /// Build a verifier from the configured secret
    ///
    /// A blank secret yields a verifier that rejects every request with a
    /// configuration error. A secret that is not valid base64 is rejected.
    pub fn new(secret: &SecretString, tolerance_secs: i64) -> AppResult<Self> {
        if secret.is_blank() {
            return Ok(Self {
                key: None,
                tolerance_secs,
            });
        }

        let encoded = secret.expose().trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let raw = STANDARD.decode(encoded).map_err(|e| {
            AppError::config_invalid(format!("IDENTITY_WEBHOOK_SECRET is not valid base64: {e}"))
        })?;

        Ok(Self {
            key: Some(hmac::Key::new(hmac::HMAC_SHA256, &raw)),
            tolerance_secs,
        })
    }

    /// Compute the `v1,<signature>` entry for a message
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AppError::config_missing("IDENTITY_WEBHOOK_SECRET"))?;
        let tag = hmac::sign(key, &signed_content(msg_id, timestamp, payload));
        Ok(format!("{SIGNATURE_VERSION},{}", STANDARD.encode(tag.as_ref())))
    }

    /// Verify the Svix headers of a request against its raw body
    pub fn verify(&self, payload: &[u8], headers: &HeaderMap, now: i64) -> AppResult<()> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AppError::config_missing("IDENTITY_WEBHOOK_SECRET"))?;

        let msg_id = header(headers, SVIX_ID)?;
        let timestamp_raw = header(headers, SVIX_TIMESTAMP)?;
        let signatures = header(headers, SVIX_SIGNATURE)?;

        let timestamp: i64 = timestamp_raw
            .trim()
            .parse()
            .map_err(|_| AppError::invalid_signature("Invalid svix-timestamp header"))?;
        if now.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            debug!(timestamp, now, "Identity webhook outside tolerance window");
            return Err(AppError::invalid_signature(
                "Message timestamp outside the tolerance window",
            ));
        }

        let tag = hmac::sign(key, &signed_content(msg_id, timestamp, payload));
        let expected = STANDARD.encode(tag.as_ref());

        let matched = signatures
            .split(' ')
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .any(|(_, signature)| bool::from(signature.as_bytes().ct_eq(expected.as_bytes())));

        if matched {
            Ok(())
        } else {
            Err(AppError::invalid_signature("No matching signature found"))
        }
    }
}

fn signed_content(msg_id: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let prefix = format!("{msg_id}.{timestamp}.");
    let mut content = Vec::with_capacity(prefix.len() + payload.len());
    content.extend_from_slice(prefix.as_bytes());
    content.extend_from_slice(payload);
    content
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_header(name))
}
