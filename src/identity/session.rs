// ABOUTME: Session token verification for browser requests
// ABOUTME: Validates provider-issued JWTs from the Authorization header or the session cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use axum::http::{header, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use maas_core::constants::headers::SESSION_COOKIE;
use maas_core::errors::{AppError, AppResult};
use serde::Deserialize;
use tracing::debug;

use super::{join_name, IdentityEvent, IdentityProvider, SessionIdentity, SvixVerifier};
use crate::config::{IdentityConfig, SessionKey};

/// Claims read from a session token
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

/// Identity provider backed by signed session JWTs and Svix webhooks
pub struct SessionTokenProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    webhooks: SvixVerifier,
}

impl SessionTokenProvider {
    /// Build the provider from configuration
    ///
    /// Fails when the RS256 public key is not valid PEM or the webhook
    /// secret is not valid base64.
    pub fn new(config: &IdentityConfig) -> AppResult<Self> {
        let (decoding_key, algorithm) = match &config.session_key {
            SessionKey::Secret(secret) => (
                DecodingKey::from_secret(secret.expose().as_bytes()),
                Algorithm::HS256,
            ),
            SessionKey::PublicKeyPem(pem) => (
                DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::config_invalid(format!("Invalid SESSION_PUBLIC_KEY_PEM: {e}"))
                })?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        validation.leeway = 5;
        if let Some(issuer) = &config.session_issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            decoding_key,
            validation,
            webhooks: SvixVerifier::new(&config.webhook_secret, config.signature_tolerance_secs)?,
        })
    }

    /// The webhook verifier, for signing test fixtures
    #[must_use]
    pub const fn webhook_verifier(&self) -> &SvixVerifier {
        &self.webhooks
    }

    fn verify_token(&self, token: &str) -> AppResult<SessionIdentity> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                debug!(error = %e, "Session token validation failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::auth_invalid("Session expired"),
                    ErrorKind::InvalidIssuer => AppError::auth_invalid("Invalid session issuer"),
                    _ => AppError::auth_invalid("Invalid session token"),
                }
            },
        )?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AppError::auth_invalid("Session token has no subject"));
        }
        let name = claims
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| join_name(claims.first_name.as_deref(), claims.last_name.as_deref()));

        Ok(SessionIdentity {
            external_id: claims.sub,
            email: claims.email.filter(|e| !e.is_empty()),
            name,
        })
    }
}

impl IdentityProvider for SessionTokenProvider {
    fn current_session(&self, headers: &HeaderMap) -> AppResult<Option<SessionIdentity>> {
        session_token(headers)
            .map(|token| self.verify_token(token))
            .transpose()
    }

    fn verify_webhook(&self, payload: &[u8], headers: &HeaderMap) -> AppResult<IdentityEvent> {
        self.webhooks
            .verify(payload, headers, chrono::Utc::now().timestamp())?;
        IdentityEvent::from_payload(payload)
    }
}

/// Session token from `Authorization: Bearer` or the session cookie
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}
