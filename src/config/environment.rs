// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into typed, validated server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Environment-based configuration management
//!
//! Webhook secrets and upstream URLs are required: loading fails when they
//! are absent so that neither verification gate can run open.

use std::env;
use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use maas_core::constants::{credits, email, network, timeouts};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational
    #[default]
    Info,
    /// Debugging
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// A secret value that never shows up in `Debug` output or logs
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty after trimming
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    pub fn parse_url(s: &str) -> Result<Self> {
        let path_str = s
            .strip_prefix("sqlite://")
            .or_else(|| s.strip_prefix("sqlite:"))
            .ok_or_else(|| anyhow::anyhow!("Unsupported DATABASE_URL (expected sqlite:): {s}"))?;
        if path_str == ":memory:" {
            Ok(Self::Memory)
        } else if path_str.is_empty() {
            Err(anyhow::anyhow!("DATABASE_URL has an empty path"))
        } else {
            Ok(Self::SQLite {
                path: PathBuf::from(path_str),
            })
        }
    }

    /// Convert to a connection string understood by sqlx
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/maas.db"),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins, `*` for any
    pub allowed_origins: Vec<String>,
}

/// Key used to verify session tokens
#[derive(Debug, Clone)]
pub enum SessionKey {
    /// HS256 shared secret
    Secret(SecretString),
    /// RS256 public key in PEM form
    PublicKeyPem(String),
}

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Svix signing secret for lifecycle events (`whsec_` prefix optional)
    pub webhook_secret: SecretString,
    /// Session token verification key
    pub session_key: SessionKey,
    /// Expected `iss` claim, if any
    pub session_issuer: Option<String>,
    /// Accepted clock skew for signed events
    pub signature_tolerance_secs: i64,
}

/// Generation backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Dispatch endpoint
    pub webhook_url: String,
    /// Shared secret sent on dispatch and expected on callbacks
    pub webhook_secret: SecretString,
    /// Dispatch timeout
    pub dispatch_timeout_secs: u64,
}

/// Automation agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Agent webhook endpoint
    pub webhook_url: String,
    /// Live chat timeout
    pub timeout_secs: u64,
    /// Connectivity probe timeout
    pub probe_timeout_secs: u64,
}

/// Transactional email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key; email is disabled without it
    pub resend_api_key: Option<SecretString>,
    /// Resend API base URL
    pub api_url: String,
    /// Sender for onboarding mail
    pub from: String,
    /// Sender for generation notifications
    pub notifications_from: String,
    /// Send a welcome email when a user is created
    pub send_welcome_email: bool,
    /// Email call timeout
    pub timeout_secs: u64,
}

impl EmailConfig {
    /// Whether email delivery is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.resend_api_key.as_ref().is_some_and(|k| !k.is_blank())
    }
}

/// Credit accounting configuration
#[derive(Debug, Clone, Copy)]
pub struct CreditsConfig {
    /// Balance granted to new users
    pub initial_balance: i64,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Public base URL used for callbacks and email links
    pub app_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Default log level
    pub log_level: LogLevel,
    /// Database settings
    pub database: DatabaseConfig,
    /// CORS settings
    pub cors: CorsConfig,
    /// Identity provider settings
    pub identity: IdentityConfig,
    /// Generation backend settings
    pub backend: BackendConfig,
    /// Automation agent settings
    pub agent: AgentConfig,
    /// Email settings
    pub email: EmailConfig,
    /// Credit settings
    pub credits: CreditsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let resend_api_key = optional_env("RESEND_API_KEY").map(SecretString::new);
        if resend_api_key.is_none() {
            warn!("RESEND_API_KEY not set, email notifications are disabled");
        }

        let config = Self {
            host: env_var_or("HOST", network::DEFAULT_HOST),
            http_port: env_var_or("HTTP_PORT", &network::DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            app_url: env_var_or("APP_URL", network::DEFAULT_APP_URL)
                .trim_end_matches('/')
                .to_owned(),
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            log_level: LogLevel::from_str_or_default(&env_var_or("RUST_LOG", "info")),

            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or(
                    "DATABASE_URL",
                    network::DEFAULT_DATABASE_URL,
                ))
                .context("Invalid DATABASE_URL value")?,
            },

            cors: CorsConfig {
                allowed_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
            },

            identity: IdentityConfig {
                webhook_secret: SecretString::new(required_env("IDENTITY_WEBHOOK_SECRET")?),
                session_key: session_key_from_env()?,
                session_issuer: optional_env("SESSION_ISSUER"),
                signature_tolerance_secs: timeouts::SIGNATURE_TOLERANCE_SECS,
            },

            backend: BackendConfig {
                webhook_url: required_env("BACKEND_WEBHOOK_URL")?,
                webhook_secret: SecretString::new(required_env("BACKEND_WEBHOOK_SECRET")?),
                dispatch_timeout_secs: env_var_or(
                    "DISPATCH_TIMEOUT_SECS",
                    &timeouts::DISPATCH_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid DISPATCH_TIMEOUT_SECS value")?,
            },

            agent: AgentConfig {
                webhook_url: required_env("AGENT_WEBHOOK_URL")?,
                timeout_secs: env_var_or(
                    "AGENT_TIMEOUT_SECS",
                    &timeouts::AGENT_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid AGENT_TIMEOUT_SECS value")?,
                probe_timeout_secs: env_var_or(
                    "PROBE_TIMEOUT_SECS",
                    &timeouts::PROBE_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid PROBE_TIMEOUT_SECS value")?,
            },

            email: EmailConfig {
                resend_api_key,
                api_url: env_var_or("RESEND_API_URL", email::DEFAULT_RESEND_API_URL)
                    .trim_end_matches('/')
                    .to_owned(),
                from: env_var_or("EMAIL_FROM", email::DEFAULT_FROM),
                notifications_from: env_var_or(
                    "EMAIL_NOTIFICATIONS_FROM",
                    email::DEFAULT_NOTIFICATIONS_FROM,
                ),
                send_welcome_email: env_var_or("SEND_WELCOME_EMAIL", "true")
                    .parse()
                    .context("Invalid SEND_WELCOME_EMAIL value")?,
                timeout_secs: timeouts::EMAIL_TIMEOUT_SECS,
            },

            credits: CreditsConfig {
                initial_balance: env_var_or(
                    "INITIAL_CREDIT_BALANCE",
                    &credits::DEFAULT_INITIAL_BALANCE.to_string(),
                )
                .parse()
                .context("Invalid INITIAL_CREDIT_BALANCE value")?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.identity.webhook_secret.is_blank() {
            return Err(anyhow::anyhow!("IDENTITY_WEBHOOK_SECRET cannot be empty"));
        }
        if self.backend.webhook_secret.is_blank() {
            return Err(anyhow::anyhow!("BACKEND_WEBHOOK_SECRET cannot be empty"));
        }
        if let SessionKey::Secret(secret) = &self.identity.session_key {
            if secret.is_blank() {
                return Err(anyhow::anyhow!("SESSION_JWT_SECRET cannot be empty"));
            }
        }

        for (name, value) in [
            ("APP_URL", &self.app_url),
            ("BACKEND_WEBHOOK_URL", &self.backend.webhook_url),
            ("AGENT_WEBHOOK_URL", &self.agent.webhook_url),
        ] {
            url::Url::parse(value).with_context(|| format!("Invalid {name} value: {value}"))?;
        }

        if self.credits.initial_balance < 0 {
            return Err(anyhow::anyhow!("INITIAL_CREDIT_BALANCE cannot be negative"));
        }

        if self.agent.timeout_secs == 0
            || self.agent.probe_timeout_secs == 0
            || self.backend.dispatch_timeout_secs == 0
        {
            return Err(anyhow::anyhow!("Outbound timeouts must be at least one second"));
        }

        if self.environment.is_production() && self.cors.allowed_origins.iter().any(|o| o == "*")
        {
            warn!("CORS allows any origin in production");
        }

        Ok(())
    }

    /// URL the generation backend calls back on completion
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.app_url, maas_core::constants::endpoints::GENERATION_CALLBACK)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "MaaS Workflow Creator Configuration:\n\
             - Bind: {}:{}\n\
             - App URL: {}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Agent Webhook: {}\n\
             - Generation Backend: {}\n\
             - Session Tokens: {}\n\
             - Email: {}\n\
             - Initial Credits: {}",
            self.host,
            self.http_port,
            self.app_url,
            self.environment,
            self.log_level,
            if self.database.url.is_memory() {
                "SQLite (memory)"
            } else {
                "SQLite"
            },
            self.agent.webhook_url,
            self.backend.webhook_url,
            match self.identity.session_key {
                SessionKey::Secret(_) => "HS256",
                SessionKey::PublicKeyPem(_) => "RS256",
            },
            if self.email.is_enabled() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.credits.initial_balance,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a non-blank environment variable
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get a non-blank environment variable or fail
fn required_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Missing required environment variable {key}"))
}

/// Session verification key: PEM public key wins over a shared secret
fn session_key_from_env() -> Result<SessionKey> {
    if let Some(pem) = optional_env("SESSION_PUBLIC_KEY_PEM") {
        return Ok(SessionKey::PublicKeyPem(pem.replace("\\n", "\n")));
    }
    optional_env("SESSION_JWT_SECRET")
        .map(|secret| SessionKey::Secret(SecretString::new(secret)))
        .context("Missing required environment variable SESSION_JWT_SECRET or SESSION_PUBLIC_KEY_PEM")
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
