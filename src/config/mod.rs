// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Exposes the environment-driven ServerConfig and its typed sub-configs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Configuration module
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file). See [`environment::ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AgentConfig, BackendConfig, CorsConfig, CreditsConfig, DatabaseConfig, DatabaseUrl,
    EmailConfig, Environment, IdentityConfig, LogLevel, SecretString, ServerConfig, SessionKey,
};
