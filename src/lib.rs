// ABOUTME: Main library entry point for the MaaS Workflow Creator backend
// ABOUTME: Chat with an automation agent, generate n8n workflows, render Mermaid diagrams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

#![deny(unsafe_code)]

//! # MaaS Workflow Creator
//!
//! A thin orchestration backend between a browser client and four remote
//! systems: an automation agent that answers chat messages, a workflow
//! backend that produces n8n JSON asynchronously, an identity provider and
//! a transactional email provider.
//!
//! ## Architecture
//!
//! - **Agent**: chat relay, reply parsing into prose and Mermaid diagrams,
//!   connectivity probes
//! - **Generation**: credit charge, dispatch with compensation, callbacks
//! - **Identity**: session tokens and signed lifecycle events
//! - **Database**: users, generations and the credit ledger on SQLite
//! - **Notifications**: best-effort email on sign-up and completion
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use maas_workflow_creator::agent::parse_reply;
//!
//! let parsed = parse_reply("Here you go:\n```mermaid\ngraph TD\nA-->B\n```");
//! assert_eq!(parsed.first_diagram(), Some("graph TD\nA-->B"));
//! ```

/// Agent client, reply parser and chat transcript
pub mod agent;

/// Environment configuration
pub mod config;

/// Dependency injection contexts
pub mod context;

/// SQLite persistence
pub mod database;

/// Generation lifecycle
pub mod generation;

/// Identity provider integration
pub mod identity;

/// Structured logging
pub mod logging;

/// CORS and request tracing layers
pub mod middleware;

/// Transactional email
pub mod notifications;

/// HTTP routes
pub mod routes;

/// Inbound webhook gates
pub mod security;

/// HTTP server assembly
pub mod server;

/// Shared utilities
pub mod utils;

/// Error types, re-exported from the core crate
pub use maas_core::errors;

/// Domain models, re-exported from the core crate
pub use maas_core::models;

/// Shared constants, re-exported from the core crate
pub use maas_core::constants;
