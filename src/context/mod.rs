// ABOUTME: Focused dependency injection contexts for the HTTP handlers
// ABOUTME: Composes auth, data, upstream, notification and config contexts into ServerContext
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Focused dependency injection contexts
//!
//! # Architecture
//!
//! - `AuthContext`: identity provider and callback secret gate
//! - `DataContext`: database
//! - `UpstreamContext`: agent client and generation lifecycle
//! - `NotificationContext`: transactional email
//! - `ConfigContext`: server configuration

pub mod auth;
pub mod config;
pub mod data;
pub mod notification;
pub mod server;
pub mod upstream;

pub use auth::AuthContext;
pub use config::ConfigContext;
pub use data::DataContext;
pub use notification::NotificationContext;
pub use server::{ServerComponents, ServerContext};
pub use upstream::UpstreamContext;
