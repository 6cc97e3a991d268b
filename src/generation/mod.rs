// ABOUTME: Generation lifecycle module: backend dispatch and the lifecycle service
// ABOUTME: Credit charge, dispatch with compensation, callbacks and owner-scoped reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

/// Outbound dispatch to the workflow backend
pub mod backend;
/// Lifecycle orchestration
pub mod service;

pub use backend::{DispatchRequest, GenerationBackend, HttpGenerationBackend};
pub use service::{CallbackPayload, CallbackReceipt, GenerationService};
