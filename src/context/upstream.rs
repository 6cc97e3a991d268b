// ABOUTME: Upstream context for the automation agent and generation backend
// ABOUTME: Groups the outbound clients and the lifecycle service built on them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use crate::agent::AgentClient;
use crate::generation::GenerationService;

/// Upstream context
///
/// # Dependencies
/// - `agent`: live chat and connectivity probes
/// - `generations`: charge, dispatch and callback handling
#[derive(Clone)]
pub struct UpstreamContext {
    agent: AgentClient,
    generations: GenerationService,
}

impl UpstreamContext {
    /// Create new upstream context
    #[must_use]
    pub const fn new(agent: AgentClient, generations: GenerationService) -> Self {
        Self { agent, generations }
    }

    /// Agent webhook client
    #[must_use]
    pub const fn agent(&self) -> &AgentClient {
        &self.agent
    }

    /// Generation lifecycle service
    #[must_use]
    pub const fn generations(&self) -> &GenerationService {
        &self.generations
    }
}
