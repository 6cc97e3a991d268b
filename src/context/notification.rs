// ABOUTME: Notification context for dependency injection of email delivery
// ABOUTME: Exposes the notification service used by identity and generation flows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use crate::notifications::NotificationService;

/// Notification context
#[derive(Clone)]
pub struct NotificationContext {
    notifications: NotificationService,
}

impl NotificationContext {
    /// Create new notification context
    #[must_use]
    pub const fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }

    /// Email notifications
    #[must_use]
    pub const fn notifications(&self) -> &NotificationService {
        &self.notifications
    }
}
