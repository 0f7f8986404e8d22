// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborators the delivery pipeline depends on.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::email::{EmailContent, RenderedEmail};
use crate::error::{NotifyError, RepositoryError, TemplateError, TransportError};
use crate::record::{NotificationRecord, UserId};

/// Source of due notifications.
///
/// Implementations compute `period`, `passed_days` and `planned_progress`
/// as of `today`, and exclude completed assignments and those whose
/// deadline is before `today`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
	async fn fetch_due(&self, today: NaiveDate) -> Result<Vec<NotificationRecord>, RepositoryError>;
}

#[async_trait]
pub trait TemplateRenderer: Send + Sync {
	async fn render(&self, content: &EmailContent) -> Result<RenderedEmail, TemplateError>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
	async fn send(&self, to: &str, subject: &str, body: &RenderedEmail)
		-> Result<(), TransportError>;
}

#[async_trait]
pub trait WebNotifier: Send + Sync {
	async fn notify(&self, user_id: &UserId, message: &str) -> Result<(), NotifyError>;
}
