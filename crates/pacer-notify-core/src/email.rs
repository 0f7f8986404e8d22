// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email template input and rendered output.

use chrono::NaiveDate;
use serde::Serialize;

use crate::composer::ComposedMessage;
use crate::record::{AssignmentStatus, NotificationRecord};

/// Data handed to a [`TemplateRenderer`](crate::TemplateRenderer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailContent {
	pub user_name: String,
	pub message: String,
	pub on_schedule: bool,
	pub progress: f64,
	pub status: AssignmentStatus,
	pub question_set_url: String,
	pub sent_on: NaiveDate,
}

impl EmailContent {
	pub fn new(
		record: &NotificationRecord,
		message: &ComposedMessage,
		question_set_base_url: &str,
		sent_on: NaiveDate,
	) -> Self {
		Self {
			user_name: record.user_name.clone(),
			message: message.text.clone(),
			on_schedule: message.on_schedule,
			progress: message.progress,
			status: record.status,
			question_set_url: format!(
				"{}/{}",
				question_set_base_url.trim_end_matches('/'),
				record.question_set_id
			),
			sent_on,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
	pub html: String,
	pub text: String,
}

/// `[YYYY-MM-DD] {subject}`
pub fn subject_line(sent_on: NaiveDate, subject: &str) -> String {
	format!("[{}] {subject}", sent_on.format("%Y-%m-%d"))
}
