// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Message selection for a single notification.

use serde::Serialize;

use crate::record::NotificationRecord;

/// Sent when the learner has met or passed today's planned progress.
pub const ON_SCHEDULE_MESSAGE: &str =
	"You're on track! You've reached today's target. Keep up the great work!";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedMessage {
	pub text: String,
	pub on_schedule: bool,
	/// The record's progress, passed through untouched for templates.
	pub progress: f64,
}

/// Pick the message for `record`.
///
/// Behind plan: the gap to `planned_progress`, one decimal place.
/// Otherwise the fixed [`ON_SCHEDULE_MESSAGE`].
pub fn compose(record: &NotificationRecord) -> ComposedMessage {
	match record.deficit() {
		Some(deficit) => ComposedMessage {
			text: format!(
				"Your progress is behind schedule. You are {deficit:.1}% short of today's target!"
			),
			on_schedule: false,
			progress: record.progress,
		},
		None => ComposedMessage {
			text: ON_SCHEDULE_MESSAGE.to_string(),
			on_schedule: true,
			progress: record.progress,
		},
	}
}
