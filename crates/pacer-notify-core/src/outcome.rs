// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-job delivery outcomes and the run summary.

use serde::Serialize;
use std::fmt;

use crate::record::{QuestionSetId, UserId};

/// Where a delivery job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
	Pending,
	Composing,
	Emailing { attempt: u32 },
	Emailed,
	EmailFailed,
	WebNotifying,
	Done,
}

impl fmt::Display for DeliveryState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DeliveryState::Pending => f.write_str("pending"),
			DeliveryState::Composing => f.write_str("composing"),
			DeliveryState::Emailing { attempt } => write!(f, "emailing(attempt {attempt})"),
			DeliveryState::Emailed => f.write_str("emailed"),
			DeliveryState::EmailFailed => f.write_str("email_failed"),
			DeliveryState::WebNotifying => f.write_str("web_notifying"),
			DeliveryState::Done => f.write_str("done"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EmailOutcome {
	Emailed { attempts: u32 },
	Failed { attempts: u32, error: String },
	TemplateFailed { error: String },
}

impl EmailOutcome {
	pub fn is_delivered(&self) -> bool {
		matches!(self, EmailOutcome::Emailed { .. })
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebOutcome {
	Notified,
	Failed { error: String },
}

impl WebOutcome {
	pub fn is_delivered(&self) -> bool {
		matches!(self, WebOutcome::Notified)
	}
}

/// What happened to one notification in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
	/// Position of the record in the sorted batch.
	pub sequence: usize,
	pub user_id: UserId,
	pub question_set_id: QuestionSetId,
	pub email: EmailOutcome,
	pub web: WebOutcome,
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
	pub total: usize,
	pub emailed: usize,
	/// Includes template failures.
	pub email_failed: usize,
	pub web_notified: usize,
	pub web_failed: usize,
}

impl Summary {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn from_results(results: &[JobResult]) -> Self {
		results.iter().fold(Self::empty(), |mut summary, result| {
			summary.total += 1;
			if result.email.is_delivered() {
				summary.emailed += 1;
			} else {
				summary.email_failed += 1;
			}
			if result.web.is_delivered() {
				summary.web_notified += 1;
			} else {
				summary.web_failed += 1;
			}
			summary
		})
	}
}
