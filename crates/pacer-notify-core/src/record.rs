// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification records produced by the progress repository.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Learner identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Question set identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionSetId(pub i64);

impl fmt::Display for QuestionSetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Assignment status as stored by the learning platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
	NotStarted,
	InProgress,
	Completed,
}

impl AssignmentStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			AssignmentStatus::NotStarted => "not_started",
			AssignmentStatus::InProgress => "in_progress",
			AssignmentStatus::Completed => "completed",
		}
	}
}

impl fmt::Display for AssignmentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AssignmentStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"not_started" => Ok(AssignmentStatus::NotStarted),
			"in_progress" => Ok(AssignmentStatus::InProgress),
			"completed" => Ok(AssignmentStatus::Completed),
			_ => Err(format!("unknown assignment status: {s}")),
		}
	}
}

/// One learner's progress on one due question set, as of this run.
///
/// Records are snapshots: the pipeline reads them and never writes back.
/// `planned_progress` arrives already computed (and clamped to 0..=100) by
/// the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
	pub user_id: UserId,
	pub email: String,
	pub user_name: String,
	pub question_set_id: QuestionSetId,
	pub deadline: NaiveDate,
	pub created_at: NaiveDate,
	pub last_updated_at: Option<DateTime<Utc>>,
	pub status: AssignmentStatus,
	/// Percent complete, 0..=100.
	pub progress: f64,
	/// Days between `created_at` and `deadline`.
	pub period: i64,
	/// Days elapsed since `created_at`.
	pub passed_days: i64,
	/// Percent the learner should have reached by today.
	pub planned_progress: f64,
	/// Historical submission count. Unrelated to delivery retries.
	pub attempts: i64,
	pub total_correct: i64,
	pub total_questions: i64,
}

impl NotificationRecord {
	/// Percentage points the learner is behind plan, if any.
	pub fn deficit(&self) -> Option<f64> {
		if self.progress < self.planned_progress {
			Some(self.planned_progress - self.progress)
		} else {
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::testing::record;
	use super::*;

	#[test]
	fn status_round_trips_through_str() {
		for status in [
			AssignmentStatus::NotStarted,
			AssignmentStatus::InProgress,
			AssignmentStatus::Completed,
		] {
			assert_eq!(status.as_str().parse::<AssignmentStatus>().unwrap(), status);
		}
		assert!("archived".parse::<AssignmentStatus>().is_err());
	}

	#[test]
	fn deficit_only_when_behind() {
		assert_eq!(record("u1", 40.0, 55.0).deficit(), Some(15.0));
		assert_eq!(record("u1", 55.0, 55.0).deficit(), None);
		assert_eq!(record("u1", 60.0, 55.0).deficit(), None);
	}

	#[test]
	fn serializes_status_as_snake_case() {
		let json = serde_json::to_value(record("u1", 10.0, 20.0)).unwrap();
		assert_eq!(json["status"], "in_progress");
		assert_eq!(json["user_id"], "u1");
	}
}
