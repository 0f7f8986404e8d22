// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Record fixtures shared by the pipeline crates' tests.

use chrono::NaiveDate;

use crate::record::{AssignmentStatus, NotificationRecord, QuestionSetId, UserId};

/// A due record for `user` on question set 7: created 2025-03-01, due
/// 2025-03-31, half way through its window.
pub fn record(user: &str, progress: f64, planned_progress: f64) -> NotificationRecord {
	NotificationRecord {
		user_id: UserId::new(user),
		email: format!("{user}@example.com"),
		user_name: user.to_string(),
		question_set_id: QuestionSetId(7),
		deadline: date(2025, 3, 31),
		created_at: date(2025, 3, 1),
		last_updated_at: None,
		status: AssignmentStatus::InProgress,
		progress,
		period: 30,
		passed_days: 15,
		planned_progress,
		attempts: 2,
		total_correct: 8,
		total_questions: 20,
	}
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
