// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Due-notification query.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use pacer_notify_core::{
	NotificationRecord, ProgressRepository, QuestionSetId, RepositoryError, UserId,
};

use crate::error::{DbError, Result};

/// Percent of the assignment window that has elapsed, clamped to 0..=100.
///
/// A zero-length window (deadline on the creation day) counts as fully
/// elapsed.
pub fn planned_progress(period: i64, passed_days: i64) -> f64 {
	if period <= 0 {
		return 100.0;
	}
	(passed_days as f64 * 100.0 / period as f64).clamp(0.0, 100.0)
}

#[derive(Clone)]
pub struct SqliteProgressRepository {
	pool: SqlitePool,
}

impl SqliteProgressRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Open assignments whose deadline is on or after `today`, ordered by
	/// user, deadline, then progress.
	#[instrument(skip(self), fields(today = %today))]
	pub async fn fetch_due_on(&self, today: NaiveDate) -> Result<Vec<NotificationRecord>> {
		let today = today.format("%Y-%m-%d").to_string();

		let rows = sqlx::query_as::<_, DueRow>(
			r#"
			SELECT
				u.id AS user_id,
				u.email AS email,
				u.name AS user_name,
				a.question_set_id AS question_set_id,
				date(a.deadline) AS deadline,
				date(a.created_at) AS created_on,
				a.status AS status,
				a.progress AS progress,
				a.attempts AS attempts,
				a.last_updated_at AS last_updated_at,
				CAST(julianday(date(a.deadline)) - julianday(date(a.created_at)) AS INTEGER) AS period,
				CAST(julianday(date(?)) - julianday(date(a.created_at)) AS INTEGER) AS passed_days,
				(SELECT COUNT(*) FROM correct_answers c
					WHERE c.question_set_id = a.question_set_id AND c.user_id = a.user_id) AS total_correct,
				(SELECT COUNT(*) FROM question_set_items q
					WHERE q.set_id = a.question_set_id) AS total_questions
			FROM assignments a
			JOIN users u ON u.id = a.user_id
			WHERE a.status IN ('not_started', 'in_progress')
			  AND date(a.deadline) >= date(?)
			ORDER BY a.user_id ASC, date(a.deadline) ASC, a.progress ASC
			"#,
		)
		.bind(&today)
		.bind(&today)
		.fetch_all(&self.pool)
		.await?;

		tracing::debug!(count = rows.len(), "fetched due notifications");
		rows.into_iter().map(TryInto::try_into).collect()
	}
}

#[async_trait]
impl ProgressRepository for SqliteProgressRepository {
	async fn fetch_due(
		&self,
		today: NaiveDate,
	) -> std::result::Result<Vec<NotificationRecord>, RepositoryError> {
		self.fetch_due_on(today).await.map_err(Into::into)
	}
}

#[derive(sqlx::FromRow)]
struct DueRow {
	user_id: String,
	email: String,
	user_name: String,
	question_set_id: i64,
	deadline: String,
	created_on: String,
	status: String,
	progress: f64,
	attempts: i64,
	last_updated_at: Option<String>,
	period: i64,
	passed_days: i64,
	total_correct: i64,
	total_questions: i64,
}

impl TryFrom<DueRow> for NotificationRecord {
	type Error = DbError;

	fn try_from(row: DueRow) -> Result<Self> {
		Ok(NotificationRecord {
			deadline: parse_date(&row.deadline, "deadline")?,
			created_at: parse_date(&row.created_on, "created_at")?,
			last_updated_at: row
				.last_updated_at
				.as_deref()
				.map(parse_timestamp)
				.transpose()?,
			status: row.status.parse().map_err(DbError::Decode)?,
			planned_progress: planned_progress(row.period, row.passed_days),
			user_id: UserId(row.user_id),
			email: row.email,
			user_name: row.user_name,
			question_set_id: QuestionSetId(row.question_set_id),
			progress: row.progress.clamp(0.0, 100.0),
			period: row.period,
			passed_days: row.passed_days,
			attempts: row.attempts,
			total_correct: row.total_correct,
			total_questions: row.total_questions,
		})
	}
}

fn parse_date(value: &str, column: &str) -> Result<NaiveDate> {
	NaiveDate::parse_from_str(value, "%Y-%m-%d")
		.map_err(|_| DbError::Decode(format!("invalid {column}: '{value}'")))
}

/// Accepts RFC 3339 or SQLite's `YYYY-MM-DD HH:MM:SS` (taken as UTC).
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.or_else(|_| {
			NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
		})
		.map_err(|_| DbError::Decode(format!("invalid last_updated_at: '{value}'")))
}
