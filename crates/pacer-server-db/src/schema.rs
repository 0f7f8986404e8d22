// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tables read by the progress query.
//!
//! The learning platform owns these tables; `run_migrations` only creates
//! them when missing so a fresh database (or a test) has something to read.

use sqlx::SqlitePool;

use crate::error::Result;

const STATEMENTS: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS users (
		id TEXT PRIMARY KEY,
		name TEXT NOT NULL,
		email TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS assignments (
		user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
		question_set_id INTEGER NOT NULL,
		status TEXT NOT NULL DEFAULT 'not_started'
			CHECK (status IN ('not_started', 'in_progress', 'completed')),
		progress REAL NOT NULL DEFAULT 0,
		attempts INTEGER NOT NULL DEFAULT 0,
		deadline TEXT NOT NULL,
		created_at TEXT NOT NULL,
		last_updated_at TEXT,
		PRIMARY KEY (user_id, question_set_id)
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_assignments_due ON assignments(status, deadline)",
	r#"
	CREATE TABLE IF NOT EXISTS question_set_items (
		set_id INTEGER NOT NULL,
		question_id INTEGER NOT NULL,
		PRIMARY KEY (set_id, question_id)
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS correct_answers (
		user_id TEXT NOT NULL,
		question_set_id INTEGER NOT NULL,
		question_id INTEGER NOT NULL,
		PRIMARY KEY (user_id, question_set_id, question_id)
	)
	"#,
];

#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	for statement in STATEMENTS {
		sqlx::query(*statement).execute(pool).await?;
	}
	tracing::debug!(statements = STATEMENTS.len(), "schema ensured");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = create_test_pool().await.unwrap();
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<(String,)> = sqlx::query_as(
			"SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
		assert_eq!(
			names,
			vec!["assignments", "correct_answers", "question_set_items", "users"]
		);
	}

	#[tokio::test]
	async fn rejects_unknown_status() {
		let pool = create_test_pool().await.unwrap();
		run_migrations(&pool).await.unwrap();
		sqlx::query("INSERT INTO users (id, name, email) VALUES ('u1', 'Aiko', 'a@example.com')")
			.execute(&pool)
			.await
			.unwrap();

		let result = sqlx::query(
			"INSERT INTO assignments (user_id, question_set_id, status, deadline, created_at) \
			 VALUES ('u1', 1, 'archived', '2025-04-01', '2025-03-01')",
		)
		.execute(&pool)
		.await;
		assert!(result.is_err());
	}
}
