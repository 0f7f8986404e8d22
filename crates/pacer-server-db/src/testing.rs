// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for seeding an in-memory database in tests.

use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::Result;
use crate::schema::run_migrations;

/// Single-connection in-memory pool with the schema applied.
pub async fn create_test_pool() -> Result<SqlitePool> {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await?;
	run_migrations(&pool).await?;
	Ok(pool)
}

pub async fn insert_user(pool: &SqlitePool, id: &str, name: &str, email: &str) -> Result<()> {
	sqlx::query("INSERT INTO users (id, name, email) VALUES (?, ?, ?)")
		.bind(id)
		.bind(name)
		.bind(email)
		.execute(pool)
		.await?;
	Ok(())
}

/// Assignment row as the platform would write it.
#[derive(Debug, Clone)]
pub struct AssignmentSeed {
	pub user_id: String,
	pub question_set_id: i64,
	pub status: &'static str,
	pub progress: f64,
	pub attempts: i64,
	pub deadline: NaiveDate,
	pub created_at: NaiveDate,
}

pub async fn insert_assignment(pool: &SqlitePool, seed: &AssignmentSeed) -> Result<()> {
	sqlx::query(
		r#"
		INSERT INTO assignments (
			user_id, question_set_id, status, progress, attempts, deadline, created_at, last_updated_at
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
		"#,
	)
	.bind(&seed.user_id)
	.bind(seed.question_set_id)
	.bind(seed.status)
	.bind(seed.progress)
	.bind(seed.attempts)
	.bind(seed.deadline.format("%Y-%m-%d").to_string())
	.bind(seed.created_at.format("%Y-%m-%d").to_string())
	.execute(pool)
	.await?;
	Ok(())
}

pub async fn insert_question_set_items(pool: &SqlitePool, set_id: i64, count: i64) -> Result<()> {
	for question_id in 1..=count {
		sqlx::query("INSERT INTO question_set_items (set_id, question_id) VALUES (?, ?)")
			.bind(set_id)
			.bind(question_id)
			.execute(pool)
			.await?;
	}
	Ok(())
}

pub async fn insert_correct_answers(
	pool: &SqlitePool,
	user_id: &str,
	set_id: i64,
	count: i64,
) -> Result<()> {
	for question_id in 1..=count {
		sqlx::query(
			"INSERT INTO correct_answers (user_id, question_set_id, question_id) VALUES (?, ?, ?)",
		)
		.bind(user_id)
		.bind(set_id)
		.bind(question_id)
		.execute(pool)
		.await?;
	}
	Ok(())
}
