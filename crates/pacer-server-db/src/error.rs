// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use pacer_notify_core::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Invalid row: {0}")]
	Decode(String),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for RepositoryError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
				RepositoryError::Connection(err.to_string())
			}
			DbError::Sqlx(e) => RepositoryError::Query(e.to_string()),
			DbError::Decode(message) => RepositoryError::Decode(message),
			DbError::Internal(message) => RepositoryError::Query(message),
		}
	}
}
