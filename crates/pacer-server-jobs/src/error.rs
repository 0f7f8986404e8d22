// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("Job failed: {message}")]
	Failed { message: String },

	#[error("Job panicked: {0}")]
	Panicked(String),

	#[error("Job not found: {0}")]
	NotFound(String),

	#[error("Job already registered: {0}")]
	AlreadyRegistered(String),

	#[error("Invalid schedule: {0}")]
	InvalidSchedule(String),

	#[error("Invalid timezone: {0}")]
	InvalidTimezone(String),
}

impl JobError {
	pub fn failed(message: impl Into<String>) -> Self {
		JobError::Failed {
			message: message.into(),
		}
	}
}

pub type Result<T> = std::result::Result<T, JobError>;
