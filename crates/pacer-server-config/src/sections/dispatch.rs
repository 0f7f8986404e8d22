// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Worker pool and delivery retry settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_POOL_SIZE: usize = 5;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_SECS: u64 = 2;
const DEFAULT_QUESTION_SET_BASE_URL: &str = "http://localhost:3000/question/set";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfigLayer {
	pub pool_size: Option<usize>,
	pub max_attempts: Option<u32>,
	pub backoff_secs: Option<u64>,
	pub question_set_base_url: Option<String>,
}

impl DispatchConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.pool_size.is_some() {
			self.pool_size = other.pool_size;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
		if other.backoff_secs.is_some() {
			self.backoff_secs = other.backoff_secs;
		}
		if other.question_set_base_url.is_some() {
			self.question_set_base_url = other.question_set_base_url;
		}
	}

	pub fn finalize(self) -> DispatchConfig {
		DispatchConfig {
			pool_size: self.pool_size.unwrap_or(DEFAULT_POOL_SIZE),
			max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
			backoff_secs: self.backoff_secs.unwrap_or(DEFAULT_BACKOFF_SECS),
			question_set_base_url: self
				.question_set_base_url
				.map(|url| url.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_QUESTION_SET_BASE_URL.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
	/// Number of concurrent delivery workers per run.
	pub pool_size: usize,
	/// Email attempts per notification, including the first.
	pub max_attempts: u32,
	/// Fixed wait between failed email attempts.
	pub backoff_secs: u64,
	/// Question set links are `{question_set_base_url}/{id}`.
	pub question_set_base_url: String,
}

impl DispatchConfig {
	pub fn backoff(&self) -> Duration {
		Duration::from_secs(self.backoff_secs)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.pool_size == 0 {
			return Err(ConfigError::InvalidValue {
				key: "dispatch.pool_size".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		if self.max_attempts == 0 {
			return Err(ConfigError::InvalidValue {
				key: "dispatch.max_attempts".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		Ok(())
	}
}

impl Default for DispatchConfig {
	fn default() -> Self {
		DispatchConfigLayer::default().finalize()
	}
}
