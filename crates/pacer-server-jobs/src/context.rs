// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::TriggerSource;
use chrono::{DateTime, Utc};

/// Per-run information handed to [`Job::run`](crate::Job::run).
#[derive(Debug, Clone)]
pub struct JobContext {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	/// When the run actually started. Jobs use this as "today".
	pub started_at: DateTime<Utc>,
}

impl JobContext {
	pub fn new(triggered_by: TriggerSource) -> Self {
		Self {
			run_id: uuid::Uuid::new_v4().to_string(),
			triggered_by,
			started_at: Utc::now(),
		}
	}
}
