// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use pacer_server_jobs::{Job, JobContext, JobError, JobOutput};
use pacer_server_notify::BatchRunner;
use tracing::instrument;

pub const DAILY_NOTIFICATIONS_JOB_ID: &str = "daily-notifications";

/// One notification run per trigger.
pub struct DailyNotificationsJob {
	runner: Arc<BatchRunner>,
}

impl DailyNotificationsJob {
	pub fn new(runner: Arc<BatchRunner>) -> Self {
		Self { runner }
	}
}

#[async_trait]
impl Job for DailyNotificationsJob {
	fn id(&self) -> &str {
		DAILY_NOTIFICATIONS_JOB_ID
	}

	fn name(&self) -> &str {
		"Daily Progress Notifications"
	}

	fn description(&self) -> &str {
		"Email and notify learners about progress toward question set deadlines"
	}

	#[instrument(skip(self, ctx), fields(job_id = "daily-notifications", run_id = %ctx.run_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		let summary = self
			.runner
			.run_once()
			.await
			.map_err(|e| JobError::failed(e.to_string()))?;

		tracing::info!(
			triggered_by = %ctx.triggered_by,
			total = summary.total,
			emailed = summary.emailed,
			email_failed = summary.email_failed,
			"Daily notifications finished"
		);

		Ok(JobOutput {
			message: format!(
				"Sent {} of {} emails, {} in-app notifications",
				summary.emailed, summary.total, summary.web_notified
			),
			metadata: serde_json::to_value(summary).ok(),
		})
	}
}
