// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::{JobStatus, TriggerSource};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct JobHealthStatus {
	pub job_id: String,
	pub name: String,
	pub status: HealthState,
	pub schedule: Option<String>,
	pub last_run: Option<LastRunInfo>,
	pub consecutive_failures: u32,
	pub skipped_triggers: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRunInfo {
	pub run_id: String,
	pub status: JobStatus,
	pub triggered_by: TriggerSource,
	pub started_at: DateTime<Utc>,
	pub duration_ms: Option<i64>,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsHealthStatus {
	pub status: HealthState,
	pub jobs: Vec<JobHealthStatus>,
}

/// In-memory run history for one job.
#[derive(Debug, Default)]
pub(crate) struct RunHistory {
	pub last_run: Option<LastRunInfo>,
	pub consecutive_failures: u32,
	pub skipped_triggers: u64,
}

impl RunHistory {
	pub fn record_start(&mut self, run_id: &str, triggered_by: TriggerSource, started_at: DateTime<Utc>) {
		self.last_run = Some(LastRunInfo {
			run_id: run_id.to_string(),
			status: JobStatus::Running,
			triggered_by,
			started_at,
			duration_ms: None,
			error: None,
		});
	}

	pub fn record_finish(&mut self, status: JobStatus, duration_ms: i64, error: Option<String>) {
		if let Some(last_run) = self.last_run.as_mut() {
			last_run.status = status;
			last_run.duration_ms = Some(duration_ms);
			last_run.error = error;
		}
		match status {
			JobStatus::Succeeded => self.consecutive_failures = 0,
			JobStatus::Failed => self.consecutive_failures += 1,
			JobStatus::Running => {}
		}
	}

	pub fn record_skip(&mut self) {
		self.skipped_triggers += 1;
	}
}

pub(crate) fn determine_health_state(
	last_run: Option<&LastRunInfo>,
	consecutive_failures: u32,
) -> HealthState {
	match last_run {
		None => HealthState::Healthy,
		Some(run) => match run.status {
			JobStatus::Succeeded => HealthState::Healthy,
			JobStatus::Running => HealthState::Healthy,
			JobStatus::Failed => {
				if consecutive_failures >= 3 {
					HealthState::Unhealthy
				} else if consecutive_failures >= 1 {
					HealthState::Degraded
				} else {
					HealthState::Healthy
				}
			}
		},
	}
}

pub(crate) fn worst(a: HealthState, b: HealthState) -> HealthState {
	match (a, b) {
		(HealthState::Unhealthy, _) | (_, HealthState::Unhealthy) => HealthState::Unhealthy,
		(HealthState::Degraded, _) | (_, HealthState::Degraded) => HealthState::Degraded,
		_ => HealthState::Healthy,
	}
}
