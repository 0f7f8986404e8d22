// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One notification run: fetch, dispatch, summarise.

use std::sync::Arc;

use chrono::NaiveDate;
use pacer_notify_core::{JobResult, NotificationRecord, ProgressRepository, RepositoryError, Summary};
use serde::Serialize;
use tracing::{info, instrument};

use crate::dispatcher::Dispatcher;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
	#[error("failed to fetch due notifications: {0}")]
	Repository(#[from] RepositoryError),
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
	pub run_date: NaiveDate,
	pub summary: Summary,
	pub results: Vec<JobResult>,
}

pub struct BatchRunner {
	repository: Arc<dyn ProgressRepository>,
	dispatcher: Dispatcher,
}

impl BatchRunner {
	pub fn new(repository: Arc<dyn ProgressRepository>, dispatcher: Dispatcher) -> Self {
		Self {
			repository,
			dispatcher,
		}
	}

	/// Execute one run and return its summary once every delivery has finished.
	///
	/// # Errors
	///
	/// A repository failure aborts the run before anything is sent.
	pub async fn run_once(&self) -> Result<Summary, RunError> {
		self.run_once_detailed().await.map(|report| report.summary)
	}

	#[instrument(name = "notification_run", skip(self))]
	pub async fn run_once_detailed(&self) -> Result<RunReport, RunError> {
		// One date for the query, the subjects and the templates.
		let run_date = self.dispatcher.today();
		let mut records = self.repository.fetch_due(run_date).await?;

		if records.is_empty() {
			info!(%run_date, "No notifications to send");
			return Ok(RunReport {
				run_date,
				summary: Summary::empty(),
				results: Vec::new(),
			});
		}

		sort_records(&mut records);
		info!(%run_date, count = records.len(), "Dispatching notifications");

		let results = self.dispatcher.dispatch_on(records, run_date).await;
		let summary = Summary::from_results(&results);

		info!(
			%run_date,
			total = summary.total,
			emailed = summary.emailed,
			email_failed = summary.email_failed,
			web_notified = summary.web_notified,
			web_failed = summary.web_failed,
			"Notification run complete"
		);

		Ok(RunReport {
			run_date,
			summary,
			results,
		})
	}
}

/// User, then earliest deadline, then least progress. Stable.
fn sort_records(records: &mut [NotificationRecord]) {
	records.sort_by(|a, b| {
		a.user_id
			.cmp(&b.user_id)
			.then(a.deadline.cmp(&b.deadline))
			.then(a.progress.total_cmp(&b.progress))
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::BuiltinTemplateRenderer;
	use crate::testing::{record, RecordingNotifier, ScriptedTransport, StaticRepository};
	use crate::worker::{DeliverySettings, DeliveryWorker, RetryPolicy};
	use pacer_notify_core::QuestionSetId;
	use std::time::Duration;

	struct Harness {
		repository: Arc<StaticRepository>,
		transport: Arc<ScriptedTransport>,
		notifier: Arc<RecordingNotifier>,
		runner: BatchRunner,
	}

	fn harness(repository: StaticRepository, transport: ScriptedTransport) -> Harness {
		let repository = Arc::new(repository);
		let transport = Arc::new(transport);
		let notifier = Arc::new(RecordingNotifier::new());
		let worker = DeliveryWorker::new(
			Arc::new(BuiltinTemplateRenderer::new()),
			transport.clone(),
			notifier.clone(),
			DeliverySettings {
				retry: RetryPolicy::new(3, Duration::ZERO),
				question_set_base_url: "http://localhost:3000/question/set".to_string(),
				subject: "Learning progress update".to_string(),
				timezone: chrono_tz::UTC,
			},
		);
		let runner = BatchRunner::new(repository.clone(), Dispatcher::new(worker, 5));
		Harness {
			repository,
			transport,
			notifier,
			runner,
		}
	}

	#[tokio::test]
	async fn empty_batch_returns_empty_summary() {
		let h = harness(StaticRepository::new(Vec::new()), ScriptedTransport::succeeding());
		let summary = h.runner.run_once().await.unwrap();

		assert_eq!(summary, Summary::empty());
		assert_eq!(h.repository.call_count(), 1);
		assert_eq!(h.transport.call_count(), 0);
		assert_eq!(h.notifier.call_count(), 0);
	}

	#[tokio::test]
	async fn summary_reflects_all_side_effects() {
		let records = vec![
			record("carol", 10.0, 50.0),
			record("alice", 60.0, 55.0),
			record("bob", 40.0, 55.0),
		];
		let h = harness(StaticRepository::new(records), ScriptedTransport::succeeding());
		let summary = h.runner.run_once().await.unwrap();

		assert_eq!(summary.total, 3);
		assert_eq!(summary.emailed, 3);
		assert_eq!(summary.web_notified, 3);
		// Everything happened before run_once returned.
		assert_eq!(h.transport.sent().len(), 3);
		assert_eq!(h.notifier.call_count(), 3);
	}

	#[tokio::test]
	async fn query_and_subjects_share_the_run_date() {
		let h = harness(
			StaticRepository::new(vec![record("alice", 40.0, 55.0)]),
			ScriptedTransport::succeeding(),
		);
		let report = h.runner.run_once_detailed().await.unwrap();

		assert_eq!(h.repository.fetched_dates(), vec![report.run_date]);
		let prefix = format!("[{}]", report.run_date.format("%Y-%m-%d"));
		assert!(h.transport.sent()[0].subject.starts_with(&prefix));
	}

	#[tokio::test]
	async fn repository_failure_aborts_run() {
		let h = harness(StaticRepository::failing(), ScriptedTransport::succeeding());
		let err = h.runner.run_once().await.unwrap_err();

		assert!(matches!(err, RunError::Repository(_)));
		assert_eq!(h.transport.call_count(), 0);
		assert_eq!(h.notifier.call_count(), 0);
	}

	#[tokio::test]
	async fn detailed_report_is_in_sorted_order() {
		let records = vec![
			record("bob", 40.0, 55.0),
			record("alice", 60.0, 55.0),
		];
		let h = harness(StaticRepository::new(records), ScriptedTransport::always_failing());
		let report = h.runner.run_once_detailed().await.unwrap();

		let users: Vec<&str> = report.results.iter().map(|r| r.user_id.as_str()).collect();
		assert_eq!(users, vec!["alice", "bob"]);
		assert_eq!(report.summary.email_failed, 2);
		assert_eq!(report.summary.web_notified, 2);
	}

	#[test]
	fn sort_is_by_user_deadline_then_progress() {
		let mut late = record("alice", 10.0, 50.0);
		late.deadline = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
		late.question_set_id = QuestionSetId(1);
		let mut early_high = record("alice", 80.0, 50.0);
		early_high.question_set_id = QuestionSetId(2);
		let mut early_low = record("alice", 20.0, 50.0);
		early_low.question_set_id = QuestionSetId(3);
		let other = record("aaron", 90.0, 50.0);

		let mut records = vec![late, early_high, other, early_low];
		sort_records(&mut records);

		let order: Vec<(String, i64)> = records
			.iter()
			.map(|r| (r.user_id.to_string(), r.question_set_id.0))
			.collect();
		assert_eq!(
			order,
			vec![
				("aaron".to_string(), 7),
				("alice".to_string(), 3),
				("alice".to_string(), 2),
				("alice".to_string(), 1),
			]
		);
	}

	#[test]
	fn report_serializes_for_cli_output() {
		let report = RunReport {
			run_date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
			summary: Summary::empty(),
			results: Vec::new(),
		};
		let json = serde_json::to_value(&report).unwrap();
		assert_eq!(json["run_date"], "2025-03-16");
		assert_eq!(json["summary"]["total"], 0);
	}
}
