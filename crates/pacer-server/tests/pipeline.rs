// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end runs over a seeded in-memory database with stub delivery.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use pacer_notify_core::{EmailOutcome, WebOutcome};
use pacer_server::{assemble_runner, build_scheduler, DAILY_NOTIFICATIONS_JOB_ID};
use pacer_server_config::ServerConfig;
use pacer_server_db::testing::{
	create_test_pool, insert_assignment, insert_question_set_items, insert_user, AssignmentSeed,
};
use pacer_server_db::SqliteProgressRepository;
use pacer_server_jobs::{JobError, TriggerOutcome, TriggerSource};
use pacer_server_notify::testing::{RecordingNotifier, ScriptedTransport};
use pacer_server_notify::BatchRunner;

fn config() -> ServerConfig {
	let mut config = ServerConfig::default();
	config.dispatch.backoff_secs = 0;
	config
}

fn today() -> NaiveDate {
	Utc::now().date_naive()
}

fn seed(user_id: &str, set_id: i64, status: &'static str, progress: f64, created_days_ago: i64, due_in_days: i64) -> AssignmentSeed {
	AssignmentSeed {
		user_id: user_id.to_string(),
		question_set_id: set_id,
		status,
		progress,
		attempts: 1,
		deadline: today() + Duration::days(due_in_days),
		created_at: today() - Duration::days(created_days_ago),
	}
}

/// alice is behind (20% of a 50% target), bob is ahead, carol has finished
/// and dave's deadline has passed.
async fn seeded_repository() -> Arc<SqliteProgressRepository> {
	let pool = create_test_pool().await.unwrap();
	for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol"), ("dave", "Dave")] {
		insert_user(&pool, id, name, &format!("{id}@example.com"))
			.await
			.unwrap();
	}
	insert_question_set_items(&pool, 11, 10).await.unwrap();

	insert_assignment(&pool, &seed("alice", 11, "in_progress", 20.0, 10, 10)).await.unwrap();
	insert_assignment(&pool, &seed("bob", 11, "in_progress", 80.0, 10, 10)).await.unwrap();
	insert_assignment(&pool, &seed("carol", 11, "completed", 100.0, 10, 10)).await.unwrap();
	insert_assignment(&pool, &seed("dave", 11, "not_started", 0.0, 20, -1)).await.unwrap();

	Arc::new(SqliteProgressRepository::new(pool))
}

struct Pipeline {
	transport: Arc<ScriptedTransport>,
	notifier: Arc<RecordingNotifier>,
	runner: BatchRunner,
}

async fn pipeline(config: &ServerConfig, transport: ScriptedTransport) -> Pipeline {
	let transport = Arc::new(transport);
	let notifier = Arc::new(RecordingNotifier::new());
	let runner = assemble_runner(
		config,
		seeded_repository().await,
		transport.clone(),
		notifier.clone(),
	)
	.unwrap();
	Pipeline {
		transport,
		notifier,
		runner,
	}
}

#[tokio::test]
async fn due_learners_are_emailed_and_notified() {
	let p = pipeline(&config(), ScriptedTransport::succeeding()).await;
	let report = p.runner.run_once_detailed().await.unwrap();

	assert_eq!(report.summary.total, 2);
	assert_eq!(report.summary.emailed, 2);
	assert_eq!(report.summary.web_notified, 2);

	let sent = p.transport.sent();
	let subject = format!("[{}] Learning progress update", today().format("%Y-%m-%d"));
	assert!(sent.iter().all(|email| email.subject == subject));

	let alice = sent
		.iter()
		.find(|email| email.to == "alice@example.com")
		.expect("alice should be emailed");
	assert!(alice.text.contains("30.0"), "{}", alice.text);
	assert!(alice.text.contains("http://localhost:3000/question/set/11"));

	let notified: Vec<String> = p
		.notifier
		.calls()
		.into_iter()
		.map(|(user, _)| user.to_string())
		.collect();
	assert!(notified.contains(&"alice".to_string()));
	assert!(notified.contains(&"bob".to_string()));
	assert!(!notified.contains(&"carol".to_string()));
	assert!(!notified.contains(&"dave".to_string()));
}

#[tokio::test]
async fn email_outage_still_notifies_in_app() {
	let p = pipeline(&config(), ScriptedTransport::always_failing()).await;
	let report = p.runner.run_once_detailed().await.unwrap();

	assert_eq!(report.summary.total, 2);
	assert_eq!(report.summary.email_failed, 2);
	assert_eq!(report.summary.web_notified, 2);
	assert_eq!(p.transport.call_count(), 6);
	assert!(report
		.results
		.iter()
		.all(|r| matches!(r.email, EmailOutcome::Failed { attempts: 3, .. }) && r.web == WebOutcome::Notified));
}

#[tokio::test]
async fn template_file_is_used_when_configured() {
	let template = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates/progress_email.html");
	let mut config = config();
	config.templates.email_template_path = Some(template);

	let p = pipeline(&config, ScriptedTransport::succeeding()).await;
	p.runner.run_once().await.unwrap();

	let sent = p.transport.sent();
	let bob = sent.iter().find(|email| email.to == "bob@example.com").unwrap();
	assert!(bob.html.contains("Hi Bob,"));
	assert!(bob.html.contains("<td>in_progress</td>"));
	assert!(bob.html.contains("href=\"http://localhost:3000/question/set/11\""));
}

#[tokio::test]
async fn broken_template_fails_email_but_not_run() {
	let dir = tempfile::tempdir().unwrap();
	let mut config = config();
	config.templates.email_template_path = Some(dir.path().join("missing.html"));

	let p = pipeline(&config, ScriptedTransport::succeeding()).await;
	let summary = p.runner.run_once().await.unwrap();

	assert_eq!(summary.total, 2);
	assert_eq!(summary.email_failed, 2);
	assert_eq!(summary.web_notified, 2);
	assert_eq!(p.transport.call_count(), 0);
}

#[tokio::test]
async fn scheduler_runs_the_pipeline_on_manual_trigger() {
	let config = config();
	let p = pipeline(&config, ScriptedTransport::succeeding()).await;
	let scheduler = build_scheduler(&config, Arc::new(p.runner)).unwrap();

	assert_eq!(scheduler.job_ids(), vec![DAILY_NOTIFICATIONS_JOB_ID.to_string()]);

	let outcome = scheduler
		.trigger_job(DAILY_NOTIFICATIONS_JOB_ID, TriggerSource::Manual)
		.await
		.unwrap();
	assert!(matches!(outcome, TriggerOutcome::Succeeded { .. }));
	assert_eq!(p.transport.sent().len(), 2);

	let status = scheduler.job_status(DAILY_NOTIFICATIONS_JOB_ID).await.unwrap();
	assert_eq!(status.consecutive_failures, 0);
}

#[test]
fn invalid_timezone_is_fatal_at_registration() {
	let mut config = config();
	config.schedule.timezone = "Moon/Tranquility".to_string();

	let repository = Arc::new(pacer_server_notify::testing::StaticRepository::new(Vec::new()));
	let runner = assemble_runner(
		&ServerConfig::default(),
		repository,
		Arc::new(ScriptedTransport::succeeding()),
		Arc::new(RecordingNotifier::new()),
	)
	.unwrap();

	let err = build_scheduler(&config, Arc::new(runner)).err().unwrap();
	assert!(matches!(err, JobError::InvalidTimezone(_)));
}
