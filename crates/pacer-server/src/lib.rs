// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring for the Pacer notification service.
//!
//! Everything here takes a resolved [`ServerConfig`]; nothing reads the
//! environment directly.

pub mod jobs;

use std::sync::Arc;

use anyhow::Context;
use chrono_tz::Tz;
use pacer_notify_core::{MailTransport, ProgressRepository, TemplateRenderer, WebNotifier};
use pacer_server_config::{ServerConfig, TemplatesConfig};
use pacer_server_db::{create_pool, run_migrations, SqliteProgressRepository};
use pacer_server_jobs::{DailySchedule, JobError, JobScheduler};
use pacer_server_notify::{
	BatchRunner, BuiltinTemplateRenderer, DeliverySettings, DeliveryWorker, Dispatcher,
	FileTemplateRenderer,
};
use pacer_server_smtp::SmtpClient;

pub use jobs::{DailyNotificationsJob, DAILY_NOTIFICATIONS_JOB_ID};

pub fn parse_timezone(name: &str) -> anyhow::Result<Tz> {
	name
		.parse::<Tz>()
		.map_err(|_| anyhow::anyhow!("unknown timezone: {name}"))
}

/// File renderer when a template path is configured, built-in layout otherwise.
pub fn build_renderer(templates: &TemplatesConfig) -> Arc<dyn TemplateRenderer> {
	match &templates.email_template_path {
		Some(path) => {
			tracing::info!(path = %path.display(), "Using email template file");
			Arc::new(FileTemplateRenderer::new(path.clone()))
		}
		None => Arc::new(BuiltinTemplateRenderer::new()),
	}
}

/// Build a runner around the given collaborators.
pub fn assemble_runner(
	config: &ServerConfig,
	repository: Arc<dyn ProgressRepository>,
	transport: Arc<dyn MailTransport>,
	notifier: Arc<dyn WebNotifier>,
) -> anyhow::Result<BatchRunner> {
	let timezone = parse_timezone(&config.schedule.timezone)?;
	let settings = DeliverySettings::from_config(&config.dispatch, &config.templates, timezone);
	let worker = DeliveryWorker::new(
		build_renderer(&config.templates),
		transport,
		notifier,
		settings,
	);

	Ok(BatchRunner::new(
		repository,
		Dispatcher::new(worker, config.dispatch.pool_size),
	))
}

/// Build a runner backed by SQLite and SMTP.
pub async fn build_runner(
	config: &ServerConfig,
	notifier: Arc<dyn WebNotifier>,
) -> anyhow::Result<BatchRunner> {
	let smtp = config.smtp.as_ref().context(
		"SMTP is not configured; set PACER_SERVER_SMTP_HOST and PACER_SERVER_SMTP_FROM_ADDRESS",
	)?;
	let transport = SmtpClient::new(smtp).context("failed to create SMTP client")?;
	// Unreachable relays are not fatal; each job retries its own sends.
	if let Err(e) = transport.check_health().await {
		tracing::warn!(host = %smtp.host, port = smtp.port, error = %e, "SMTP relay is not reachable at startup");
	}

	let pool = create_pool(&config.database.url)
		.await
		.context("failed to open database")?;
	run_migrations(&pool)
		.await
		.context("failed to run database migrations")?;

	let repository = SqliteProgressRepository::new(pool);

	assemble_runner(config, Arc::new(repository), Arc::new(transport), notifier)
}

/// A scheduler with the daily notification job registered.
pub fn build_scheduler(
	config: &ServerConfig,
	runner: Arc<BatchRunner>,
) -> Result<JobScheduler, JobError> {
	let schedule = DailySchedule::new(
		config.schedule.hour,
		config.schedule.minute,
		&config.schedule.timezone,
	)?;

	let mut scheduler = JobScheduler::new();
	scheduler.register_daily(Arc::new(DailyNotificationsJob::new(runner)), schedule)?;
	Ok(scheduler)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pacer_server_config::{SmtpConfig, TlsMode};

	#[test]
	fn parses_iana_timezones() {
		assert_eq!(parse_timezone("Asia/Tokyo").unwrap(), chrono_tz::Asia::Tokyo);
		assert!(parse_timezone("Nowhere/Special").is_err());
	}

	#[tokio::test]
	async fn unreachable_relay_does_not_block_startup() {
		let dir = tempfile::tempdir().unwrap();
		let mut config = ServerConfig::default();
		config.database.url = format!("sqlite:{}", dir.path().join("pacer.db").display());
		config.smtp = Some(SmtpConfig {
			host: "127.0.0.1".to_string(),
			port: 1,
			username: None,
			password: None,
			from_address: "noreply@example.com".to_string(),
			from_name: "Pacer".to_string(),
			tls_mode: TlsMode::None,
		});
		let notifier = Arc::new(pacer_server_notify::InAppNotifier::with_defaults());

		let runner = build_runner(&config, notifier).await;
		assert!(runner.is_ok(), "{:?}", runner.err());
	}

	#[tokio::test]
	async fn build_runner_requires_smtp() {
		let config = ServerConfig::default();
		let notifier = Arc::new(pacer_server_notify::InAppNotifier::with_defaults());
		let err = build_runner(&config, notifier).await.err().unwrap();
		assert!(err.to_string().contains("SMTP is not configured"));
	}
}
