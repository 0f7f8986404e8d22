// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pacer notification service binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pacer_server::{build_runner, build_scheduler, DAILY_NOTIFICATIONS_JOB_ID};
use pacer_server_config::ServerConfig;
use pacer_server_jobs::DailySchedule;
use pacer_server_notify::InAppNotifier;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pacer - daily learning progress notifications.
#[derive(Parser, Debug)]
#[command(name = "pacer-server", about = "Daily learning progress notifications", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/pacer/server.toml)
	#[arg(long, short, env = "PACER_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run one notification batch now and print the report as JSON
	RunOnce,
	/// Load and validate configuration, then exit
	CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenvy::dotenv().ok();
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => pacer_server_config::load_config_with_file(path)?,
		None => pacer_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	match args.command {
		Some(Command::CheckConfig) => check_config(&config),
		Some(Command::RunOnce) => run_once(&config).await,
		None => serve(config).await,
	}
}

fn check_config(config: &ServerConfig) -> anyhow::Result<()> {
	let schedule = DailySchedule::new(
		config.schedule.hour,
		config.schedule.minute,
		&config.schedule.timezone,
	)?;
	config.smtp.as_ref().context("SMTP is not configured")?;
	println!("configuration ok: notifications run {schedule}");
	Ok(())
}

async fn run_once(config: &ServerConfig) -> anyhow::Result<()> {
	let runner = build_runner(config, Arc::new(InAppNotifier::with_defaults())).await?;
	let report = runner.run_once_detailed().await?;
	println!("{}", serde_json::to_string_pretty(&report)?);
	Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
	tracing::info!(
		database = %config.database.url,
		hour = config.schedule.hour,
		minute = config.schedule.minute,
		timezone = %config.schedule.timezone,
		"starting pacer-server"
	);

	let notifier = Arc::new(InAppNotifier::with_defaults());
	let runner = match build_runner(&config, notifier).await {
		Ok(runner) => Arc::new(runner),
		Err(e) => {
			tracing::error!(error = %e, "Failed to initialise notification pipeline");
			return Err(e);
		}
	};

	let scheduler = match build_scheduler(&config, runner) {
		Ok(scheduler) => scheduler,
		Err(e) => {
			tracing::error!(error = %e, "Failed to register daily notification job");
			return Err(e.into());
		}
	};

	scheduler.start().await;
	if let Some(next) = scheduler.next_run(DAILY_NOTIFICATIONS_JOB_ID) {
		tracing::info!(next_run = %next, "Next notification run scheduled");
	}

	tokio::signal::ctrl_c()
		.await
		.context("failed to listen for shutdown signal")?;

	tracing::info!("Received shutdown signal");
	scheduler.shutdown().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}
