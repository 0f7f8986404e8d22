// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::clock::{Clock, SystemClock};
use crate::context::JobContext;
use crate::error::{JobError, Result};
use crate::health::{determine_health_state, worst, HealthState, JobHealthStatus, JobsHealthStatus, RunHistory};
use crate::job::Job;
use crate::schedule::DailySchedule;
use crate::types::{JobStatus, TriggerOutcome, TriggerSource};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// At most one run of a job at a time.
#[derive(Default)]
struct RunGate {
	running: AtomicBool,
	idle: Notify,
}

impl RunGate {
	fn try_acquire(self: &Arc<Self>) -> Option<RunPermit> {
		self
			.running
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| RunPermit {
				gate: Arc::clone(self),
			})
	}

	fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}

	async fn wait_idle(&self) {
		loop {
			// Registered before the check so a release in between is not missed.
			let notified = self.idle.notified();
			if !self.is_running() {
				return;
			}
			notified.await;
		}
	}
}

struct RunPermit {
	gate: Arc<RunGate>,
}

impl Drop for RunPermit {
	fn drop(&mut self) {
		self.gate.running.store(false, Ordering::Release);
		self.gate.idle.notify_waiters();
	}
}

#[derive(Clone)]
struct JobSlot {
	job: Arc<dyn Job>,
	gate: Arc<RunGate>,
	history: Arc<Mutex<RunHistory>>,
}

impl JobSlot {
	fn new(job: Arc<dyn Job>) -> Self {
		Self {
			job,
			gate: Arc::new(RunGate::default()),
			history: Arc::new(Mutex::new(RunHistory::default())),
		}
	}

	/// Take the gate and spawn the run.
	///
	/// The permit moves into the spawned task, so the gate stays closed until
	/// the run finishes whether or not anyone awaits the handle.
	fn begin(&self, triggered_by: TriggerSource) -> Option<StartedRun> {
		let permit = self.gate.try_acquire()?;
		let ctx = JobContext::new(triggered_by);
		let run_id = ctx.run_id.clone();
		let slot = self.clone();
		let handle = tokio::spawn(async move {
			let outcome = slot.execute(ctx).await;
			drop(permit);
			outcome
		});
		Some(StartedRun { run_id, handle })
	}

	async fn skip(&self, triggered_by: TriggerSource) -> TriggerOutcome {
		self.history.lock().await.record_skip();
		warn!(
			job_id = %self.job.id(),
			triggered_by = %triggered_by,
			"Previous run still in progress, skipping trigger"
		);
		TriggerOutcome::Skipped
	}

	async fn trigger(&self, triggered_by: TriggerSource) -> TriggerOutcome {
		let Some(run) = self.begin(triggered_by) else {
			return self.skip(triggered_by).await;
		};

		match run.handle.await {
			Ok(outcome) => outcome,
			Err(join_error) => TriggerOutcome::Failed {
				run_id: run.run_id,
				error: JobError::failed(join_error.to_string()).to_string(),
			},
		}
	}

	async fn execute(&self, ctx: JobContext) -> TriggerOutcome {
		let job_id = self.job.id().to_string();
		let run_id = ctx.run_id.clone();
		let triggered_by = ctx.triggered_by;
		self
			.history
			.lock()
			.await
			.record_start(&run_id, triggered_by, ctx.started_at);
		info!(job_id = %job_id, run_id = %run_id, triggered_by = %triggered_by, "Job run started");

		let started = Instant::now();
		let result = AssertUnwindSafe(self.job.run(&ctx)).catch_unwind().await;
		let duration_ms = started.elapsed().as_millis() as i64;

		match result {
			Ok(Ok(output)) => {
				self
					.history
					.lock()
					.await
					.record_finish(JobStatus::Succeeded, duration_ms, None);
				info!(
					job_id = %job_id,
					run_id = %run_id,
					duration_ms,
					message = %output.message,
					metadata = ?output.metadata,
					"Job completed successfully"
				);
				TriggerOutcome::Succeeded { run_id }
			}
			Ok(Err(e)) => {
				let message = e.to_string();
				self
					.history
					.lock()
					.await
					.record_finish(JobStatus::Failed, duration_ms, Some(message.clone()));
				warn!(job_id = %job_id, run_id = %run_id, duration_ms, error = %message, "Job failed");
				TriggerOutcome::Failed {
					run_id,
					error: message,
				}
			}
			Err(payload) => {
				let message = JobError::Panicked(panic_message(payload)).to_string();
				self
					.history
					.lock()
					.await
					.record_finish(JobStatus::Failed, duration_ms, Some(message.clone()));
				error!(job_id = %job_id, run_id = %run_id, duration_ms, error = %message, "Job run panicked");
				TriggerOutcome::Failed {
					run_id,
					error: message,
				}
			}
		}
	}
}

struct StartedRun {
	run_id: String,
	handle: JoinHandle<TriggerOutcome>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic payload".to_string()
	}
}

struct RegisteredJob {
	slot: JobSlot,
	schedule: DailySchedule,
}

/// Fires registered jobs once a day and never lets two runs of the same job
/// overlap.
///
/// A trigger that arrives while a run is still in progress is dropped, not
/// queued. Failed and panicking runs are recorded in job health; the timer
/// stays armed either way.
pub struct JobScheduler {
	jobs: HashMap<String, RegisteredJob>,
	clock: Arc<dyn Clock>,
	shutdown_tx: broadcast::Sender<()>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

impl JobScheduler {
	pub fn new() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}

	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			jobs: HashMap::new(),
			clock,
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	pub fn register_daily(&mut self, job: Arc<dyn Job>, schedule: DailySchedule) -> Result<()> {
		let id = job.id().to_string();
		if self.jobs.contains_key(&id) {
			return Err(JobError::AlreadyRegistered(id));
		}

		info!(job_id = %id, name = %job.name(), schedule = %schedule, "Registered daily job");
		self.jobs.insert(
			id,
			RegisteredJob {
				slot: JobSlot::new(job),
				schedule,
			},
		);
		Ok(())
	}

	/// Spawn one timer per registered job. Call once.
	#[instrument(skip(self))]
	pub async fn start(&self) {
		let mut handles = self.handles.lock().await;

		for (job_id, registered) in &self.jobs {
			let slot = registered.slot.clone();
			let schedule = registered.schedule.clone();
			let clock = Arc::clone(&self.clock);
			let mut shutdown_rx = self.shutdown_tx.subscribe();
			let job_id = job_id.clone();

			let handle = tokio::spawn(async move {
				let mut last_fire: Option<DateTime<Utc>> = None;
				loop {
					let now = clock.now();
					// Never re-arm for a fire time already used, even if the
					// wall clock reads slightly behind it.
					let from = last_fire.map_or(now, |fired| fired.max(now));
					let Some(next) = schedule.next_after(from) else {
						error!(job_id = %job_id, "No next fire time, timer stopped");
						break;
					};
					let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
					debug!(job_id = %job_id, next_run = %next, "Timer armed");

					tokio::select! {
						_ = tokio::time::sleep(wait) => {
							last_fire = Some(next);
							// The gate is taken here, before shutdown can be
							// observed, so `shutdown` always waits for this run.
							if slot.begin(TriggerSource::Schedule).is_none() {
								slot.skip(TriggerSource::Schedule).await;
							}
						}
						_ = shutdown_rx.recv() => {
							info!(job_id = %job_id, "Shutting down daily job timer");
							break;
						}
					}
				}
			});

			handles.push(handle);
		}

		info!(job_count = handles.len(), "Job scheduler started");
	}

	/// Run a job now, through the same gate as scheduled runs, and wait for it.
	#[instrument(skip(self))]
	pub async fn trigger_job(&self, job_id: &str, triggered_by: TriggerSource) -> Result<TriggerOutcome> {
		let registered = self
			.jobs
			.get(job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		Ok(registered.slot.trigger(triggered_by).await)
	}

	/// Stop the timers, then wait for any in-flight run to finish.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());

		let mut handles = self.handles.lock().await;
		for handle in handles.drain(..) {
			if let Err(e) = handle.await {
				error!(error = %e, "Job timer task ended abnormally");
			}
		}

		for (job_id, registered) in &self.jobs {
			if registered.slot.gate.is_running() {
				info!(job_id = %job_id, "Waiting for in-flight run to finish");
			}
			registered.slot.gate.wait_idle().await;
		}

		info!("Job scheduler shut down");
	}

	pub fn job_ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.jobs.keys().cloned().collect();
		ids.sort();
		ids
	}

	pub fn is_running(&self, job_id: &str) -> bool {
		self
			.jobs
			.get(job_id)
			.is_some_and(|registered| registered.slot.gate.is_running())
	}

	pub fn next_run(&self, job_id: &str) -> Option<DateTime<Utc>> {
		self.jobs.get(job_id)?.schedule.next_after(self.clock.now())
	}

	#[instrument(skip(self))]
	pub async fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let registered = self.jobs.get(job_id)?;
		let history = registered.slot.history.lock().await;

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: registered.slot.job.name().to_string(),
			status: determine_health_state(history.last_run.as_ref(), history.consecutive_failures),
			schedule: Some(registered.schedule.to_string()),
			last_run: history.last_run.clone(),
			consecutive_failures: history.consecutive_failures,
			skipped_triggers: history.skipped_triggers,
		})
	}

	#[instrument(skip(self))]
	pub async fn health_status(&self) -> JobsHealthStatus {
		let mut jobs = Vec::new();
		let mut worst_state = HealthState::Healthy;

		for job_id in self.job_ids() {
			if let Some(status) = self.job_status(&job_id).await {
				worst_state = worst(worst_state, status.status);
				jobs.push(status);
			}
		}

		JobsHealthStatus {
			status: worst_state,
			jobs,
		}
	}
}
