// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed-size worker pool for one batch.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use futures::FutureExt;
use pacer_notify_core::{EmailOutcome, JobResult, NotificationRecord, WebOutcome};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, info_span, instrument, Instrument};

use crate::worker::DeliveryWorker;

type QueuedJob = (usize, NotificationRecord);

/// Fans a batch out over `pool_size` tasks and waits for all of them.
///
/// The whole batch is enqueued before any worker starts, and the sender is
/// dropped, so workers exit once the queue is drained. Jobs are taken in
/// batch order; completion order across workers is not deterministic.
///
/// A job whose delivery panics is reported as failed on both legs and the
/// worker moves on to the next job.
pub struct Dispatcher {
	worker: DeliveryWorker,
	pool_size: usize,
}

impl Dispatcher {
	/// A `pool_size` of zero is raised to one.
	pub fn new(worker: DeliveryWorker, pool_size: usize) -> Self {
		Self {
			worker,
			pool_size: pool_size.max(1),
		}
	}

	pub fn pool_size(&self) -> usize {
		self.pool_size
	}

	/// Run date for subjects and templates.
	pub fn today(&self) -> NaiveDate {
		self.worker.settings().today()
	}

	/// Deliver every record, dated today. Results are ordered by sequence.
	pub async fn dispatch(&self, jobs: Vec<NotificationRecord>) -> Vec<JobResult> {
		self.dispatch_on(jobs, self.today()).await
	}

	#[instrument(name = "dispatch", skip(self, jobs), fields(batch_size = jobs.len(), pool_size = self.pool_size))]
	pub async fn dispatch_on(&self, jobs: Vec<NotificationRecord>, sent_on: NaiveDate) -> Vec<JobResult> {
		let total = jobs.len();
		if total == 0 {
			return Vec::new();
		}

		let (tx, rx) = mpsc::channel::<QueuedJob>(total);
		for job in jobs.into_iter().enumerate() {
			// Capacity equals the batch size and the receiver is alive, so this never waits.
			if let Err(e) = tx.send(job).await {
				error!(sequence = e.0 .0, "Failed to enqueue notification");
			}
		}
		drop(tx);

		let queue = Arc::new(Mutex::new(rx));
		let handles: Vec<_> = (0..self.pool_size)
			.map(|worker_id| {
				let queue = Arc::clone(&queue);
				let worker = self.worker.clone();
				tokio::spawn(
					async move {
						let mut results = Vec::new();
						loop {
							let next = queue.lock().await.recv().await;
							let Some((sequence, record)) = next else {
								break;
							};
							let user_id = record.user_id.clone();
							let question_set_id = record.question_set_id;
							let delivered = AssertUnwindSafe(worker.deliver(sequence, record, sent_on))
								.catch_unwind()
								.await;
							let result = match delivered {
								Ok(result) => result,
								Err(payload) => {
									let message = format!("delivery panicked: {}", panic_message(payload));
									error!(sequence, user_id = %user_id, error = %message, "Delivery aborted");
									JobResult {
										sequence,
										user_id,
										question_set_id,
										email: EmailOutcome::Failed {
											attempts: 0,
											error: message.clone(),
										},
										web: WebOutcome::Failed { error: message },
									}
								}
							};
							results.push(result);
						}
						debug!(processed = results.len(), "Worker drained queue");
						results
					}
					.instrument(info_span!("delivery_worker", worker_id)),
				)
			})
			.collect();

		let mut results = Vec::with_capacity(total);
		for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
			match joined {
				Ok(mut worker_results) => results.append(&mut worker_results),
				Err(e) => error!(worker_id, error = %e, "Delivery worker died"),
			}
		}
		results.sort_by_key(|result| result.sequence);

		info!(total, completed = results.len(), "Batch dispatched");
		results
	}
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
