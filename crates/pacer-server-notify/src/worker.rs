// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of a single notification.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use pacer_notify_core::{
	compose, subject_line, DeliveryState, EmailContent, EmailOutcome, JobResult, MailTransport,
	NotificationRecord, TemplateRenderer, WebNotifier, WebOutcome,
};
use pacer_server_config::{DispatchConfig, TemplatesConfig};
use tracing::{debug, info, instrument, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_SECS: u64 = 2;

/// Fixed-interval retry for the email leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Attempts including the first. Zero is treated as one.
	pub max_attempts: u32,
	pub backoff: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_MAX_ATTEMPTS,
			backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
		}
	}
}

impl RetryPolicy {
	pub fn new(max_attempts: u32, backoff: Duration) -> Self {
		Self {
			max_attempts,
			backoff,
		}
	}

	fn attempts(&self) -> u32 {
		self.max_attempts.max(1)
	}
}

/// Settings shared by every delivery in a run.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
	pub retry: RetryPolicy,
	pub question_set_base_url: String,
	pub subject: String,
	/// Zone used to decide the run date shown in subjects and templates.
	pub timezone: Tz,
}

impl DeliverySettings {
	pub fn from_config(dispatch: &DispatchConfig, templates: &TemplatesConfig, timezone: Tz) -> Self {
		Self {
			retry: RetryPolicy::new(dispatch.max_attempts, dispatch.backoff()),
			question_set_base_url: dispatch.question_set_base_url.clone(),
			subject: templates.subject.clone(),
			timezone,
		}
	}

	/// Today's date in the configured zone.
	pub fn today(&self) -> NaiveDate {
		Utc::now().with_timezone(&self.timezone).date_naive()
	}
}

/// Drives one notification from `Pending` to `Done`.
///
/// Cheap to clone; every pool task holds its own copy.
#[derive(Clone)]
pub struct DeliveryWorker {
	renderer: Arc<dyn TemplateRenderer>,
	transport: Arc<dyn MailTransport>,
	notifier: Arc<dyn WebNotifier>,
	settings: Arc<DeliverySettings>,
}

impl DeliveryWorker {
	pub fn new(
		renderer: Arc<dyn TemplateRenderer>,
		transport: Arc<dyn MailTransport>,
		notifier: Arc<dyn WebNotifier>,
		settings: DeliverySettings,
	) -> Self {
		Self {
			renderer,
			transport,
			notifier,
			settings: Arc::new(settings),
		}
	}

	pub fn settings(&self) -> &DeliverySettings {
		&self.settings
	}

	/// Email with bounded retry, then exactly one web notification.
	///
	/// Never fails: every error is folded into the returned [`JobResult`].
	#[instrument(
		name = "deliver",
		skip(self, record),
		fields(user_id = %record.user_id, question_set_id = %record.question_set_id)
	)]
	pub async fn deliver(
		&self,
		sequence: usize,
		record: NotificationRecord,
		sent_on: NaiveDate,
	) -> JobResult {
		let mut state = DeliveryState::Pending;

		advance(&mut state, DeliveryState::Composing);
		let message = compose(&record);
		let content = EmailContent::new(
			&record,
			&message,
			&self.settings.question_set_base_url,
			sent_on,
		);
		let subject = subject_line(sent_on, &self.settings.subject);

		let email = self
			.send_email(&record.email, &subject, &content, &mut state)
			.await;
		advance(
			&mut state,
			if email.is_delivered() {
				DeliveryState::Emailed
			} else {
				DeliveryState::EmailFailed
			},
		);

		advance(&mut state, DeliveryState::WebNotifying);
		let web = match self.notifier.notify(&record.user_id, &message.text).await {
			Ok(()) => WebOutcome::Notified,
			Err(e) => {
				warn!(error = %e, "Web notification failed");
				WebOutcome::Failed {
					error: e.to_string(),
				}
			}
		};

		advance(&mut state, DeliveryState::Done);

		JobResult {
			sequence,
			user_id: record.user_id,
			question_set_id: record.question_set_id,
			email,
			web,
		}
	}

	async fn send_email(
		&self,
		to: &str,
		subject: &str,
		content: &EmailContent,
		state: &mut DeliveryState,
	) -> EmailOutcome {
		let max_attempts = self.settings.retry.attempts();
		let mut attempt = 0;

		loop {
			attempt += 1;
			advance(state, DeliveryState::Emailing { attempt });

			let body = match self.renderer.render(content).await {
				Ok(body) => body,
				Err(e) => {
					warn!(attempt, error = %e, "Email template failed to render, giving up on email");
					return EmailOutcome::TemplateFailed {
						error: e.to_string(),
					};
				}
			};

			match self.transport.send(to, subject, &body).await {
				Ok(()) => {
					info!(attempt, "Email sent");
					return EmailOutcome::Emailed { attempts: attempt };
				}
				Err(e) => {
					warn!(attempt, max_attempts, error = %e, "Email attempt failed");
					if attempt >= max_attempts {
						return EmailOutcome::Failed {
							attempts: attempt,
							error: e.to_string(),
						};
					}
					tokio::time::sleep(self.settings.retry.backoff).await;
				}
			}
		}
	}
}

fn advance(state: &mut DeliveryState, next: DeliveryState) {
	debug!(from = %state, to = %next, "Delivery state changed");
	*state = next;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::renderer::BuiltinTemplateRenderer;
	use crate::testing::{record, FailingRenderer, RecordingNotifier, ScriptedTransport};
	use pacer_notify_core::{ON_SCHEDULE_MESSAGE, QuestionSetId};

	fn settings(max_attempts: u32) -> DeliverySettings {
		DeliverySettings {
			retry: RetryPolicy::new(max_attempts, Duration::ZERO),
			question_set_base_url: "http://localhost:3000/question/set".to_string(),
			subject: "Learning progress update".to_string(),
			timezone: chrono_tz::UTC,
		}
	}

	fn run_date() -> NaiveDate {
		NaiveDate::from_ymd_opt(2025, 3, 16).unwrap()
	}

	fn worker(
		transport: Arc<ScriptedTransport>,
		notifier: Arc<RecordingNotifier>,
		max_attempts: u32,
	) -> DeliveryWorker {
		DeliveryWorker::new(
			Arc::new(BuiltinTemplateRenderer::new()),
			transport,
			notifier,
			settings(max_attempts),
		)
	}

	mod retry {
		use super::*;

		#[tokio::test]
		async fn first_attempt_success_stops_immediately() {
			let transport = Arc::new(ScriptedTransport::succeeding());
			let notifier = Arc::new(RecordingNotifier::new());
			let result = worker(transport.clone(), notifier.clone(), 3)
				.deliver(0, record("alice", 60.0, 55.0), run_date())
				.await;

			assert_eq!(result.email, EmailOutcome::Emailed { attempts: 1 });
			assert_eq!(transport.call_count(), 1);
		}

		#[tokio::test]
		async fn succeeds_on_third_attempt() {
			let transport = Arc::new(ScriptedTransport::failing_first(2));
			let notifier = Arc::new(RecordingNotifier::new());
			let result = worker(transport.clone(), notifier.clone(), 3)
				.deliver(0, record("alice", 40.0, 55.0), run_date())
				.await;

			assert_eq!(result.email, EmailOutcome::Emailed { attempts: 3 });
			assert_eq!(transport.call_count(), 3);
			assert_eq!(notifier.call_count(), 1);
		}

		#[tokio::test]
		async fn exhausts_budget_then_still_notifies_web() {
			let transport = Arc::new(ScriptedTransport::always_failing());
			let notifier = Arc::new(RecordingNotifier::new());
			let result = worker(transport.clone(), notifier.clone(), 3)
				.deliver(4, record("bob", 40.0, 55.0), run_date())
				.await;

			match &result.email {
				EmailOutcome::Failed { attempts, error } => {
					assert_eq!(*attempts, 3);
					assert!(error.contains("relay unavailable"));
				}
				other => panic!("expected failure, got {other:?}"),
			}
			assert_eq!(transport.call_count(), 3);
			assert_eq!(result.web, WebOutcome::Notified);
			assert_eq!(result.sequence, 4);
		}

		#[tokio::test]
		async fn zero_attempts_still_tries_once() {
			let transport = Arc::new(ScriptedTransport::always_failing());
			let notifier = Arc::new(RecordingNotifier::new());
			let result = worker(transport.clone(), notifier, 0)
				.deliver(0, record("bob", 40.0, 55.0), run_date())
				.await;

			assert!(matches!(result.email, EmailOutcome::Failed { attempts: 1, .. }));
			assert_eq!(transport.call_count(), 1);
		}

		#[tokio::test]
		async fn backoff_is_applied_between_attempts_only() {
			let transport = Arc::new(ScriptedTransport::always_failing());
			let notifier = Arc::new(RecordingNotifier::new());
			let mut settings = settings(3);
			settings.retry.backoff = Duration::from_millis(30);
			let worker = DeliveryWorker::new(
				Arc::new(BuiltinTemplateRenderer::new()),
				transport.clone(),
				notifier,
				settings,
			);

			let started = std::time::Instant::now();
			worker
				.deliver(0, record("bob", 40.0, 55.0), run_date())
				.await;
			let elapsed = started.elapsed();

			// Two sleeps for three attempts.
			assert!(elapsed >= Duration::from_millis(60), "elapsed {elapsed:?}");
			assert!(elapsed < Duration::from_millis(1000), "elapsed {elapsed:?}");
		}
	}

	mod template {
		use super::*;

		#[tokio::test]
		async fn render_failure_is_terminal_for_email() {
			let transport = Arc::new(ScriptedTransport::succeeding());
			let notifier = Arc::new(RecordingNotifier::new());
			let renderer = Arc::new(FailingRenderer::new());
			let worker = DeliveryWorker::new(renderer.clone(), transport.clone(), notifier.clone(), settings(3));

			let result = worker
				.deliver(0, record("carol", 40.0, 55.0), run_date())
				.await;

			assert!(matches!(result.email, EmailOutcome::TemplateFailed { .. }));
			assert_eq!(renderer.call_count(), 1);
			assert_eq!(transport.call_count(), 0);
			assert_eq!(notifier.call_count(), 1);
		}
	}

	mod message {
		use super::*;

		#[tokio::test]
		async fn subject_and_recipient_are_used() {
			let transport = Arc::new(ScriptedTransport::succeeding());
			let notifier = Arc::new(RecordingNotifier::new());
			worker(transport.clone(), notifier, 3)
				.deliver(0, record("dave", 60.0, 55.0), run_date())
				.await;

			let sent = transport.sent();
			assert_eq!(sent.len(), 1);
			assert_eq!(sent[0].to, "dave@example.com");
			assert_eq!(sent[0].subject, "[2025-03-16] Learning progress update");
			assert!(sent[0].html.contains("http://localhost:3000/question/set/7"));
		}

		#[tokio::test]
		async fn web_notification_carries_composed_text() {
			let transport = Arc::new(ScriptedTransport::succeeding());
			let notifier = Arc::new(RecordingNotifier::new());
			worker(transport.clone(), notifier.clone(), 3)
				.deliver(0, record("erin", 60.0, 55.0), run_date())
				.await;
			worker(transport, notifier.clone(), 3)
				.deliver(1, record("frank", 40.0, 55.0), run_date())
				.await;

			let calls = notifier.calls();
			assert_eq!(calls[0].0.as_str(), "erin");
			assert_eq!(calls[0].1, ON_SCHEDULE_MESSAGE);
			assert!(calls[1].1.contains("15.0"));
		}

		#[tokio::test]
		async fn web_failure_does_not_change_email_outcome() {
			let transport = Arc::new(ScriptedTransport::succeeding());
			let notifier = Arc::new(RecordingNotifier::failing());
			let result = worker(transport, notifier.clone(), 3)
				.deliver(2, record("gina", 60.0, 55.0), run_date())
				.await;

			assert_eq!(result.email, EmailOutcome::Emailed { attempts: 1 });
			assert!(matches!(result.web, WebOutcome::Failed { .. }));
			assert_eq!(result.question_set_id, QuestionSetId(7));
			assert_eq!(notifier.call_count(), 1);
		}
	}

	#[test]
	fn settings_follow_config() {
		let dispatch = DispatchConfig {
			pool_size: 5,
			max_attempts: 4,
			backoff_secs: 7,
			question_set_base_url: "https://pacer.example/sets".to_string(),
		};
		let templates = TemplatesConfig {
			email_template_path: None,
			subject: "Weekly nudge".to_string(),
		};
		let settings = DeliverySettings::from_config(&dispatch, &templates, chrono_tz::Asia::Tokyo);
		assert_eq!(settings.retry, RetryPolicy::new(4, Duration::from_secs(7)));
		assert_eq!(settings.subject, "Weekly nudge");
		assert_eq!(settings.question_set_base_url, "https://pacer.example/sets");
	}

	#[test]
	fn default_policy_is_three_attempts_two_seconds() {
		assert_eq!(RetryPolicy::default(), RetryPolicy::new(3, Duration::from_secs(2)));
	}
}
