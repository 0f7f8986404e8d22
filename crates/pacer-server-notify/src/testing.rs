// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborators for exercising the pipeline without SQLite or SMTP.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use pacer_notify_core::{
	EmailContent, MailTransport, NotificationRecord, NotifyError, ProgressRepository,
	RenderedEmail, RepositoryError, TemplateError, TemplateRenderer, TransportError, UserId,
	WebNotifier,
};

pub use pacer_notify_core::testing::record;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns a fixed batch, or fails every fetch.
pub struct StaticRepository {
	records: Vec<NotificationRecord>,
	fail: bool,
	calls: AtomicUsize,
	dates: Mutex<Vec<NaiveDate>>,
}

impl StaticRepository {
	pub fn new(records: Vec<NotificationRecord>) -> Self {
		Self {
			records,
			fail: false,
			calls: AtomicUsize::new(0),
			dates: Mutex::new(Vec::new()),
		}
	}

	pub fn failing() -> Self {
		Self {
			records: Vec::new(),
			fail: true,
			calls: AtomicUsize::new(0),
			dates: Mutex::new(Vec::new()),
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// The `today` passed to each fetch, in call order.
	pub fn fetched_dates(&self) -> Vec<NaiveDate> {
		lock(&self.dates).clone()
	}
}

#[async_trait]
impl ProgressRepository for StaticRepository {
	async fn fetch_due(&self, today: NaiveDate) -> Result<Vec<NotificationRecord>, RepositoryError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		lock(&self.dates).push(today);
		if self.fail {
			return Err(RepositoryError::Connection("database is locked".to_string()));
		}
		Ok(self.records.clone())
	}
}

#[derive(Debug, Clone)]
pub struct SentEmail {
	pub to: String,
	pub subject: String,
	pub html: String,
	pub text: String,
}

/// Fails a fixed number of sends, then accepts everything.
pub struct ScriptedTransport {
	failures_remaining: AtomicU32,
	calls: AtomicUsize,
	sent: Mutex<Vec<SentEmail>>,
}

impl ScriptedTransport {
	pub fn failing_first(failures: u32) -> Self {
		Self {
			failures_remaining: AtomicU32::new(failures),
			calls: AtomicUsize::new(0),
			sent: Mutex::new(Vec::new()),
		}
	}

	pub fn succeeding() -> Self {
		Self::failing_first(0)
	}

	pub fn always_failing() -> Self {
		Self::failing_first(u32::MAX)
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Emails the transport accepted.
	pub fn sent(&self) -> Vec<SentEmail> {
		lock(&self.sent).clone()
	}
}

#[async_trait]
impl MailTransport for ScriptedTransport {
	async fn send(&self, to: &str, subject: &str, body: &RenderedEmail) -> Result<(), TransportError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let failed = self
			.failures_remaining
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
				if remaining == 0 {
					None
				} else if remaining == u32::MAX {
					Some(remaining)
				} else {
					Some(remaining - 1)
				}
			})
			.is_ok();
		if failed {
			return Err(TransportError::Send("relay unavailable".to_string()));
		}

		lock(&self.sent).push(SentEmail {
			to: to.to_string(),
			subject: subject.to_string(),
			html: body.html.clone(),
			text: body.text.clone(),
		});
		Ok(())
	}
}

/// Records every call; optionally rejects them all.
pub struct RecordingNotifier {
	fail: bool,
	calls: Mutex<Vec<(UserId, String)>>,
}

impl RecordingNotifier {
	pub fn new() -> Self {
		Self {
			fail: false,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn failing() -> Self {
		Self {
			fail: true,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> Vec<(UserId, String)> {
		lock(&self.calls).clone()
	}

	pub fn call_count(&self) -> usize {
		lock(&self.calls).len()
	}
}

impl Default for RecordingNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl WebNotifier for RecordingNotifier {
	async fn notify(&self, user_id: &UserId, message: &str) -> Result<(), NotifyError> {
		lock(&self.calls).push((user_id.clone(), message.to_string()));
		if self.fail {
			return Err(NotifyError::Unavailable("notification hub offline".to_string()));
		}
		Ok(())
	}
}

/// Every render fails with an unknown placeholder.
pub struct FailingRenderer {
	calls: AtomicUsize,
}

impl FailingRenderer {
	pub fn new() -> Self {
		Self {
			calls: AtomicUsize::new(0),
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl Default for FailingRenderer {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl TemplateRenderer for FailingRenderer {
	async fn render(&self, _content: &EmailContent) -> Result<RenderedEmail, TemplateError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Err(TemplateError::UnknownPlaceholder("nickname".to_string()))
	}
}
