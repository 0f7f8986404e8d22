// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-app notification hub.
//!
//! Each user gets a broadcast channel for live subscribers and a bounded
//! feed of recent notifications for clients that poll. Publishing to a user
//! nobody is listening to still lands in the feed.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pacer_notify_core::{NotifyError, UserId, WebNotifier};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_RECENT_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct InAppNotifierConfig {
	/// Capacity of each user's broadcast channel.
	pub channel_capacity: usize,
	/// Notifications kept per user for polling clients.
	pub recent_capacity: usize,
}

impl Default for InAppNotifierConfig {
	fn default() -> Self {
		Self {
			channel_capacity: DEFAULT_CHANNEL_CAPACITY,
			recent_capacity: DEFAULT_RECENT_CAPACITY,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InAppNotification {
	pub id: u64,
	pub user_id: UserId,
	pub message: String,
	pub created_at: DateTime<Utc>,
}

struct UserChannel {
	sender: broadcast::Sender<InAppNotification>,
	recent: VecDeque<InAppNotification>,
}

pub struct InAppNotifier {
	config: InAppNotifierConfig,
	channels: RwLock<HashMap<UserId, UserChannel>>,
	next_id: AtomicU64,
}

impl Default for InAppNotifier {
	fn default() -> Self {
		Self::with_defaults()
	}
}

impl InAppNotifier {
	pub fn new(config: InAppNotifierConfig) -> Self {
		Self {
			config: InAppNotifierConfig {
				channel_capacity: config.channel_capacity.max(1),
				recent_capacity: config.recent_capacity,
			},
			channels: RwLock::new(HashMap::new()),
			next_id: AtomicU64::new(1),
		}
	}

	pub fn with_defaults() -> Self {
		Self::new(InAppNotifierConfig::default())
	}

	fn new_channel(&self) -> UserChannel {
		let (sender, _receiver) = broadcast::channel(self.config.channel_capacity);
		UserChannel {
			sender,
			recent: VecDeque::new(),
		}
	}

	/// Live notifications for `user_id` from now on.
	pub async fn subscribe(&self, user_id: &UserId) -> broadcast::Receiver<InAppNotification> {
		{
			let channels = self.channels.read().await;
			if let Some(channel) = channels.get(user_id) {
				return channel.sender.subscribe();
			}
		}

		let mut channels = self.channels.write().await;
		let channel = channels
			.entry(user_id.clone())
			.or_insert_with(|| self.new_channel());
		debug!(user_id = %user_id, "Subscribed to in-app notifications");
		channel.sender.subscribe()
	}

	/// Recent notifications for `user_id`, oldest first.
	pub async fn recent(&self, user_id: &UserId) -> Vec<InAppNotification> {
		self.channels
			.read()
			.await
			.get(user_id)
			.map(|channel| channel.recent.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Store and broadcast a notification. Returns the number of live receivers.
	pub async fn publish(&self, user_id: &UserId, message: &str) -> usize {
		let notification = InAppNotification {
			id: self.next_id.fetch_add(1, Ordering::Relaxed),
			user_id: user_id.clone(),
			message: message.to_string(),
			created_at: Utc::now(),
		};

		let mut channels = self.channels.write().await;
		let channel = channels
			.entry(user_id.clone())
			.or_insert_with(|| self.new_channel());

		if self.config.recent_capacity > 0 {
			if channel.recent.len() == self.config.recent_capacity {
				channel.recent.pop_front();
			}
			channel.recent.push_back(notification.clone());
		}

		// Err only means there are no live receivers right now.
		let delivered = channel.sender.send(notification).unwrap_or(0);
		debug!(user_id = %user_id, receivers = delivered, "Published in-app notification");
		delivered
	}

	pub async fn user_count(&self) -> usize {
		self.channels.read().await.len()
	}
}

#[async_trait]
impl WebNotifier for InAppNotifier {
	async fn notify(&self, user_id: &UserId, message: &str) -> Result<(), NotifyError> {
		if message.trim().is_empty() {
			return Err(NotifyError::Rejected("empty message".to_string()));
		}
		let receivers = self.publish(user_id, message).await;
		info!(user_id = %user_id, receivers, "Sent in-app notification");
		Ok(())
	}
}
