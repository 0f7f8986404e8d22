// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Daily trigger time for the notification run.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_HOUR: u32 = 14;
const DEFAULT_MINUTE: u32 = 29;
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfigLayer {
	pub hour: Option<u32>,
	pub minute: Option<u32>,
	pub timezone: Option<String>,
}

impl ScheduleConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.hour.is_some() {
			self.hour = other.hour;
		}
		if other.minute.is_some() {
			self.minute = other.minute;
		}
		if other.timezone.is_some() {
			self.timezone = other.timezone;
		}
	}

	pub fn finalize(self) -> ScheduleConfig {
		ScheduleConfig {
			hour: self.hour.unwrap_or(DEFAULT_HOUR),
			minute: self.minute.unwrap_or(DEFAULT_MINUTE),
			timezone: self
				.timezone
				.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
		}
	}
}

/// Time of day (in `timezone`) at which the daily run fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
	pub hour: u32,
	pub minute: u32,
	/// IANA timezone name, e.g. `Asia/Tokyo`.
	pub timezone: String,
}

impl ScheduleConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.hour > 23 {
			return Err(ConfigError::InvalidValue {
				key: "schedule.hour".to_string(),
				message: format!("{} is outside 0..=23", self.hour),
			});
		}
		if self.minute > 59 {
			return Err(ConfigError::InvalidValue {
				key: "schedule.minute".to_string(),
				message: format!("{} is outside 0..=59", self.minute),
			});
		}
		if self.timezone.trim().is_empty() {
			return Err(ConfigError::Validation(
				"schedule.timezone cannot be empty".to_string(),
			));
		}
		Ok(())
	}
}

impl Default for ScheduleConfig {
	fn default() -> Self {
		ScheduleConfigLayer::default().finalize()
	}
}
