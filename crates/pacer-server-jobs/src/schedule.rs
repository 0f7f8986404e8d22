// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed daily fire time.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::fmt;
use std::str::FromStr;

use crate::error::{JobError, Result};

/// A wall-clock time of day in an IANA timezone, fixed for the life of the
/// process.
#[derive(Debug, Clone)]
pub struct DailySchedule {
	hour: u32,
	minute: u32,
	timezone: Tz,
	cron: Schedule,
}

impl DailySchedule {
	/// Build a schedule that fires at `hour:minute` every day in `timezone`.
	///
	/// # Errors
	///
	/// Returns [`JobError::InvalidSchedule`] for an hour above 23 or a minute
	/// above 59, and [`JobError::InvalidTimezone`] for an unknown zone name.
	pub fn new(hour: u32, minute: u32, timezone: &str) -> Result<Self> {
		if hour > 23 {
			return Err(JobError::InvalidSchedule(format!(
				"hour must be between 0 and 23, got {hour}"
			)));
		}
		if minute > 59 {
			return Err(JobError::InvalidSchedule(format!(
				"minute must be between 0 and 59, got {minute}"
			)));
		}

		let tz: Tz = timezone
			.parse()
			.map_err(|_| JobError::InvalidTimezone(timezone.to_string()))?;

		let cron = Schedule::from_str(&cron_expression(hour, minute))
			.map_err(|e| JobError::InvalidSchedule(e.to_string()))?;

		Ok(Self {
			hour,
			minute,
			timezone: tz,
			cron,
		})
	}

	pub fn hour(&self) -> u32 {
		self.hour
	}

	pub fn minute(&self) -> u32 {
		self.minute
	}

	pub fn timezone(&self) -> Tz {
		self.timezone
	}

	/// The first fire time strictly after `after`, in UTC.
	pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
		let local_after = after.with_timezone(&self.timezone);
		self
			.cron
			.after(&local_after)
			.next()
			.map(|next| next.with_timezone(&Utc))
	}
}

impl fmt::Display for DailySchedule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"daily at {:02}:{:02} {}",
			self.hour,
			self.minute,
			self.timezone.name()
		)
	}
}

/// Seven-field expression understood by the `cron` crate.
fn cron_expression(hour: u32, minute: u32) -> String {
	format!("0 {minute} {hour} * * * *")
}
