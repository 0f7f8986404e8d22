// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{
	DatabaseConfigLayer, DispatchConfigLayer, LoggingConfigLayer, ScheduleConfigLayer,
	SmtpConfigLayer, TemplatesConfigLayer,
};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub schedule: Option<ScheduleConfigLayer>,
	#[serde(default)]
	pub dispatch: Option<DispatchConfigLayer>,
	#[serde(default)]
	pub smtp: Option<SmtpConfigLayer>,
	#[serde(default)]
	pub templates: Option<TemplatesConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(
			&mut self.schedule,
			other.schedule,
			ScheduleConfigLayer::merge,
		);
		merge_option(
			&mut self.dispatch,
			other.dispatch,
			DispatchConfigLayer::merge,
		);
		merge_option(&mut self.smtp, other.smtp, SmtpConfigLayer::merge);
		merge_option(
			&mut self.templates,
			other.templates,
			TemplatesConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer::default());
		assert!(base.schedule.is_none());
		assert!(base.dispatch.is_none());
	}

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			dispatch: Some(DispatchConfigLayer {
				pool_size: Some(3),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.dispatch.unwrap().pool_size, Some(3));
	}

	#[test]
	fn test_merge_field_level_override() {
		let mut base = ServerConfigLayer {
			schedule: Some(ScheduleConfigLayer {
				hour: Some(9),
				minute: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			schedule: Some(ScheduleConfigLayer {
				minute: Some(45),
				..Default::default()
			}),
			..Default::default()
		});
		let schedule = base.schedule.unwrap();
		assert_eq!(schedule.hour, Some(9));
		assert_eq!(schedule.minute, Some(45));
	}

	#[test]
	fn test_parses_full_toml_document() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[database]
			url = "sqlite:/var/lib/pacer/pacer.db"

			[schedule]
			hour = 6
			timezone = "Asia/Tokyo"

			[dispatch]
			pool_size = 10

			[smtp]
			host = "smtp.gmail.com"
			from_address = "noreply@example.com"
			tls_mode = "starttls"
			"#,
		)
		.unwrap();

		assert_eq!(layer.schedule.as_ref().unwrap().hour, Some(6));
		assert_eq!(layer.dispatch.as_ref().unwrap().pool_size, Some(10));
		assert_eq!(
			layer.smtp.as_ref().unwrap().tls_mode,
			Some(crate::sections::TlsMode::StartTls)
		);
		assert!(layer.logging.is_none());
	}
}
