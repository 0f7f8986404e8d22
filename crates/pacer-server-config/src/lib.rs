// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Pacer server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`PACER_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use pacer_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("daily run at {:02}:{:02}", config.schedule.hour, config.schedule.minute);
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use secret::{Secret, SecretString};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub schedule: ScheduleConfig,
	pub dispatch: DispatchConfig,
	pub smtp: Option<SmtpConfig>,
	pub templates: TemplatesConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PACER_SERVER_*`)
/// 2. Config file (`/etc/pacer/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let schedule = layer.schedule.unwrap_or_default().finalize();
	let dispatch = layer.dispatch.unwrap_or_default().finalize();
	let templates = layer.templates.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let smtp = layer.smtp.unwrap_or_default().build()?;

	schedule.validate()?;
	dispatch.validate()?;

	info!(
		database = %database.url,
		schedule_hour = schedule.hour,
		schedule_minute = schedule.minute,
		timezone = %schedule.timezone,
		pool_size = dispatch.pool_size,
		max_attempts = dispatch.max_attempts,
		backoff_secs = dispatch.backoff_secs,
		smtp_configured = smtp.is_some(),
		custom_template = templates.email_template_path.is_some(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		database,
		schedule,
		dispatch,
		smtp,
		templates,
		logging,
	})
}
