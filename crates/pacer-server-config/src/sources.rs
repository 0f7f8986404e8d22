// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::secret::load_secret_env;
use crate::sections::{
	DatabaseConfigLayer, DispatchConfigLayer, LoggingConfigLayer, ScheduleConfigLayer,
	SmtpConfigLayer, TemplatesConfigLayer, TlsMode,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/pacer/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PACER_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			database: Some(load_database_from_env()),
			schedule: Some(load_schedule_from_env()?),
			dispatch: Some(load_dispatch_from_env()?),
			smtp: Some(load_smtp_from_env()?),
			templates: Some(load_templates_from_env()),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("PACER_SERVER_DATABASE_URL"),
	}
}

fn load_schedule_from_env() -> Result<ScheduleConfigLayer, ConfigError> {
	Ok(ScheduleConfigLayer {
		hour: env_parse("PACER_SERVER_SCHEDULE_HOUR", "u32")?,
		minute: env_parse("PACER_SERVER_SCHEDULE_MINUTE", "u32")?,
		timezone: env_var("PACER_SERVER_SCHEDULE_TIMEZONE"),
	})
}

fn load_dispatch_from_env() -> Result<DispatchConfigLayer, ConfigError> {
	Ok(DispatchConfigLayer {
		pool_size: env_parse("PACER_SERVER_DISPATCH_POOL_SIZE", "usize")?,
		max_attempts: env_parse("PACER_SERVER_DISPATCH_MAX_ATTEMPTS", "u32")?,
		backoff_secs: env_parse("PACER_SERVER_DISPATCH_BACKOFF_SECS", "u64")?,
		question_set_base_url: env_var("PACER_SERVER_QUESTION_SET_BASE_URL"),
	})
}

fn load_smtp_from_env() -> Result<SmtpConfigLayer, ConfigError> {
	let tls_mode = env_var("PACER_SERVER_SMTP_TLS_MODE")
		.map(|v| TlsMode::from_str_value(&v))
		.transpose()?;

	Ok(SmtpConfigLayer {
		host: env_var("PACER_SERVER_SMTP_HOST"),
		port: env_parse("PACER_SERVER_SMTP_PORT", "u16")?,
		username: env_var("PACER_SERVER_SMTP_USERNAME"),
		password: load_secret_env("PACER_SERVER_SMTP_PASSWORD")?,
		from_address: env_var("PACER_SERVER_SMTP_FROM_ADDRESS"),
		from_name: env_var("PACER_SERVER_SMTP_FROM_NAME"),
		tls_mode,
	})
}

fn load_templates_from_env() -> TemplatesConfigLayer {
	TemplatesConfigLayer {
		email_template_path: env_var("PACER_SERVER_EMAIL_TEMPLATE_PATH").map(PathBuf::from),
		subject: env_var("PACER_SERVER_EMAIL_SUBJECT"),
	}
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("PACER_SERVER_LOG_LEVEL"),
	}
}
