// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the notification collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Fetching due notifications failed. Aborts the whole run.
#[derive(Debug, Error)]
pub enum RepositoryError {
	#[error("connection error: {0}")]
	Connection(String),

	#[error("query failed: {0}")]
	Query(String),

	#[error("invalid row: {0}")]
	Decode(String),
}

/// Rendering an email body failed. Never retried.
#[derive(Debug, Error)]
pub enum TemplateError {
	#[error("failed to read template {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("unknown placeholder {{{{{0}}}}}")]
	UnknownPlaceholder(String),

	#[error("unterminated placeholder at byte {0}")]
	Unterminated(usize),
}

/// Handing a message to the mail server failed. Retried within budget.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("invalid address {address}: {message}")]
	Address { address: String, message: String },

	#[error("failed to build message: {0}")]
	Message(String),

	#[error("send failed: {0}")]
	Send(String),
}

/// In-app delivery failed. Logged only.
#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("web notification rejected: {0}")]
	Rejected(String),

	#[error("web notification channel unavailable: {0}")]
	Unavailable(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_placeholder_display_shows_braces() {
		let err = TemplateError::UnknownPlaceholder("nickname".to_string());
		assert_eq!(err.to_string(), "unknown placeholder {{nickname}}");
	}

	#[test]
	fn transport_error_display() {
		let err = TransportError::Address {
			address: "not-an-email".to_string(),
			message: "missing @".to_string(),
		};
		assert_eq!(err.to_string(), "invalid address not-an-email: missing @");
	}
}
