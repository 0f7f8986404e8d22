// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SMTP mail transport for Pacer.
//!
//! [`SmtpClient`] sends multipart (plain text + HTML) progress emails through
//! an SMTP relay using [`lettre`]. It implements
//! [`MailTransport`](pacer_notify_core::MailTransport) so the delivery worker
//! can retry it without knowing about SMTP.
//!
//! # Example
//!
//! ```no_run
//! use pacer_server_config::{SmtpConfig, TlsMode};
//! use pacer_server_smtp::SmtpClient;
//!
//! # async fn example() -> Result<(), pacer_server_smtp::SmtpError> {
//! let config = SmtpConfig {
//!     host: "smtp.gmail.com".to_string(),
//!     port: 587,
//!     username: None,
//!     password: None,
//!     from_address: "noreply@example.com".to_string(),
//!     from_name: "Pacer".to_string(),
//!     tls_mode: TlsMode::StartTls,
//! };
//!
//! let client = SmtpClient::new(&config)?;
//! client.check_health().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use lettre::{
	message::{header::ContentType, Mailbox, MultiPart, SinglePart},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use pacer_notify_core::{MailTransport, RenderedEmail, TransportError};
use pacer_server_config::{SmtpConfig, TlsMode};

/// Errors that can occur during SMTP operations.
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
	#[error("connection failed: {0}")]
	Connection(String),

	#[error("send failed: {0}")]
	Send(String),

	#[error("failed to build message: {0}")]
	Message(String),

	#[error("invalid email address '{address}': {message}")]
	Address { address: String, message: String },
}

impl From<SmtpError> for TransportError {
	fn from(err: SmtpError) -> Self {
		match err {
			SmtpError::Address { address, message } => TransportError::Address { address, message },
			SmtpError::Message(message) => TransportError::Message(message),
			SmtpError::Connection(message) | SmtpError::Send(message) => {
				TransportError::Send(message)
			}
		}
	}
}

/// Async SMTP client.
///
/// Connections are opened lazily, once per send.
pub struct SmtpClient {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from_mailbox: Mailbox,
}

impl SmtpClient {
	#[tracing::instrument(
		name = "smtp_client_new",
		skip(config),
		fields(host = %config.host, port = config.port, tls_mode = ?config.tls_mode)
	)]
	pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
		let from_mailbox = parse_mailbox(&format!("{} <{}>", config.from_name, config.from_address))?;

		let builder = match config.tls_mode {
			TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?,
			TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
				.map_err(|e| SmtpError::Connection(format!("{e}")))?,
			TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
		};

		let mut builder = builder.port(config.port);

		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(
				username.clone(),
				password.expose().clone(),
			));
		}

		tracing::debug!(authenticated = config.has_auth(), "SMTP client initialized");

		Ok(Self {
			transport: builder.build(),
			from_mailbox,
		})
	}

	/// Open a connection to the relay and issue NOOP.
	#[tracing::instrument(name = "smtp_check_health", skip(self))]
	pub async fn check_health(&self) -> Result<(), SmtpError> {
		let reachable = self
			.transport
			.test_connection()
			.await
			.map_err(|e| SmtpError::Connection(format!("{e}")))?;

		if !reachable {
			return Err(SmtpError::Connection(
				"server did not accept NOOP".to_string(),
			));
		}

		tracing::debug!("SMTP server is healthy");
		Ok(())
	}

	fn build_message(
		&self,
		to: &str,
		subject: &str,
		body: &RenderedEmail,
	) -> Result<Message, SmtpError> {
		Message::builder()
			.from(self.from_mailbox.clone())
			.to(parse_mailbox(to)?)
			.subject(subject)
			.multipart(
				MultiPart::alternative()
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_PLAIN)
							.body(body.text.clone()),
					)
					.singlepart(
						SinglePart::builder()
							.header(ContentType::TEXT_HTML)
							.body(body.html.clone()),
					),
			)
			.map_err(|e| SmtpError::Message(format!("{e}")))
	}

	#[tracing::instrument(
		name = "smtp_send_email",
		skip(self, body),
		fields(to = %to, subject = %subject)
	)]
	pub async fn send_email(
		&self,
		to: &str,
		subject: &str,
		body: &RenderedEmail,
	) -> Result<(), SmtpError> {
		let message = self.build_message(to, subject, body)?;

		self
			.transport
			.send(message)
			.await
			.map_err(|e| SmtpError::Send(format!("{e}")))?;

		tracing::debug!("email accepted by relay");
		Ok(())
	}
}

#[async_trait]
impl MailTransport for SmtpClient {
	async fn send(
		&self,
		to: &str,
		subject: &str,
		body: &RenderedEmail,
	) -> Result<(), TransportError> {
		self.send_email(to, subject, body).await.map_err(Into::into)
	}
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SmtpError> {
	address.parse().map_err(|e| SmtpError::Address {
		address: address.to_string(),
		message: format!("{e}"),
	})
}

/// Whether `email` parses as a mailbox. Says nothing about deliverability.
pub fn is_valid_email(email: &str) -> bool {
	email.parse::<Mailbox>().is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use pacer_server_config::Secret;

	fn config(tls_mode: TlsMode) -> SmtpConfig {
		SmtpConfig {
			host: "localhost".to_string(),
			port: 1025,
			username: None,
			password: None,
			from_address: "noreply@example.com".to_string(),
			from_name: "Pacer".to_string(),
			tls_mode,
		}
	}

	fn body() -> RenderedEmail {
		RenderedEmail {
			html: "<p>You're on track!</p>".to_string(),
			text: "You're on track!".to_string(),
		}
	}

	mod email_validation {
		use super::*;

		#[test]
		fn accepts_plain_and_named_addresses() {
			assert!(is_valid_email("learner@example.com"));
			assert!(is_valid_email("Learner <learner@example.com>"));
			assert!(is_valid_email("learner+tag@mail.example.com"));
		}

		#[test]
		fn rejects_malformed_addresses() {
			assert!(!is_valid_email(""));
			assert!(!is_valid_email("learner"));
			assert!(!is_valid_email("learner@"));
			assert!(!is_valid_email("@example.com"));
		}
	}

	mod client {
		use super::*;

		#[test]
		fn builds_plaintext_client() {
			assert!(SmtpClient::new(&config(TlsMode::None)).is_ok());
		}

		#[test]
		fn builds_with_credentials() {
			let mut cfg = config(TlsMode::None);
			cfg.username = Some("mailer".to_string());
			cfg.password = Some(Secret::new("app-password".to_string()));
			assert!(SmtpClient::new(&cfg).is_ok());
		}

		#[test]
		fn rejects_invalid_from_address() {
			let mut cfg = config(TlsMode::None);
			cfg.from_address = "not an address".to_string();
			assert!(matches!(
				SmtpClient::new(&cfg),
				Err(SmtpError::Address { .. })
			));
		}

		#[test]
		fn message_is_multipart_alternative() {
			let client = SmtpClient::new(&config(TlsMode::None)).unwrap();
			let message = client
				.build_message("learner@example.com", "[2025-03-16] Update", &body())
				.unwrap();
			let raw = String::from_utf8_lossy(&message.formatted()).to_string();
			assert!(raw.contains("multipart/alternative"));
			assert!(raw.contains("learner@example.com"));
			assert!(raw.contains("noreply@example.com"));
		}

		#[tokio::test]
		async fn invalid_recipient_maps_to_address_error() {
			let client = SmtpClient::new(&config(TlsMode::None)).unwrap();
			let err = MailTransport::send(&client, "nobody", "subject", &body())
				.await
				.unwrap_err();
			assert!(matches!(err, TransportError::Address { .. }));
		}
	}

	mod error_mapping {
		use super::*;

		#[test]
		fn connection_and_send_become_send() {
			let err: TransportError = SmtpError::Connection("refused".to_string()).into();
			assert!(matches!(err, TransportError::Send(ref m) if m == "refused"));

			let err: TransportError = SmtpError::Send("550".to_string()).into();
			assert!(matches!(err, TransportError::Send(_)));
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn generated_addresses_are_valid(
				local in "[a-z][a-z0-9]{0,20}",
				domain in "[a-z][a-z0-9]{0,15}",
				tld in "(com|org|net|io)"
			) {
				let email = format!("{local}@{domain}.{tld}");
				prop_assert!(is_valid_email(&email), "expected valid: {}", email);
			}

			#[test]
			fn password_never_in_config_debug(password in "[a-z0-9]{12,32}") {
				let mut cfg = config(TlsMode::StartTls);
				cfg.username = Some("mailer".to_string());
				cfg.password = Some(Secret::new(password.clone()));
				let debug = format!("{cfg:?}");
				prop_assert!(!debug.contains(&password));
			}
		}
	}
}
