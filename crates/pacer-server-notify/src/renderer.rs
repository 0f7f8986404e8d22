// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email body renderers.
//!
//! Both renderers produce the same plain-text part. They differ only in the
//! HTML part: [`BuiltinTemplateRenderer`] uses a fixed layout, while
//! [`FileTemplateRenderer`] reads an HTML file with `{{placeholder}}` slots
//! on every render, so edits take effect on the next run without a restart.
//!
//! Supported placeholders:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{{user_name}}` | Recipient display name |
//! | `{{message}}` | Composed progress message |
//! | `{{progress}}` | Progress percentage, one decimal |
//! | `{{question_set_url}}` | Link to the question set |
//! | `{{status}}` | `not_started`, `in_progress` or `completed` |
//! | `{{date}}` | Run date, `YYYY-MM-DD` |
//!
//! Values are HTML-escaped. Whitespace inside the braces is ignored.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pacer_notify_core::{EmailContent, RenderedEmail, TemplateError, TemplateRenderer};
use tracing::instrument;

const ON_SCHEDULE_COLOR: &str = "#2e7d32";
const BEHIND_SCHEDULE_COLOR: &str = "#c62828";

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplateRenderer;

impl BuiltinTemplateRenderer {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl TemplateRenderer for BuiltinTemplateRenderer {
	async fn render(&self, content: &EmailContent) -> Result<RenderedEmail, TemplateError> {
		Ok(RenderedEmail {
			html: builtin_html(content),
			text: plain_text(content),
		})
	}
}

#[derive(Debug, Clone)]
pub struct FileTemplateRenderer {
	path: PathBuf,
}

impl FileTemplateRenderer {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl TemplateRenderer for FileTemplateRenderer {
	#[instrument(name = "render_file_template", skip(self, content), fields(path = %self.path.display()))]
	async fn render(&self, content: &EmailContent) -> Result<RenderedEmail, TemplateError> {
		let template = tokio::fs::read_to_string(&self.path)
			.await
			.map_err(|source| TemplateError::Read {
				path: self.path.clone(),
				source,
			})?;

		Ok(RenderedEmail {
			html: substitute(&template, content)?,
			text: plain_text(content),
		})
	}
}

fn builtin_html(content: &EmailContent) -> String {
	let color = if content.on_schedule {
		ON_SCHEDULE_COLOR
	} else {
		BEHIND_SCHEDULE_COLOR
	};

	format!(
		r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Learning progress update</title>
</head>
<body style="font-family: sans-serif; color: #222222;">
<p>Hi {user_name},</p>
<p style="color: {color}; font-weight: bold;">{message}</p>
<p>Current progress: {progress:.1}%</p>
<p><a href="{url}">Continue your question set</a></p>
</body>
</html>
"#,
		user_name = html_escape(&content.user_name),
		message = html_escape(&content.message),
		progress = content.progress,
		url = html_escape(&content.question_set_url),
	)
}

fn plain_text(content: &EmailContent) -> String {
	format!(
		"Hi {},\n\n{}\n\nCurrent progress: {:.1}%\nContinue your question set: {}\n",
		content.user_name, content.message, content.progress, content.question_set_url,
	)
}

fn placeholder_value(name: &str, content: &EmailContent) -> Option<String> {
	match name {
		"user_name" => Some(content.user_name.clone()),
		"message" => Some(content.message.clone()),
		"progress" => Some(format!("{:.1}", content.progress)),
		"question_set_url" => Some(content.question_set_url.clone()),
		"status" => Some(content.status.as_str().to_string()),
		"date" => Some(content.sent_on.format("%Y-%m-%d").to_string()),
		_ => None,
	}
}

/// Replace every `{{name}}` in `template`.
fn substitute(template: &str, content: &EmailContent) -> Result<String, TemplateError> {
	let mut output = String::with_capacity(template.len());
	let mut rest = template;
	let mut offset = 0;

	while let Some(start) = rest.find("{{") {
		output.push_str(&rest[..start]);

		let inner = &rest[start + 2..];
		let end = inner
			.find("}}")
			.ok_or(TemplateError::Unterminated(offset + start))?;
		let name = inner[..end].trim();
		let value = placeholder_value(name, content)
			.ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
		output.push_str(&html_escape(&value));

		let consumed = start + 2 + end + 2;
		offset += consumed;
		rest = &rest[consumed..];
	}

	output.push_str(rest);
	Ok(output)
}

fn html_escape(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}
