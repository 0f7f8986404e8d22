// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Email template settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_subject() -> String {
	"Learning progress update".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemplatesConfigLayer {
	pub email_template_path: Option<PathBuf>,
	pub subject: Option<String>,
}

impl TemplatesConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.email_template_path.is_some() {
			self.email_template_path = other.email_template_path;
		}
		if other.subject.is_some() {
			self.subject = other.subject;
		}
	}

	pub fn finalize(self) -> TemplatesConfig {
		TemplatesConfig {
			email_template_path: self.email_template_path,
			subject: self.subject.unwrap_or_else(default_subject),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplatesConfig {
	/// HTML template read on every render. `None` uses the built-in layout.
	pub email_template_path: Option<PathBuf>,
	/// Subject text; the run date is prefixed as `[YYYY-MM-DD]`.
	pub subject: String,
}

impl Default for TemplatesConfig {
	fn default() -> Self {
		TemplatesConfigLayer::default().finalize()
	}
}
