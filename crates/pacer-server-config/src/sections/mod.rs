// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod database;
mod dispatch;
mod logging;
mod schedule;
mod smtp;
mod templates;

pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use dispatch::{DispatchConfig, DispatchConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use schedule::{ScheduleConfig, ScheduleConfigLayer};
pub use smtp::{SmtpConfig, SmtpConfigLayer, TlsMode};
pub use templates::{TemplatesConfig, TemplatesConfigLayer};
