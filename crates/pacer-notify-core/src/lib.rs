// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for learning progress notifications.
//!
//! A run fetches [`NotificationRecord`]s, composes a message for each with
//! [`compose`], and delivers it through the [`MailTransport`] and
//! [`WebNotifier`] collaborators. Each delivery produces a [`JobResult`];
//! a run is summarised as a [`Summary`].

pub mod composer;
pub mod email;
pub mod error;
pub mod outcome;
pub mod record;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod traits;

pub use composer::{compose, ComposedMessage, ON_SCHEDULE_MESSAGE};
pub use email::{subject_line, EmailContent, RenderedEmail};
pub use error::{NotifyError, RepositoryError, TemplateError, TransportError};
pub use outcome::{DeliveryState, EmailOutcome, JobResult, Summary, WebOutcome};
pub use record::{AssignmentStatus, NotificationRecord, QuestionSetId, UserId};
pub use traits::{MailTransport, ProgressRepository, TemplateRenderer, WebNotifier};
