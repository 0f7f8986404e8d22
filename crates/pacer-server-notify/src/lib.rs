// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Notification delivery pipeline for Pacer.
//!
//! A [`BatchRunner`] fetches due notifications and hands the batch to a
//! [`Dispatcher`], which fans it out over a fixed pool of tasks. Each task
//! runs a [`DeliveryWorker`]: compose, email with bounded retry, then one
//! in-app notification.
//!
//! ```text
//! BatchRunner ──fetch──> ProgressRepository
//!      │
//!      └──dispatch──> Dispatcher ──mpsc──> [worker 0..pool_size]
//!                                              │
//!                                              ├──> TemplateRenderer
//!                                              ├──> MailTransport   (retried)
//!                                              └──> WebNotifier     (once)
//! ```

pub mod dispatcher;
pub mod renderer;
pub mod runner;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod web;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use renderer::{BuiltinTemplateRenderer, FileTemplateRenderer};
pub use runner::{BatchRunner, RunError, RunReport};
pub use web::{InAppNotification, InAppNotifier, InAppNotifierConfig};
pub use worker::{DeliverySettings, DeliveryWorker, RetryPolicy};
