// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite storage for learner progress.
//!
//! [`SqliteProgressRepository`] answers the one question the notification
//! run asks: which assignments are still open and due, and how far along is
//! each learner compared to plan.

pub mod error;
pub mod pool;
pub mod progress;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::{DbError, Result};
pub use pool::create_pool;
pub use progress::{planned_progress, SqliteProgressRepository};
pub use schema::run_migrations;
