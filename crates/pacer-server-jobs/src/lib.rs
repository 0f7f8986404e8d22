// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Daily job scheduler for Pacer server.
//!
//! Jobs fire once a day at a fixed wall-clock time. Each job owns a run gate,
//! so a trigger that arrives while the previous run is still going is
//! skipped rather than queued. Run health is tracked in memory.

pub mod clock;
pub mod context;
pub mod error;
pub mod health;
pub mod job;
pub mod schedule;
pub mod scheduler;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use context::JobContext;
pub use error::{JobError, Result};
pub use health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
pub use job::Job;
pub use schedule::DailySchedule;
pub use scheduler::JobScheduler;
pub use types::{JobOutput, JobStatus, TriggerOutcome, TriggerSource};
