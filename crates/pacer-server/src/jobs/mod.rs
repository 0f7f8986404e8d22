// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod daily_notifications;

pub use daily_notifications::{DailyNotificationsJob, DAILY_NOTIFICATIONS_JOB_ID};
